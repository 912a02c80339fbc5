//! Freehand signature unlock.
//!
//! Strokes drawn on the unlock canvas accumulate a path length. Once a stroke
//! ends with the total above the threshold, a debounce timer is (re)armed; when
//! it elapses the detector runs two feedback delays (scanning, confirmed) and
//! then calls the unlock callback. Nothing is recognized: any long enough
//! scribble unlocks.

use std::f32::consts::TAU;

use glam::Vec2;
use log::{debug, info};

use super::particles::{Motion, Particle, ParticlePool, Rng, Tint};
use crate::api::collaborators::Canvas;
use crate::api::config::GestureConfig;
use crate::renderer::{CanvasLayer, DotInstance, LinkInstance, SceneBuffer};

/// Moves shorter than this draw ink but throw no sparkles.
const SPARKLE_MIN_STEP: f32 = 3.0;
/// Speed assumed for the sparkles thrown by a pointer-down.
const PRESS_SPEED: f32 = 2.0;
const SPARKLE_CAP: usize = 64;
const SPARKLE_GRAVITY: f32 = 0.03;
const INK_HUE: f32 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    Drawing,
    PendingVerification,
    Verifying,
    Unlocked,
}

/// Feedback milestones, drained by the stage each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Scanning,
    Confirmed,
    Unlocked,
}

/// Persistent ink on the unlock canvas, in canvas-local units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InkMark {
    Dot { at: Vec2, radius: f32 },
    Segment { from: Vec2, to: Vec2, width: f32 },
}

#[derive(Debug, Clone, Copy)]
struct Stroke {
    last: Vec2,
    last_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Verification {
    Waiting,
    Pending { deadline: f64 },
    Scanning { until: f64 },
    Confirmed { until: f64 },
    Done,
}

pub struct GestureUnlockDetector {
    canvas: Option<Canvas>,
    config: GestureConfig,
    stroke: Option<Stroke>,
    verification: Verification,
    path_length: f32,
    stroke_count: u32,
    ink: Vec<InkMark>,
    sparkles: ParticlePool,
    rng: Rng,
    events: Vec<GestureEvent>,
    on_unlock: Option<Box<dyn FnOnce()>>,
}

impl GestureUnlockDetector {
    /// Without a canvas the detector ignores all input and never unlocks.
    pub fn new(
        canvas: Option<Canvas>,
        config: GestureConfig,
        rng: Rng,
        on_unlock: impl FnOnce() + 'static,
    ) -> Self {
        if canvas.is_none() {
            debug!("gesture: no unlock canvas, detector disabled");
        }
        Self {
            canvas,
            config,
            stroke: None,
            verification: Verification::Waiting,
            path_length: 0.0,
            stroke_count: 0,
            ink: Vec::new(),
            sparkles: ParticlePool::new(SPARKLE_CAP),
            rng,
            events: Vec::new(),
            on_unlock: Some(Box::new(on_unlock)),
        }
    }

    pub fn state(&self) -> GestureState {
        match self.verification {
            Verification::Done => GestureState::Unlocked,
            Verification::Scanning { .. } | Verification::Confirmed { .. } => {
                GestureState::Verifying
            }
            _ if self.stroke.is_some() => GestureState::Drawing,
            Verification::Pending { .. } => GestureState::PendingVerification,
            Verification::Waiting => GestureState::Idle,
        }
    }

    /// Total path length drawn since the last clear.
    pub fn path_length(&self) -> f32 {
        self.path_length
    }

    pub fn stroke_count(&self) -> u32 {
        self.stroke_count
    }

    /// False once verification has started, and always false without a canvas.
    pub fn input_enabled(&self) -> bool {
        self.canvas.is_some()
            && matches!(
                self.verification,
                Verification::Waiting | Verification::Pending { .. }
            )
    }

    pub fn ink(&self) -> &[InkMark] {
        &self.ink
    }

    pub fn pointer_down(&mut self, pos: Vec2, now_ms: f64) {
        if !self.input_enabled() {
            return;
        }
        // The countdown restarts from the end of this stroke.
        if let Verification::Pending { .. } = self.verification {
            self.verification = Verification::Waiting;
        }
        self.stroke = Some(Stroke {
            last: pos,
            last_ms: now_ms,
        });
        self.stroke_count += 1;
        self.ink.push(InkMark::Dot {
            at: pos,
            radius: self.config.max_width / 2.0,
        });
        self.throw_sparkles(pos, PRESS_SPEED);
    }

    pub fn pointer_move(&mut self, pos: Vec2, now_ms: f64) {
        if !self.input_enabled() {
            return;
        }
        let Some(stroke) = self.stroke.as_mut() else { return };

        let dist = stroke.last.distance(pos);
        let elapsed = now_ms - stroke.last_ms;
        let dt = if elapsed > 0.0 { elapsed } else { 1.0 };
        let speed = dist / dt as f32;
        let from = stroke.last;
        stroke.last = pos;
        stroke.last_ms = now_ms;

        self.path_length += dist;
        self.ink.push(InkMark::Segment {
            from,
            to: pos,
            width: self.stroke_width(speed),
        });
        if dist > SPARKLE_MIN_STEP {
            self.throw_sparkles(pos, speed);
        }
    }

    /// End of a stroke: pointer up, cancel or leaving the canvas.
    pub fn pointer_up(&mut self, now_ms: f64) {
        if !self.input_enabled() || self.stroke.take().is_none() {
            return;
        }
        if self.path_length > self.config.threshold {
            let deadline = now_ms + self.config.debounce_ms;
            debug!(
                "gesture: {:.1} units over {} strokes, verifying at {:.0} ms",
                self.path_length, self.stroke_count, deadline
            );
            self.verification = Verification::Pending { deadline };
        } else {
            debug!(
                "gesture: {:.1} of {} units, waiting for more strokes",
                self.path_length, self.config.threshold
            );
        }
    }

    /// Wipe the canvas and start over. Ignored once verification has begun.
    pub fn clear(&mut self) {
        if !self.input_enabled() {
            return;
        }
        self.stroke = None;
        self.verification = Verification::Waiting;
        self.path_length = 0.0;
        self.stroke_count = 0;
        self.ink.clear();
        self.sparkles.clear();
    }

    /// Advance timers to `now_ms` and tick the sparkles once.
    pub fn step(&mut self, now_ms: f64) {
        if self.canvas.is_none() {
            return;
        }
        // A long frame may cross several deadlines at once.
        while self.advance_verification(now_ms) {}
        self.sparkles.tick(Motion {
            gravity: SPARKLE_GRAVITY,
            shrink: 0.0,
        });
    }

    fn advance_verification(&mut self, now_ms: f64) -> bool {
        match self.verification {
            Verification::Pending { deadline } if now_ms >= deadline => {
                info!("gesture: verifying signature");
                self.stroke = None;
                self.verification = Verification::Scanning {
                    until: deadline + self.config.scanning_ms,
                };
                self.events.push(GestureEvent::Scanning);
                true
            }
            Verification::Scanning { until } if now_ms >= until => {
                self.verification = Verification::Confirmed {
                    until: until + self.config.confirmed_ms,
                };
                self.events.push(GestureEvent::Confirmed);
                true
            }
            Verification::Confirmed { until } if now_ms >= until => {
                info!("gesture: unlocked");
                self.verification = Verification::Done;
                self.events.push(GestureEvent::Unlocked);
                if let Some(on_unlock) = self.on_unlock.take() {
                    on_unlock();
                }
                true
            }
            _ => false,
        }
    }

    pub fn drain_events(&mut self) -> Vec<GestureEvent> {
        std::mem::take(&mut self.events)
    }

    /// Faster strokes draw thinner lines.
    fn stroke_width(&self, speed: f32) -> f32 {
        let (min, max) = (self.config.min_width, self.config.max_width);
        max - (speed * 2.0).min(max - min)
    }

    fn throw_sparkles(&mut self, at: Vec2, speed: f32) {
        let count = ((speed * 0.5).ceil().max(0.0) as u32).min(self.config.max_sparkles);
        for _ in 0..count {
            let ticks = self.rng.range(30.0, 60.0);
            let reach = self.rng.range(10.0, 40.0);
            let vel = Vec2::from_angle(self.rng.range(0.0, TAU)) * (reach / ticks);
            let tint = Tint::new(self.rng.range(45.0, 50.0), 100.0, self.rng.range(60.0, 80.0));
            let radius = self.rng.range(0.5, 2.0);
            self.sparkles
                .push(Particle::new(at, vel, 1.0 / ticks, radius, tint));
        }
    }

    pub fn sparkle_count(&self) -> usize {
        self.sparkles.len()
    }

    pub fn render(&self, out: &mut SceneBuffer) {
        if self.canvas.is_none() {
            return;
        }
        let layer = CanvasLayer::Unlock as u8 as f32;
        for mark in &self.ink {
            match *mark {
                InkMark::Dot { at, radius } => out.push_dot(DotInstance {
                    x: at.x,
                    y: at.y,
                    radius,
                    hue: INK_HUE,
                    saturation: 60.0,
                    lightness: 76.0,
                    alpha: 1.0,
                    layer,
                }),
                InkMark::Segment { from, to, width } => out.push_link(LinkInstance {
                    x1: from.x,
                    y1: from.y,
                    x2: to.x,
                    y2: to.y,
                    width,
                    hue: INK_HUE,
                    alpha: 1.0,
                    layer,
                }),
            }
        }
        for p in self.sparkles.iter() {
            let mut dot = p.to_dot(CanvasLayer::Unlock);
            dot.alpha = p.life;
            out.push_dot(dot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn detector() -> (GestureUnlockDetector, Rc<Cell<u32>>) {
        let unlocks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&unlocks);
        let detector = GestureUnlockDetector::new(
            Some(Canvas::new(200.0, 200.0)),
            GestureConfig::default(),
            Rng::new(9),
            move || counter.set(counter.get() + 1),
        );
        (detector, unlocks)
    }

    /// Horizontal stroke of `segments` × 5 units starting at `t`, 16 ms per move.
    /// Returns the time of the pointer-up.
    fn stroke(d: &mut GestureUnlockDetector, y: f32, segments: u32, t: f64) -> f64 {
        let mut now = t;
        d.pointer_down(Vec2::new(10.0, y), now);
        for i in 1..=segments {
            now += 16.0;
            d.pointer_move(Vec2::new(10.0 + 5.0 * i as f32, y), now);
        }
        now += 16.0;
        d.pointer_up(now);
        now
    }

    #[test]
    fn short_strokes_never_unlock() {
        let (mut d, unlocks) = detector();
        // Four strokes of 20 units: exactly 80, not above it.
        let mut t = 0.0;
        for row in 0..4 {
            t = stroke(&mut d, 20.0 + row as f32 * 20.0, 4, t) + 100.0;
        }
        assert_eq!(d.stroke_count(), 4);
        assert!((d.path_length() - 80.0).abs() < 1e-4);
        for frame in 0..600 {
            d.step(t + frame as f64 * 16.0);
        }
        assert_eq!(d.state(), GestureState::Idle);
        assert_eq!(unlocks.get(), 0);
    }

    #[test]
    fn qualifying_signature_unlocks_after_debounce_and_feedback() {
        let (mut d, unlocks) = detector();
        // 17 segments of 5 units = 85.
        let up = stroke(&mut d, 100.0, 17, 0.0);
        assert!((d.path_length() - 85.0).abs() < 1e-4);
        assert_eq!(d.state(), GestureState::PendingVerification);

        d.step(up + 499.0);
        assert_eq!(d.state(), GestureState::PendingVerification);
        d.step(up + 500.0);
        assert_eq!(d.state(), GestureState::Verifying);
        assert_eq!(d.drain_events(), vec![GestureEvent::Scanning]);

        d.step(up + 1699.0);
        assert!(d.drain_events().is_empty());
        d.step(up + 1700.0);
        assert_eq!(d.drain_events(), vec![GestureEvent::Confirmed]);

        d.step(up + 2499.0);
        assert_eq!(unlocks.get(), 0);
        d.step(up + 2500.0);
        assert_eq!(unlocks.get(), 1);
        assert_eq!(d.state(), GestureState::Unlocked);
        assert_eq!(d.drain_events(), vec![GestureEvent::Unlocked]);

        // Input is permanently disabled.
        let strokes = d.stroke_count();
        stroke(&mut d, 150.0, 30, up + 3000.0);
        d.clear();
        d.step(up + 10_000.0);
        assert_eq!(d.stroke_count(), strokes);
        assert_eq!(unlocks.get(), 1);
    }

    #[test]
    fn later_strokes_restart_the_debounce() {
        let (mut d, unlocks) = detector();
        let first_up = stroke(&mut d, 50.0, 20, 0.0);
        // Second stroke ends before the first debounce would have fired.
        let second_up = stroke(&mut d, 80.0, 4, first_up + 200.0);
        assert!(second_up < first_up + 500.0);

        d.step(first_up + 500.0);
        assert_eq!(d.state(), GestureState::PendingVerification);
        d.step(second_up + 500.0);
        assert_eq!(d.state(), GestureState::Verifying);

        d.step(second_up + 2500.0);
        d.step(second_up + 5000.0);
        assert_eq!(unlocks.get(), 1);
    }

    #[test]
    fn held_stroke_suspends_the_debounce() {
        let (mut d, unlocks) = detector();
        let first_up = stroke(&mut d, 50.0, 18, 0.0);
        assert_eq!(d.state(), GestureState::PendingVerification);

        // Second stroke still down when the first deadline passes.
        let down = first_up + 80.0;
        d.pointer_down(Vec2::new(10.0, 120.0), down);
        d.step(first_up + 600.0);
        assert_eq!(d.state(), GestureState::Drawing);

        let before = d.path_length();
        d.pointer_move(Vec2::new(30.0, 120.0), first_up + 700.0);
        assert!((d.path_length() - before - 20.0).abs() < 1e-4);

        let second_up = first_up + 720.0;
        d.pointer_up(second_up);
        d.step(second_up + 499.0);
        assert_eq!(d.state(), GestureState::PendingVerification);
        d.step(second_up + 500.0);
        assert_eq!(d.state(), GestureState::Verifying);
        d.step(second_up + 3_000.0);
        assert_eq!(unlocks.get(), 1);
    }

    #[test]
    fn one_long_frame_runs_every_stage() {
        let (mut d, unlocks) = detector();
        let up = stroke(&mut d, 100.0, 20, 0.0);
        d.step(up + 60_000.0);
        assert_eq!(unlocks.get(), 1);
        assert_eq!(
            d.drain_events(),
            vec![GestureEvent::Scanning, GestureEvent::Confirmed, GestureEvent::Unlocked]
        );
    }

    #[test]
    fn clear_cancels_pending_verification() {
        let (mut d, unlocks) = detector();
        let up = stroke(&mut d, 100.0, 20, 0.0);
        d.clear();
        assert_eq!(d.state(), GestureState::Idle);
        assert_eq!(d.path_length(), 0.0);
        assert_eq!(d.stroke_count(), 0);
        assert!(d.ink().is_empty());
        d.step(up + 5_000.0);
        assert_eq!(unlocks.get(), 0);
    }

    #[test]
    fn clear_is_ignored_while_verifying() {
        let (mut d, unlocks) = detector();
        let up = stroke(&mut d, 100.0, 20, 0.0);
        d.step(up + 600.0);
        d.clear();
        assert_eq!(d.state(), GestureState::Verifying);
        d.step(up + 3_000.0);
        assert_eq!(unlocks.get(), 1);
    }

    #[test]
    fn moves_without_a_press_draw_nothing() {
        let (mut d, _) = detector();
        d.pointer_move(Vec2::new(10.0, 10.0), 0.0);
        d.pointer_move(Vec2::new(190.0, 190.0), 16.0);
        d.pointer_up(32.0);
        assert_eq!(d.path_length(), 0.0);
        assert_eq!(d.state(), GestureState::Idle);
    }

    #[test]
    fn faster_strokes_are_thinner() {
        let (mut d, _) = detector();
        d.pointer_down(Vec2::new(0.0, 0.0), 0.0);
        d.pointer_move(Vec2::new(2.0, 0.0), 100.0); // 0.02 u/ms
        d.pointer_move(Vec2::new(102.0, 0.0), 110.0); // 10 u/ms
        d.pointer_move(Vec2::new(104.0, 0.0), 110.0); // zero dt counts as 1 ms
        let widths: Vec<f32> = d
            .ink()
            .iter()
            .filter_map(|m| match m {
                InkMark::Segment { width, .. } => Some(*width),
                InkMark::Dot { .. } => None,
            })
            .collect();
        assert!((widths[0] - 5.46).abs() < 1e-4);
        assert_eq!(widths[1], 1.5);
        assert_eq!(widths[2], 1.5);
    }

    #[test]
    fn sparkles_follow_speed_and_cap() {
        let (mut d, _) = detector();
        d.pointer_down(Vec2::new(100.0, 100.0), 0.0);
        assert_eq!(d.sparkle_count(), 1);

        // Too short to sparkle.
        d.pointer_move(Vec2::new(102.0, 100.0), 1.0);
        assert_eq!(d.sparkle_count(), 1);

        // 50 units in 1 ms: capped at 3.
        d.pointer_move(Vec2::new(152.0, 100.0), 2.0);
        assert_eq!(d.sparkle_count(), 4);

        for frame in 0..61 {
            d.step(frame as f64 * 16.0);
        }
        assert_eq!(d.sparkle_count(), 0);
    }

    #[test]
    fn renders_ink_on_the_unlock_layer() {
        let (mut d, _) = detector();
        stroke(&mut d, 100.0, 3, 0.0);
        let mut out = SceneBuffer::new();
        d.render(&mut out);
        assert_eq!(out.links_on(CanvasLayer::Unlock).count(), 3);
        assert!(out.dots_on(CanvasLayer::Unlock).count() >= 1);
    }

    #[test]
    fn absent_canvas_never_unlocks() {
        let unlocks = Rc::new(Cell::new(0));
        let counter = Rc::clone(&unlocks);
        let mut d = GestureUnlockDetector::new(None, GestureConfig::default(), Rng::new(1), move || {
            counter.set(counter.get() + 1)
        });
        stroke(&mut d, 100.0, 40, 0.0);
        d.step(100_000.0);
        assert_eq!(d.path_length(), 0.0);
        assert_eq!(unlocks.get(), 0);
    }
}
