//! Press-and-hold seal.
//!
//! Progress climbs from 0 to 100 over `duration_ms` while the seal is held and
//! drains by a fixed amount per frame once released. Reaching 100 seals the
//! pact exactly once; a plain click on the seal is accepted as a full hold.

use log::{debug, info};

use super::particles::Rng;
use crate::api::collaborators::{Haptics, SealStatus, SealSurface, SealVisuals};
use crate::api::config::HoldConfig;
use crate::core::latch::Latch;

const SUCCESS_PATTERN_MS: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldState {
    Released,
    Holding,
    Completed,
}

pub struct HoldConfirmationEngine {
    seal: Option<Box<dyn SealSurface>>,
    haptics: Option<Box<dyn Haptics>>,
    config: HoldConfig,
    rng: Rng,
    armed: bool,
    state: HoldState,
    progress: f32,
    /// Time at which a continuous hold from zero would have begun.
    origin_ms: f64,
    sealed: Latch,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl HoldConfirmationEngine {
    /// Without a seal surface the engine never completes.
    pub fn new(
        seal: Option<Box<dyn SealSurface>>,
        haptics: Option<Box<dyn Haptics>>,
        config: HoldConfig,
        rng: Rng,
        on_complete: impl FnOnce() + 'static,
    ) -> Self {
        if seal.is_none() {
            debug!("hold: no seal surface, confirmation disabled");
        }
        Self {
            seal,
            haptics,
            config,
            rng,
            armed: false,
            state: HoldState::Released,
            progress: 0.0,
            origin_ms: 0.0,
            sealed: Latch::new(),
            on_complete: Some(Box::new(on_complete)),
        }
    }

    /// Make the seal interactive. Input before this is ignored.
    pub fn arm(&mut self) {
        if self.seal.is_some() && !self.armed {
            debug!("hold: armed");
            self.armed = true;
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn state(&self) -> HoldState {
        self.state
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_set()
    }

    fn accepts_input(&self) -> bool {
        self.armed && self.state != HoldState::Completed
    }

    /// Press started on the seal. A re-press resumes from the current progress.
    pub fn press(&mut self, now_ms: f64) {
        if !self.accepts_input() || self.state == HoldState::Holding {
            return;
        }
        self.state = HoldState::Holding;
        self.origin_ms = now_ms - (self.progress / 100.0) as f64 * self.config.duration_ms;
        if let Some(seal) = &mut self.seal {
            seal.status(SealStatus::Holding);
        }
    }

    /// Press ended anywhere on the page.
    pub fn release(&mut self) {
        if self.state != HoldState::Holding {
            return;
        }
        self.state = HoldState::Released;
        let resting = self.visuals_at(self.progress, false);
        if let Some(seal) = &mut self.seal {
            seal.status(SealStatus::Released);
            seal.render(&SealVisuals {
                scale: 1.0,
                jitter: 0.0,
                ..resting
            });
        }
    }

    /// A click without a sustained hold counts as a completed hold.
    pub fn click(&mut self) {
        if !self.accepts_input() {
            return;
        }
        debug!("hold: click fallback at {:.0}%", self.progress);
        self.progress = 100.0;
        self.show(100.0);
        self.complete();
    }

    /// Once per frame: grow while holding, decay while released.
    pub fn update(&mut self, now_ms: f64) {
        match self.state {
            HoldState::Completed => {}
            HoldState::Holding => {
                let elapsed = now_ms - self.origin_ms;
                self.progress =
                    ((elapsed / self.config.duration_ms * 100.0) as f32).clamp(0.0, 100.0);
                if self.progress > self.config.feedback_threshold {
                    self.pulse();
                }
                self.show(self.progress);
                if self.progress >= 100.0 {
                    self.complete();
                }
            }
            HoldState::Released => {
                if self.progress > 0.0 {
                    self.progress = (self.progress - self.config.decay_per_frame).max(0.0);
                    self.show(self.progress);
                }
            }
        }
    }

    fn pulse(&mut self) {
        let Some(haptics) = &mut self.haptics else { return };
        if self.rng.chance(self.config.haptic_chance) {
            haptics.vibrate(&[self.config.haptic_pulse_ms]);
        }
    }

    fn visuals_at(&mut self, progress: f32, shake: bool) -> SealVisuals {
        let circumference = self.config.ring_circumference;
        let jitter = if shake && progress > self.config.feedback_threshold {
            self.rng.signed(self.config.jitter)
        } else {
            0.0
        };
        SealVisuals {
            progress,
            dash_offset: circumference - progress / 100.0 * circumference,
            scale: 1.0 + progress / 500.0,
            jitter,
        }
    }

    fn show(&mut self, progress: f32) {
        let visuals = self.visuals_at(progress, true);
        if let Some(seal) = &mut self.seal {
            seal.render(&visuals);
        }
    }

    fn complete(&mut self) {
        self.state = HoldState::Completed;
        if !self.sealed.try_set() {
            return;
        }
        info!("hold: pact sealed");
        if let Some(haptics) = &mut self.haptics {
            haptics.vibrate(&SUCCESS_PATTERN_MS);
        }
        if let Some(seal) = &mut self.seal {
            seal.status(SealStatus::Sealed);
        }
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorded {
        frames: Vec<SealVisuals>,
        statuses: Vec<SealStatus>,
        vibrations: Vec<Vec<u32>>,
    }

    struct RecordingSeal(Rc<RefCell<Recorded>>);

    impl SealSurface for RecordingSeal {
        fn render(&mut self, visuals: &SealVisuals) {
            self.0.borrow_mut().frames.push(*visuals);
        }

        fn status(&mut self, status: SealStatus) {
            self.0.borrow_mut().statuses.push(status);
        }
    }

    struct RecordingHaptics(Rc<RefCell<Recorded>>);

    impl Haptics for RecordingHaptics {
        fn vibrate(&mut self, pattern_ms: &[u32]) {
            self.0.borrow_mut().vibrations.push(pattern_ms.to_vec());
        }
    }

    fn engine_with(config: HoldConfig) -> (HoldConfirmationEngine, Rc<RefCell<Recorded>>, Rc<Cell<u32>>) {
        let log = Rc::new(RefCell::new(Recorded::default()));
        let completions = Rc::new(Cell::new(0));
        let counter = Rc::clone(&completions);
        let mut engine = HoldConfirmationEngine::new(
            Some(Box::new(RecordingSeal(Rc::clone(&log)))),
            Some(Box::new(RecordingHaptics(Rc::clone(&log)))),
            config,
            Rng::new(3),
            move || counter.set(counter.get() + 1),
        );
        engine.arm();
        (engine, log, completions)
    }

    fn engine() -> (HoldConfirmationEngine, Rc<RefCell<Recorded>>, Rc<Cell<u32>>) {
        engine_with(HoldConfig::default())
    }

    #[test]
    fn full_hold_completes_exactly_once() {
        let (mut engine, log, completions) = engine();
        engine.press(0.0);
        let mut t = 0.0;
        while t <= 1600.0 {
            engine.update(t);
            t += 16.0;
        }
        assert_eq!(engine.progress(), 100.0);
        assert_eq!(engine.state(), HoldState::Completed);
        assert_eq!(completions.get(), 1);

        engine.click();
        engine.press(2000.0);
        engine.update(2100.0);
        assert_eq!(completions.get(), 1);

        let log = log.borrow();
        assert_eq!(log.statuses.last(), Some(&SealStatus::Sealed));
        assert_eq!(log.vibrations.last(), Some(&vec![200, 100, 200]));
        let last = log.frames.last().unwrap();
        assert_eq!(last.dash_offset, 0.0);
        assert!((last.scale - 1.2).abs() < 1e-6);
    }

    #[test]
    fn release_decays_to_zero_without_completing() {
        let (mut engine, log, completions) = engine();
        engine.press(0.0);
        engine.update(900.0);
        assert!((engine.progress() - 60.0).abs() < 1e-4);
        engine.release();
        assert_eq!(engine.state(), HoldState::Released);
        {
            let log = log.borrow();
            let resting = log.frames.last().unwrap();
            assert_eq!(resting.scale, 1.0);
            assert_eq!(resting.jitter, 0.0);
        }

        let mut last = engine.progress();
        for frame in 0..20 {
            engine.update(900.0 + frame as f64 * 16.0);
            assert!(engine.progress() <= last);
            last = engine.progress();
        }
        assert_eq!(engine.progress(), 0.0);
        assert_eq!(completions.get(), 0);
        // 60 / 5 = 12 decay frames, then nothing more to draw.
        let frames_after_release = log.borrow().frames.len();
        engine.update(2000.0);
        assert_eq!(log.borrow().frames.len(), frames_after_release);
    }

    #[test]
    fn repress_resumes_from_current_progress() {
        let (mut engine, _, _) = engine();
        engine.press(0.0);
        engine.update(750.0);
        engine.release();
        engine.update(766.0);
        assert!((engine.progress() - 45.0).abs() < 1e-4);
        engine.press(1000.0);
        engine.update(1000.0);
        assert!((engine.progress() - 45.0).abs() < 1e-4);
        engine.update(1000.0 + 900.0);
        assert_eq!(engine.progress(), 100.0);
    }

    #[test]
    fn frame_before_the_press_keeps_progress_at_zero() {
        let (mut engine, log, _) = engine();
        engine.press(100.0);
        engine.update(90.0);
        assert_eq!(engine.progress(), 0.0);
        let frame = *log.borrow().frames.last().unwrap();
        assert_eq!(frame.dash_offset, HoldConfig::default().ring_circumference);
        assert_eq!(frame.scale, 1.0);
    }

    #[test]
    fn click_fallback_completes_immediately() {
        let (mut engine, log, completions) = engine();
        engine.press(0.0);
        engine.update(300.0);
        engine.release();
        engine.click();
        assert_eq!(engine.progress(), 100.0);
        assert!(engine.is_sealed());
        assert_eq!(completions.get(), 1);
        assert_eq!(log.borrow().frames.last().unwrap().progress, 100.0);
    }

    #[test]
    fn feedback_only_above_threshold() {
        let config = HoldConfig {
            haptic_chance: 1.0,
            ..HoldConfig::default()
        };
        let (mut engine, log, _) = engine_with(config);
        engine.press(0.0);
        engine.update(1050.0); // 70%
        assert!(log.borrow().vibrations.is_empty());
        assert_eq!(log.borrow().frames.last().unwrap().jitter, 0.0);

        engine.update(1350.0); // 90%
        let log = log.borrow();
        assert_eq!(log.vibrations, vec![vec![5]]);
        let jitter = log.frames.last().unwrap().jitter;
        assert!((-2.0..=2.0).contains(&jitter));
    }

    #[test]
    fn ignores_input_until_armed() {
        let completions = Rc::new(Cell::new(0));
        let counter = Rc::clone(&completions);
        let log = Rc::new(RefCell::new(Recorded::default()));
        let mut engine = HoldConfirmationEngine::new(
            Some(Box::new(RecordingSeal(Rc::clone(&log)))),
            None,
            HoldConfig::default(),
            Rng::new(1),
            move || counter.set(counter.get() + 1),
        );
        engine.press(0.0);
        engine.click();
        engine.update(5_000.0);
        assert_eq!(engine.state(), HoldState::Released);
        assert_eq!(completions.get(), 0);

        // Missing haptics are skipped silently.
        engine.arm();
        engine.click();
        assert_eq!(completions.get(), 1);
    }

    #[test]
    fn absent_seal_is_inert() {
        let completions = Rc::new(Cell::new(0));
        let counter = Rc::clone(&completions);
        let mut engine = HoldConfirmationEngine::new(None, None, HoldConfig::default(), Rng::new(1), move || {
            counter.set(counter.get() + 1)
        });
        engine.arm();
        assert!(!engine.is_armed());
        engine.press(0.0);
        engine.update(2_000.0);
        engine.click();
        assert_eq!(completions.get(), 0);
    }
}
