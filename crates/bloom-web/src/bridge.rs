//! Host-facing implementations of the stage collaborators.
//!
//! Everything the stage asks of the page is queued as [`StageEvent`]s and read
//! by JavaScript after each tick. Animation completions wait here until the
//! host reports the animation finished.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use bloom_engine::{
    Animation, Completion, Cue, Haptics, Phase, Presentation, SealStatus, SealSurface, SealVisuals,
    StageEvent,
};
use log::{debug, warn};

/// Shared event queue for the host.
#[derive(Default)]
pub struct Outbox {
    events: RefCell<Vec<StageEvent>>,
    waiting: RefCell<HashMap<Animation, Completion>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: StageEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Take everything queued since the last call.
    pub fn drain_into(&self, out: &mut Vec<StageEvent>) {
        out.clear();
        out.append(&mut self.events.borrow_mut());
    }

    /// The host finished `animation`. Returns false if nothing was waiting on it.
    pub fn complete(&self, animation: Animation) -> bool {
        let done = self.waiting.borrow_mut().remove(&animation);
        match done {
            Some(done) => {
                done.finish();
                true
            }
            None => {
                debug!("bridge: {:?} completed but nothing was waiting", animation);
                false
            }
        }
    }

    pub fn waiting(&self) -> usize {
        self.waiting.borrow().len()
    }
}

impl Presentation for Outbox {
    fn play(&self, animation: Animation, done: Completion) {
        self.push(StageEvent::new(StageEvent::PLAY, animation.code() as f32, 0.0, 0.0));
        let replaced = self.waiting.borrow_mut().insert(animation, done);
        if replaced.is_some() {
            // Dropping the old handle marks it abandoned.
            warn!("bridge: {:?} restarted before completing", animation);
        }
    }

    fn cue(&self, cue: Cue) {
        self.push(StageEvent::new(StageEvent::CUE, cue.code() as f32, 0.0, 0.0));
    }

    fn phase_changed(&self, phase: Phase) {
        self.push(StageEvent::new(StageEvent::PHASE, phase.code() as f32, 0.0, 0.0));
    }
}

/// Seal state as five floats: progress, dash offset, scale, jitter, status.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct SealFrame {
    pub progress: f32,
    pub dash_offset: f32,
    pub scale: f32,
    pub jitter: f32,
    /// 0 idle, 1 holding, 2 released, 3 sealed.
    pub status: f32,
}

impl SealFrame {
    pub const FLOATS: usize = 5;

    fn idle(circumference: f32) -> Self {
        Self {
            progress: 0.0,
            dash_offset: circumference,
            scale: 1.0,
            jitter: 0.0,
            status: 0.0,
        }
    }
}

/// Seal surface writing into a shared [`SealFrame`].
pub struct SealBridge {
    frame: Rc<RefCell<SealFrame>>,
}

impl SealBridge {
    pub fn new(circumference: f32) -> (Self, Rc<RefCell<SealFrame>>) {
        let frame = Rc::new(RefCell::new(SealFrame::idle(circumference)));
        (
            Self {
                frame: Rc::clone(&frame),
            },
            frame,
        )
    }
}

impl SealSurface for SealBridge {
    fn render(&mut self, visuals: &SealVisuals) {
        let mut frame = self.frame.borrow_mut();
        frame.progress = visuals.progress;
        frame.dash_offset = visuals.dash_offset;
        frame.scale = visuals.scale;
        frame.jitter = visuals.jitter;
    }

    fn status(&mut self, status: SealStatus) {
        self.frame.borrow_mut().status = match status {
            SealStatus::Holding => 1.0,
            SealStatus::Released => 2.0,
            SealStatus::Sealed => 3.0,
        };
    }
}

/// Vibration requests forwarded as events.
pub struct HapticsBridge {
    outbox: Rc<Outbox>,
}

impl HapticsBridge {
    pub fn new(outbox: Rc<Outbox>) -> Self {
        Self { outbox }
    }
}

impl Haptics for HapticsBridge {
    fn vibrate(&mut self, pattern_ms: &[u32]) {
        let step = |i: usize| pattern_ms.get(i).copied().unwrap_or(0) as f32;
        self.outbox
            .push(StageEvent::new(StageEvent::VIBRATE, step(0), step(1), step(2)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_engine::core::task::completion;

    #[test]
    fn play_waits_for_host_completion() {
        let outbox = Outbox::new();
        let (done, _signal) = completion();
        outbox.play(Animation::Reveal, done);
        assert_eq!(outbox.waiting(), 1);
        assert!(outbox.complete(Animation::Reveal));
        assert!(!outbox.complete(Animation::Reveal));

        let mut events = Vec::new();
        outbox.drain_into(&mut events);
        assert_eq!(events, vec![StageEvent::new(StageEvent::PLAY, 2.0, 0.0, 0.0)]);
        outbox.drain_into(&mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn vibration_patterns_fit_one_event() {
        let outbox = Rc::new(Outbox::new());
        let mut haptics = HapticsBridge::new(Rc::clone(&outbox));
        haptics.vibrate(&[200, 100, 200]);
        haptics.vibrate(&[5]);
        let mut events = Vec::new();
        outbox.drain_into(&mut events);
        assert_eq!(events[0], StageEvent::new(StageEvent::VIBRATE, 200.0, 100.0, 200.0));
        assert_eq!(events[1], StageEvent::new(StageEvent::VIBRATE, 5.0, 0.0, 0.0));
    }
}
