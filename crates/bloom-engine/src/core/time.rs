use std::cell::Cell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Shared monotonic millisecond clock.
///
/// The host advances it once per frame (`performance.now()` in the browser);
/// every timer in the stage reads it, so tests can drive time by hand.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    now: Rc<Cell<f64>>,
}

impl Clock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    /// Current time in milliseconds.
    pub fn now(&self) -> f64 {
        self.now.get()
    }

    /// Move the clock forward. Earlier timestamps are ignored.
    pub fn advance_to(&self, now_ms: f64) {
        if now_ms > self.now.get() {
            self.now.set(now_ms);
        }
    }

    /// A future that resolves once the clock reaches `now + ms`.
    pub fn sleep(&self, ms: f64) -> Sleep {
        Sleep {
            clock: self.clone(),
            deadline: self.now() + ms.max(0.0),
        }
    }
}

/// Timer future created by [`Clock::sleep`].
/// Readiness depends only on the clock, so polling it with a no-op waker is enough.
#[derive(Debug)]
pub struct Sleep {
    clock: Clock,
    deadline: f64,
}

impl Sleep {
    pub fn deadline(&self) -> f64 {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.clock.now() >= self.deadline {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Fixed timestep accumulator, in milliseconds.
/// Keeps the per-frame particle simulations at a constant rate regardless of display refresh.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step_ms: f64,
    max_steps: u32,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            max_steps: 10,
            accumulator: 0.0,
        }
    }

    /// Add frame time. Returns the number of fixed steps to run this frame.
    pub fn accumulate(&mut self, frame_ms: f64) -> u32 {
        self.accumulator += frame_ms.max(0.0);
        // A backgrounded tab can hand us seconds at once; never replay more than max_steps.
        self.accumulator = self.accumulator.min(self.step_ms * self.max_steps as f64);
        let steps = (self.accumulator / self.step_ms) as u32;
        self.accumulator -= steps as f64 * self.step_ms;
        steps
    }

    pub fn step_ms(&self) -> f64 {
        self.step_ms
    }
}
