//! Cooperative single-threaded task list.
//!
//! Phase sequences are written as `async` routines over [`Sleep`](super::time::Sleep)
//! and [`Signal`] futures. Neither needs a real waker: both become ready as a pure
//! function of clock or completion state, so the stage simply polls every live task
//! once per frame with a no-op waker.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::future::LocalBoxFuture;
use futures_util::task::noop_waker_ref;
use futures_util::FutureExt;

/// Cloneable handle for spawning tasks, safe to use from inside a running task.
#[derive(Clone, Default)]
pub struct Spawner {
    incoming: Rc<RefCell<Vec<LocalBoxFuture<'static, ()>>>>,
}

impl Spawner {
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.incoming.borrow_mut().push(task.boxed_local());
    }

    fn take(&self) -> Vec<LocalBoxFuture<'static, ()>> {
        std::mem::take(&mut *self.incoming.borrow_mut())
    }

    fn is_empty(&self) -> bool {
        self.incoming.borrow().is_empty()
    }
}

/// Owns the live tasks and drives them.
#[derive(Default)]
pub struct TaskList {
    spawner: Spawner,
    active: Vec<LocalBoxFuture<'static, ()>>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawner(&self) -> Spawner {
        self.spawner.clone()
    }

    /// Poll every task until none is ready to make progress.
    /// Tasks spawned during the pass are polled in the same call.
    pub fn run_until_stalled(&mut self) {
        let mut cx = Context::from_waker(noop_waker_ref());
        loop {
            self.active.extend(self.spawner.take());
            self.active
                .retain_mut(|task| task.as_mut().poll(&mut cx).is_pending());
            if self.spawner.is_empty() {
                break;
            }
        }
    }

    /// Number of tasks still pending.
    pub fn len(&self) -> usize {
        self.active.len() + self.spawner.incoming.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalState {
    Pending,
    Finished,
    Abandoned,
}

/// The collaborator was dropped without calling [`Completion::finish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abandoned;

/// One-shot "animation finished" handle passed to external collaborators.
#[derive(Debug)]
pub struct Completion {
    state: Rc<Cell<SignalState>>,
    finished: bool,
}

impl Completion {
    pub fn finish(mut self) {
        self.finished = true;
        self.state.set(SignalState::Finished);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.finished {
            self.state.set(SignalState::Abandoned);
        }
    }
}

/// Awaitable side of a [`Completion`].
#[derive(Debug)]
pub struct Signal {
    state: Rc<Cell<SignalState>>,
}

impl Future for Signal {
    type Output = Result<(), Abandoned>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.state.get() {
            SignalState::Pending => Poll::Pending,
            SignalState::Finished => Poll::Ready(Ok(())),
            SignalState::Abandoned => Poll::Ready(Err(Abandoned)),
        }
    }
}

/// Create a linked completion handle and its signal.
pub fn completion() -> (Completion, Signal) {
    let state = Rc::new(Cell::new(SignalState::Pending));
    (
        Completion {
            state: Rc::clone(&state),
            finished: false,
        },
        Signal { state },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::Clock;

    #[test]
    fn tasks_advance_with_the_clock() {
        let clock = Clock::new(0.0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tasks = TaskList::new();

        let (c, l) = (clock.clone(), Rc::clone(&log));
        tasks.spawner().spawn(async move {
            l.borrow_mut().push("start");
            c.sleep(100.0).await;
            l.borrow_mut().push("after 100");
        });

        tasks.run_until_stalled();
        assert_eq!(*log.borrow(), vec!["start"]);
        assert_eq!(tasks.len(), 1);

        clock.advance_to(100.0);
        tasks.run_until_stalled();
        assert_eq!(*log.borrow(), vec!["start", "after 100"]);
        assert!(tasks.is_empty());
    }

    #[test]
    fn nested_spawn_runs_in_same_pass() {
        let mut tasks = TaskList::new();
        let spawner = tasks.spawner();
        let hit = Rc::new(Cell::new(false));
        let h = Rc::clone(&hit);
        tasks.spawner().spawn(async move {
            spawner.spawn(async move { h.set(true) });
        });
        tasks.run_until_stalled();
        assert!(hit.get());
    }

    #[test]
    fn completion_signals_finish_and_abandon() {
        let mut cx = Context::from_waker(noop_waker_ref());

        let (done, mut signal) = completion();
        assert!(Pin::new(&mut signal).poll(&mut cx).is_pending());
        done.finish();
        assert_eq!(Pin::new(&mut signal).poll(&mut cx), Poll::Ready(Ok(())));

        let (done, mut signal) = completion();
        drop(done);
        assert_eq!(Pin::new(&mut signal).poll(&mut cx), Poll::Ready(Err(Abandoned)));
    }
}
