use std::cell::Cell;

/// One-way boolean flag.
///
/// `try_set` is a compare-and-set: the first caller wins, every later call is a no-op.
/// Atomic only under the single-threaded stage; a threaded host needs `AtomicBool`.
#[derive(Debug, Default)]
pub struct Latch {
    set: Cell<bool>,
}

impl Latch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true exactly once.
    pub fn try_set(&self) -> bool {
        !self.set.replace(true)
    }

    pub fn is_set(&self) -> bool {
        self.set.get()
    }
}
