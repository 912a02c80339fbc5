pub mod latch;
pub mod task;
pub mod time;
