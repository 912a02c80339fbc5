pub mod hub;
pub mod queue;
