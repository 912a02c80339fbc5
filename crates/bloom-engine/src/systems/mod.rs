pub mod gesture;
pub mod hold;
pub mod orchestrator;
pub mod particles;
