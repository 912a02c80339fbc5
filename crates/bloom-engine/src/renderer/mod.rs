pub mod instance;

pub use instance::{CanvasLayer, DotInstance, LinkInstance, SceneBuffer};
