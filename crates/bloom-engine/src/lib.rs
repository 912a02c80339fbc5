pub mod api;
pub mod core;
pub mod input;
pub mod renderer;
pub mod systems;

// Re-export key types at crate root for convenience
pub use api::collaborators::{
    Animation, Canvas, Cue, Haptics, Presentation, SealStatus, SealSurface, SealVisuals, Surfaces,
};
pub use api::config::{
    DustConfig, FieldConfig, GestureConfig, HoldConfig, PollenConfig, StageConfig, TimelineConfig,
};
pub use api::error::{ConfigError, StageError};
pub use api::stage::Stage;
pub use api::types::{Phase, StageEvent, Target};
pub use core::task::Completion;
pub use core::time::{Clock, FixedTimestep};
pub use input::hub::{InputHub, InputSnapshot, Viewport};
pub use input::queue::{InputEvent, InputQueue, TimedInput};
pub use renderer::{CanvasLayer, DotInstance, LinkInstance, SceneBuffer};
pub use systems::gesture::{GestureState, GestureUnlockDetector};
pub use systems::hold::{HoldConfirmationEngine, HoldState};
pub use systems::orchestrator::{OpenTrigger, PhaseOrchestrator};
