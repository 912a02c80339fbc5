use thiserror::Error;

use super::collaborators::Animation;

/// Problems loading or validating a [`StageConfig`](super::config::StageConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid stage config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be {expected}, got {value}")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Liveness failures of delegated animations.
/// The orchestrator logs these and carries on; they never stop the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum StageError {
    #[error("{animation:?} did not complete within {after_ms} ms")]
    AnimationTimedOut { animation: Animation, after_ms: f64 },

    #[error("{animation:?} was dropped by the presentation without completing")]
    AnimationAbandoned { animation: Animation },
}
