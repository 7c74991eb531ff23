//! Configuration: the scene description loaded at startup and the settings
//! record the menu writes and the session reads.
//!
//! # Invariants
//! - Loading never panics; every problem surfaces as a [`ConfigError`].
//! - Negative dwell thresholds are rejected. Zero is accepted and completes
//!   on the next tick.

mod scene;
mod settings;

pub use scene::{
    AvatarConfig, DwellConfig, GazeTargetConfig, SceneConfig, ScriptStep, TeleportTargetConfig,
    answer_matches,
};
pub use settings::{GameSettings, MovementOption, SharedSettings, SpeedOption};

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate object name: {0}")]
    DuplicateName(String),
    #[error("script step {step} refers to unknown target {name}")]
    UnknownTarget { step: usize, name: String },
    #[error("script step {step} waits a negative or non-finite time ({seconds})")]
    InvalidWait { step: usize, seconds: f32 },
    #[error("dwell threshold {field} must be a non-negative number of seconds ({seconds})")]
    InvalidThreshold { field: &'static str, seconds: f32 },
    #[error("answer {0} is not one of the unlock objects")]
    UnknownAnswer(String),
    #[error("unknown {group} option: {name}")]
    UnknownOption { group: &'static str, name: String },
}

pub fn crate_info() -> &'static str {
    "gazeland-config v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("config"));
    }
}
