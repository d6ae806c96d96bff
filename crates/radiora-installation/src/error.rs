//! Error types for the installation crate.

use crate::scene::SceneAction;
use std::io;
use thiserror::Error;

/// Errors raised while building or querying an installation
#[derive(Error, Debug)]
pub enum InstallationError {
    /// No scene is known by this name
    #[error("Unknown scene: {0}")]
    UnknownScene(String),

    /// No scene group is known by this name
    #[error("Unknown scene group: {0}")]
    UnknownGroup(String),

    /// The scene cannot perform the action
    #[error("Scene '{scene}' does not support {action}")]
    UnsupportedAction {
        /// The scene's primary name.
        scene: String,
        /// The rejected action.
        action: SceneAction,
    },

    /// Two scenes share a name
    #[error("Duplicate scene name: {0}")]
    DuplicateName(String),

    /// A scene's definition is inconsistent
    #[error("Invalid scene '{scene}': {reason}")]
    InvalidScene {
        /// The scene's primary name.
        scene: String,
        /// Why the definition was rejected.
        reason: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<InstallationError> for radiora_core::Error {
    fn from(e: InstallationError) -> Self {
        match e {
            InstallationError::Io(e) => radiora_core::Error::Io(e),
            other => radiora_core::Error::other(other.to_string()),
        }
    }
}
