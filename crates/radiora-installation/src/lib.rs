//! # RadioRA Installation
//!
//! Describes the scenes of a RadioRA installation (phantom buttons, switched
//! and dimmed zones, GRAFIK Eye presets and sub-scenes) and resolves scene
//! actions to bridge commands.

pub mod error;
pub mod installation;
pub mod scene;

pub use error::InstallationError;
pub use installation::{Installation, SceneCommand, SceneGroup};
pub use scene::{
    normalize_preset_name, Scene, SceneAction, SceneKind, DEFAULT_DIM_LEVEL, DEFAULT_ON_LEVEL,
    PHANTOM_BUTTON_ALL_OFF, PHANTOM_BUTTON_ALL_ON,
};
