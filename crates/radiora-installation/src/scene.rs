//! Scene definitions
//!
//! A scene is anything in the house that can be turned on, dimmed or turned
//! off with a single bridge command: a phantom button, a switched or dimmed
//! zone, a GRAFIK Eye preset, or a named subset of a GRAFIK Eye's presets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Phantom button that turns every zone on
pub const PHANTOM_BUTTON_ALL_ON: u32 = 16;
/// Phantom button that turns every zone off
pub const PHANTOM_BUTTON_ALL_OFF: u32 = 17;

/// Default dimmer level for [`SceneAction::Dim`]
pub const DEFAULT_DIM_LEVEL: u8 = 50;
/// Default dimmer level for [`SceneAction::On`]
pub const DEFAULT_ON_LEVEL: u8 = 100;

fn default_dim_level() -> u8 {
    DEFAULT_DIM_LEVEL
}

fn default_on_level() -> u8 {
    DEFAULT_ON_LEVEL
}

/// What a caller wants a scene to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneAction {
    On,
    Dim,
    Off,
}

impl SceneAction {
    /// Lowercase name, also used as the GRAFIK Eye preset key
    pub fn name(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Dim => "dim",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for SceneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The device or preset behind a scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneKind {
    /// Phantom buttons on the bridge. A button number of 0 means the
    /// action is not available.
    PhantomButton {
        on: u32,
        #[serde(default)]
        off: u32,
        #[serde(default)]
        dim: u32,
    },
    /// Switched zone
    Switch { zone: u32 },
    /// Dimmed zone
    Dimmer {
        zone: u32,
        #[serde(default = "default_dim_level")]
        dim_level: u8,
        #[serde(default = "default_on_level")]
        on_level: u8,
    },
    /// GRAFIK Eye control unit with named presets
    GrafikEye {
        zone: u32,
        scenes: BTreeMap<String, u32>,
    },
    /// Presets of another GRAFIK Eye scene, referenced by name
    SubScene {
        grafik_eye: String,
        on: String,
        off: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dim: Option<String>,
    },
}

impl SceneKind {
    /// Build a GRAFIK Eye kind, normalizing preset names
    pub fn grafik_eye<I, S>(zone: u32, scenes: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        Self::GrafikEye {
            zone,
            scenes: scenes
                .into_iter()
                .map(|(name, number)| (normalize_preset_name(name.as_ref()), number))
                .collect(),
        }
    }

    /// Whether the kind can perform `action` on its own.
    ///
    /// Sub-scenes are checked against their GRAFIK Eye when resolved.
    pub fn supports(&self, action: SceneAction) -> bool {
        match (self, action) {
            (Self::PhantomButton { on, .. }, SceneAction::On) => *on != 0,
            (Self::PhantomButton { off, .. }, SceneAction::Off) => *off != 0,
            (Self::PhantomButton { dim, .. }, SceneAction::Dim) => *dim != 0,
            (Self::Switch { .. }, SceneAction::Dim) => false,
            (Self::Switch { .. }, _) | (Self::Dimmer { .. }, _) => true,
            (Self::GrafikEye { scenes, .. }, action) => scenes.contains_key(action.name()),
            (Self::SubScene { dim, .. }, SceneAction::Dim) => dim.is_some(),
            (Self::SubScene { .. }, _) => true,
        }
    }
}

/// Preset names compare with underscores as spaces and ignoring case
pub fn normalize_preset_name(name: &str) -> String {
    name.trim().replace('_', " ").to_lowercase()
}

/// A named scene
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Primary name first, then aliases
    pub names: Vec<String>,
    /// Bridged system the scene lives on, if not the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<u8>,
    #[serde(flatten)]
    pub kind: SceneKind,
}

impl Scene {
    /// Create a scene with a single name
    pub fn new(name: impl Into<String>, kind: SceneKind) -> Self {
        Self {
            names: vec![name.into()],
            system: None,
            kind,
        }
    }

    /// Add an alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.names.push(alias.into());
        self
    }

    /// Pin the scene to a bridged system
    pub fn on_system(mut self, system: u8) -> Self {
        self.system = Some(system);
        self
    }

    /// Primary name, or an empty string for a nameless scene
    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or("")
    }

    /// Case-insensitive name or alias match
    pub fn is_named(&self, name: &str) -> bool {
        let wanted = name.trim();
        self.names.iter().any(|n| n.trim().eq_ignore_ascii_case(wanted))
    }
}
