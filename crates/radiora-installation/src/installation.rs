//! The installation: every scene and scene group in a house
//!
//! An [`Installation`] is built once, validated, and then only read. Scene
//! names and aliases are unique across the installation and are matched
//! without regard to case.

use crate::error::InstallationError;
use crate::scene::{normalize_preset_name, Scene, SceneAction, SceneKind};
use radiora_core::{ButtonAction, Command, SwitchState, MAX_DIMMER_LEVEL};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Command produced for a scene, with the system it should be sent to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCommand {
    pub command: Command,
    pub system: Option<u8>,
}

/// Named subset of an installation's scenes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneGroup {
    pub name: String,
    pub scenes: Vec<String>,
}

impl SceneGroup {
    pub fn new<I, S>(name: impl Into<String>, scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            scenes: scenes.into_iter().map(Into::into).collect(),
        }
    }
}

/// On-disk layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct InstallationFile {
    #[serde(default)]
    scenes: Vec<Scene>,
    #[serde(default)]
    groups: Vec<SceneGroup>,
}

/// Validated, immutable description of a RadioRA installation
#[derive(Debug, Clone, Default)]
pub struct Installation {
    scenes: Vec<Scene>,
    groups: Vec<SceneGroup>,
    by_name: HashMap<String, usize>,
}

fn lookup_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Installation {
    /// Validate and index scenes and groups
    pub fn new(scenes: Vec<Scene>, groups: Vec<SceneGroup>) -> Result<Self, InstallationError> {
        let scenes: Vec<Scene> = scenes.into_iter().map(normalize_scene).collect();

        let mut by_name = HashMap::new();
        for (index, scene) in scenes.iter().enumerate() {
            if scene.names.is_empty() {
                return Err(InstallationError::InvalidScene {
                    scene: format!("#{}", index),
                    reason: "scene has no name".to_string(),
                });
            }
            for name in &scene.names {
                let key = lookup_key(name);
                if key.is_empty() {
                    return Err(InstallationError::InvalidScene {
                        scene: scene.name().to_string(),
                        reason: "empty name".to_string(),
                    });
                }
                if by_name.insert(key, index).is_some() {
                    return Err(InstallationError::DuplicateName(name.clone()));
                }
            }
        }

        let installation = Self {
            scenes,
            groups: Vec::new(),
            by_name,
        };
        for scene in &installation.scenes {
            installation.validate_scene(scene)?;
        }

        let mut seen_groups = HashSet::new();
        for group in &groups {
            if !seen_groups.insert(lookup_key(&group.name)) {
                return Err(InstallationError::DuplicateName(group.name.clone()));
            }
            for member in &group.scenes {
                if installation.scene(member).is_none() {
                    return Err(InstallationError::UnknownScene(member.clone()));
                }
            }
        }

        tracing::debug!(
            "Installation loaded with {} scenes and {} groups",
            installation.scenes.len(),
            groups.len()
        );

        Ok(Self {
            groups,
            ..installation
        })
    }

    /// Parse an installation from JSON text
    pub fn from_json(json: &str) -> Result<Self, InstallationError> {
        let file: InstallationFile = serde_json::from_str(json)?;
        Self::new(file.scenes, file.groups)
    }

    /// Load an installation from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, InstallationError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, InstallationError> {
        let file = InstallationFile {
            scenes: self.scenes.clone(),
            groups: self.groups.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn groups(&self) -> &[SceneGroup] {
        &self.groups
    }

    /// Find a scene by name or alias
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.by_name
            .get(&lookup_key(name))
            .and_then(|&index| self.scenes.get(index))
    }

    /// Scenes of a group, in group order
    pub fn group(&self, name: &str) -> Result<Vec<&Scene>, InstallationError> {
        let wanted = lookup_key(name);
        let group = self
            .groups
            .iter()
            .find(|g| lookup_key(&g.name) == wanted)
            .ok_or_else(|| InstallationError::UnknownGroup(name.to_string()))?;

        group
            .scenes
            .iter()
            .map(|member| {
                self.scene(member)
                    .ok_or_else(|| InstallationError::UnknownScene(member.clone()))
            })
            .collect()
    }

    /// Whether the named scene can perform `action`
    pub fn supports(&self, name: &str, action: SceneAction) -> bool {
        self.command_for(name, action).is_ok()
    }

    /// Resolve a scene action to the command that performs it
    pub fn command_for(
        &self,
        name: &str,
        action: SceneAction,
    ) -> Result<SceneCommand, InstallationError> {
        let scene = self
            .scene(name)
            .ok_or_else(|| InstallationError::UnknownScene(name.to_string()))?;
        self.resolve(scene, action)
    }

    /// Commands for every scene of a group that supports `action`
    pub fn group_commands(
        &self,
        name: &str,
        action: SceneAction,
    ) -> Result<Vec<SceneCommand>, InstallationError> {
        Ok(self
            .group(name)?
            .into_iter()
            .filter_map(|scene| self.resolve(scene, action).ok())
            .collect())
    }

    fn resolve(&self, scene: &Scene, action: SceneAction) -> Result<SceneCommand, InstallationError> {
        let unsupported = || InstallationError::UnsupportedAction {
            scene: scene.name().to_string(),
            action,
        };
        if !scene.kind.supports(action) {
            return Err(unsupported());
        }

        let command = match &scene.kind {
            SceneKind::PhantomButton { on, off, dim } => {
                let (button_number, action) = match action {
                    SceneAction::On => (*on, ButtonAction::On),
                    SceneAction::Dim => (*dim, ButtonAction::On),
                    // A separate off button is pressed ON to undo the on button's scene
                    SceneAction::Off if off == on => (*off, ButtonAction::Off),
                    SceneAction::Off => (*off, ButtonAction::On),
                };
                Command::PhantomButtonPress {
                    button_number,
                    action,
                    fade_time: None,
                    delay_switch: false,
                }
            }
            SceneKind::Switch { zone } => Command::SetSwitchLevel {
                zone_number: *zone,
                state: SwitchState::from(action == SceneAction::On),
                delay_time: None,
            },
            SceneKind::Dimmer {
                zone,
                dim_level,
                on_level,
            } => Command::SetDimmerLevel {
                zone_number: *zone,
                level: match action {
                    SceneAction::On => *on_level,
                    SceneAction::Dim => *dim_level,
                    SceneAction::Off => 0,
                },
                fade_time: None,
            },
            SceneKind::GrafikEye { zone, scenes } => Command::SetGrafikEyeScene {
                zone_number: *zone,
                scene: *scenes.get(action.name()).ok_or_else(unsupported)?,
            },
            SceneKind::SubScene {
                grafik_eye,
                on,
                off,
                dim,
            } => {
                let preset = match action {
                    SceneAction::On => Some(on),
                    SceneAction::Off => Some(off),
                    SceneAction::Dim => dim.as_ref(),
                }
                .ok_or_else(unsupported)?;
                let parent = self
                    .scene(grafik_eye)
                    .ok_or_else(|| InstallationError::UnknownScene(grafik_eye.clone()))?;
                let (zone, number) = grafik_preset(parent, preset).ok_or_else(unsupported)?;
                return Ok(SceneCommand {
                    command: Command::SetGrafikEyeScene {
                        zone_number: zone,
                        scene: number,
                    },
                    system: scene.system.or(parent.system),
                });
            }
        };

        Ok(SceneCommand {
            command,
            system: scene.system,
        })
    }

    fn validate_scene(&self, scene: &Scene) -> Result<(), InstallationError> {
        let invalid = |reason: String| InstallationError::InvalidScene {
            scene: scene.name().to_string(),
            reason,
        };

        if let Some(system) = scene.system {
            if !(1..=2).contains(&system) {
                return Err(invalid(format!("system {} is not 1 or 2", system)));
            }
        }

        match &scene.kind {
            SceneKind::PhantomButton { on, .. } if *on == 0 => {
                Err(invalid("phantom button 'on' must not be 0".to_string()))
            }
            SceneKind::Dimmer {
                dim_level,
                on_level,
                ..
            } if *dim_level > MAX_DIMMER_LEVEL || *on_level > MAX_DIMMER_LEVEL => Err(invalid(
                format!("dimmer levels must be at most {}", MAX_DIMMER_LEVEL),
            )),
            SceneKind::SubScene {
                grafik_eye,
                on,
                off,
                dim,
            } => {
                let parent = self
                    .scene(grafik_eye)
                    .ok_or_else(|| invalid(format!("unknown GRAFIK Eye '{}'", grafik_eye)))?;
                if !matches!(parent.kind, SceneKind::GrafikEye { .. }) {
                    return Err(invalid(format!("'{}' is not a GRAFIK Eye", grafik_eye)));
                }
                for preset in [Some(on), Some(off), dim.as_ref()].into_iter().flatten() {
                    if grafik_preset(parent, preset).is_none() {
                        return Err(invalid(format!(
                            "'{}' has no preset '{}'",
                            grafik_eye, preset
                        )));
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Zone and preset number of a GRAFIK Eye preset
fn grafik_preset(scene: &Scene, preset: &str) -> Option<(u32, u32)> {
    match &scene.kind {
        SceneKind::GrafikEye { zone, scenes } => scenes
            .get(&normalize_preset_name(preset))
            .map(|number| (*zone, *number)),
        _ => None,
    }
}

fn normalize_scene(mut scene: Scene) -> Scene {
    scene.kind = match scene.kind {
        SceneKind::GrafikEye { zone, scenes } => SceneKind::grafik_eye(zone, scenes),
        kind => kind,
    };
    scene
}
