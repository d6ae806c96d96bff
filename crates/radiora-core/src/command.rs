//! Outbound command encoding
//!
//! Commands are written as `<code>,<param>,...[,S<system>]`. Parameters are
//! validated before anything is formatted, so an invalid command never
//! produces a partial line.

use crate::error::CommandError;
use crate::feedback::{System, STATE_OFF, STATE_ON, STATE_TOGGLE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest dimmer level accepted by `SDL`
pub const MAX_DIMMER_LEVEL: u8 = 100;

/// Action for a phantom button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonAction {
    /// `ON`
    On,
    /// `OFF`
    Off,
    /// `TOG`
    Toggle,
}

impl ButtonAction {
    /// Wire token
    pub fn token(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
            Self::Toggle => STATE_TOGGLE,
        }
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// On/off parameter for switch and flash commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SwitchState {
    /// `ON`
    On,
    /// `OFF`
    Off,
}

impl SwitchState {
    /// Wire token
    pub fn token(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<bool> for SwitchState {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}

/// Host-originated instruction for the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// `BP`: press a phantom button
    PhantomButtonPress {
        /// Phantom button number
        button_number: u32,
        /// Press action
        action: ButtonAction,
        /// Fade time in seconds
        fade_time: Option<u32>,
        /// Append `DS` (delay switch)
        delay_switch: bool,
    },
    /// `SDL`: set a dimmer level
    SetDimmerLevel {
        /// Zone number
        zone_number: u32,
        /// Level in percent, 0-100
        level: u8,
        /// Fade time in seconds
        fade_time: Option<u32>,
    },
    /// `SSL`: set a switch
    SetSwitchLevel {
        /// Zone number
        zone_number: u32,
        /// On or off
        state: SwitchState,
        /// Delay in seconds
        delay_time: Option<u32>,
    },
    /// `SGS`: select a GRAFIK Eye scene
    SetGrafikEyeScene {
        /// Zone number of the GRAFIK Eye
        zone_number: u32,
        /// Scene number
        scene: u32,
    },
    /// `SFM`: security flash mode
    SecurityFlashMode {
        /// Phantom button number
        button_number: u32,
        /// On or off
        state: SwitchState,
    },
    /// `VERI`: ask for the bridge firmware version
    VersionInquiry,
    /// `LZCMON` / `LZCMOFF`
    ///
    /// Some host software disables monitoring with `SZCMOFF` instead. This
    /// encoder sends `LZCMOFF`, the form symmetric with `LZCMON`; confirm
    /// which one the bridge firmware in use accepts.
    LocalZoneChangeMonitoring {
        /// Enable or disable monitoring
        enable: bool,
    },
    /// `MBPMON` / `MBPMOFF`
    MasterControlButtonPressMonitoring {
        /// Enable or disable monitoring
        enable: bool,
    },
}

impl Command {
    /// Command code as written on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::PhantomButtonPress { .. } => "BP",
            Self::SetDimmerLevel { .. } => "SDL",
            Self::SetSwitchLevel { .. } => "SSL",
            Self::SetGrafikEyeScene { .. } => "SGS",
            Self::SecurityFlashMode { .. } => "SFM",
            Self::VersionInquiry => "VERI",
            Self::LocalZoneChangeMonitoring { enable: true } => "LZCMON",
            Self::LocalZoneChangeMonitoring { enable: false } => "LZCMOFF",
            Self::MasterControlButtonPressMonitoring { enable: true } => "MBPMON",
            Self::MasterControlButtonPressMonitoring { enable: false } => "MBPMOFF",
        }
    }

    /// Whether the command may carry a trailing system field
    pub fn accepts_system(&self) -> bool {
        matches!(
            self,
            Self::PhantomButtonPress { .. }
                | Self::SetDimmerLevel { .. }
                | Self::SetSwitchLevel { .. }
                | Self::SetGrafikEyeScene { .. }
        )
    }

    /// Check parameter domains
    pub fn validate(&self) -> Result<(), CommandError> {
        match self {
            Self::SetDimmerLevel { level, .. } if *level > MAX_DIMMER_LEVEL => {
                Err(CommandError::InvalidLevel { level: *level })
            }
            _ => Ok(()),
        }
    }

    /// Encode the command line, without the terminator
    ///
    /// `system` must be 1 or 2, and only system-scoped commands accept one.
    pub fn encode(&self, system: Option<u8>) -> Result<String, CommandError> {
        self.validate()?;

        let system = match system {
            None => None,
            Some(number) => {
                let system =
                    System::from_number(number).ok_or(CommandError::InvalidSystem { system: number })?;
                if !self.accepts_system() {
                    return Err(CommandError::SystemNotSupported { code: self.code() });
                }
                Some(system)
            }
        };

        let mut line = self.to_string();
        if let Some(system) = system {
            line.push_str(&format!(",{}", system));
        }
        Ok(line)
    }
}

/// Renders the command without a system field
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        match self {
            Self::PhantomButtonPress {
                button_number,
                action,
                fade_time,
                delay_switch,
            } => {
                write!(f, "{},{},{}", code, button_number, action)?;
                if let Some(fade) = fade_time {
                    write!(f, ",{}", fade)?;
                }
                if *delay_switch {
                    write!(f, ",DS")?;
                }
                Ok(())
            }
            Self::SetDimmerLevel {
                zone_number,
                level,
                fade_time,
            } => {
                write!(f, "{},{},{}", code, zone_number, level)?;
                if let Some(fade) = fade_time {
                    write!(f, ",{}", fade)?;
                }
                Ok(())
            }
            Self::SetSwitchLevel {
                zone_number,
                state,
                delay_time,
            } => {
                write!(f, "{},{},{}", code, zone_number, state)?;
                if let Some(delay) = delay_time {
                    write!(f, ",{}", delay)?;
                }
                Ok(())
            }
            Self::SetGrafikEyeScene { zone_number, scene } => {
                write!(f, "{},{},{}", code, zone_number, scene)
            }
            Self::SecurityFlashMode {
                button_number,
                state,
            } => write!(f, "{},{},{}", code, button_number, state),
            Self::VersionInquiry
            | Self::LocalZoneChangeMonitoring { .. }
            | Self::MasterControlButtonPressMonitoring { .. } => f.write_str(code),
        }
    }
}
