//! Feedback model for the RadioRA bridge protocol
//!
//! Every line the bridge sends is decoded into one [`Feedback`] variant.
//! Each variant renders back to its wire form through `Display`, which the
//! in-memory transport uses to simulate the bridge.

pub mod decoder;

pub use decoder::{decode, decode_lossy, recognized_codes};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire token for the "on" state
pub const STATE_ON: &str = "ON";
/// Wire token for the "off" state
pub const STATE_OFF: &str = "OFF";
/// Wire token for the "toggle" state (outbound only)
pub const STATE_TOGGLE: &str = "TOG";
/// Wire token for the "change" state (feedback only)
pub const STATE_CHANGE: &str = "CHG";

/// Device-side partition identifier
///
/// A bridged installation has two systems; an unbridged one only uses
/// system 1, which is also the default when a line carries no system field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum System {
    /// System 1 (default)
    #[default]
    One,
    /// System 2
    Two,
}

impl System {
    /// The numeric system id (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Convert a numeric system id, rejecting anything but 1 and 2
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    /// Parse a wire system field (`S1` or `S2`)
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "S1" => Some(Self::One),
            "S2" => Some(Self::Two),
            _ => None,
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.number())
    }
}

/// State reported by a local zone change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneState {
    /// Zone turned on
    On,
    /// Zone turned off
    Off,
    /// Zone level changed
    Change,
}

impl ZoneState {
    /// Wire token for this state
    pub fn token(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
            Self::Change => STATE_CHANGE,
        }
    }

    /// Parse a wire token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            STATE_ON => Some(Self::On),
            STATE_OFF => Some(Self::Off),
            STATE_CHANGE => Some(Self::Change),
            _ => None,
        }
    }
}

impl fmt::Display for ZoneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// State reported by a master control button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    /// Button LED on
    On,
    /// Button LED off
    Off,
}

impl ButtonState {
    /// Wire token for this state
    pub fn token(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
        }
    }

    /// Parse a wire token
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            STATE_ON => Some(Self::On),
            STATE_OFF => Some(Self::Off),
            _ => None,
        }
    }
}

impl fmt::Display for ButtonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One position of an LED or zone bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapEntry {
    /// `1`
    On,
    /// `0`
    Off,
    /// `X`: not installed or not known
    Unknown,
}

impl MapEntry {
    /// Parse one bitmap character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '1' => Some(Self::On),
            '0' => Some(Self::Off),
            'X' => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Bitmap character for this entry
    pub fn as_char(self) -> char {
        match self {
            Self::On => '1',
            Self::Off => '0',
            Self::Unknown => 'X',
        }
    }

    /// `Some(true)` for on, `Some(false)` for off, `None` when unknown
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }
}

/// Feedback that may be scoped to one of the two systems
pub trait SystemScoped {
    /// The explicit system carried on the wire, if any
    fn system(&self) -> Option<System>;

    /// The effective system number; 1 when the line carried none
    fn system_number(&self) -> u8 {
        self.system().unwrap_or_default().number()
    }
}

/// `LZC`: a zone changed state at the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalZoneChange {
    /// Zone number
    pub zone_number: u32,
    /// New state
    pub state: ZoneState,
    /// Explicit system, if present
    pub system: Option<System>,
}

/// `MBP`: a master control button was pressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterControlButtonPress {
    /// Master control number
    pub master_control_number: u32,
    /// Button number on the master control
    pub button_number: u32,
    /// LED state after the press
    pub state: ButtonState,
    /// Explicit system, if present
    pub system: Option<System>,
}

/// `RBP`, `RBR`, `LBP`, `LBR`: raise/lower button activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEvent {
    /// Master control number
    pub master_control_number: u32,
    /// Button number on the master control
    pub button_number: u32,
    /// Explicit system, if present
    pub system: Option<System>,
}

/// `CWU`, `CGS`: cordless master control wake/sleep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CordlessEvent {
    /// Master control number
    pub master_control_number: u32,
    /// Explicit system, if present
    pub system: Option<System>,
}

/// `LMP`: LED states of the phantom buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedMap {
    /// One entry per LED, in button order
    pub led_states: Vec<MapEntry>,
}

/// `ZMP`: on/off states of every zone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMap {
    /// One entry per zone, in zone order
    pub zone_states: Vec<MapEntry>,
    /// Explicit system, if present
    pub system: Option<System>,
}

impl ZoneMap {
    /// State of a 1-based zone number
    pub fn zone(&self, zone_number: usize) -> Option<MapEntry> {
        zone_number
            .checked_sub(1)
            .and_then(|i| self.zone_states.get(i).copied())
    }
}

/// `RSM`: RadioRA system mode change (security, vacation, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMode {
    /// Mode token as sent by the bridge
    pub system_mode: String,
    /// Event token as sent by the bridge
    pub event: String,
    /// Explicit system, if present
    pub system: Option<System>,
}

/// A line the decoder did not recognize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownFeedback {
    /// The line exactly as received
    pub raw_line: String,
    /// The whitespace-stripped comma-separated fields
    pub parsed_fields: Vec<String>,
}

macro_rules! impl_system_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl SystemScoped for $ty {
                fn system(&self) -> Option<System> {
                    self.system
                }
            }
        )*
    };
}

impl_system_scoped!(
    LocalZoneChange,
    MasterControlButtonPress,
    ButtonEvent,
    CordlessEvent,
    ZoneMap,
    SystemMode,
);

/// Discriminant of a [`Feedback`] variant, used to key observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedbackTag {
    /// `!`
    Prompt,
    /// `LZC`
    LocalZoneChange,
    /// `MBP`
    MasterControlButtonPress,
    /// `RBP`
    RaiseButtonPress,
    /// `RBR`
    RaiseButtonRelease,
    /// `LBP`
    LowerButtonPress,
    /// `LBR`
    LowerButtonRelease,
    /// `CWU`
    CordlessWakingUp,
    /// `CGS`
    CordlessGoingToSleep,
    /// `LMP`
    LedMap,
    /// `ZMP`
    ZoneMap,
    /// `RSM`
    SystemMode,
    /// Anything unrecognized
    Unknown,
}

impl FeedbackTag {
    /// Every tag, in table order
    pub const ALL: [FeedbackTag; 13] = [
        Self::Prompt,
        Self::LocalZoneChange,
        Self::MasterControlButtonPress,
        Self::RaiseButtonPress,
        Self::RaiseButtonRelease,
        Self::LowerButtonPress,
        Self::LowerButtonRelease,
        Self::CordlessWakingUp,
        Self::CordlessGoingToSleep,
        Self::LedMap,
        Self::ZoneMap,
        Self::SystemMode,
        Self::Unknown,
    ];

    /// Wire command code; `None` for [`FeedbackTag::Unknown`]
    pub fn code(self) -> Option<&'static str> {
        match self {
            Self::Prompt => Some("!"),
            Self::LocalZoneChange => Some("LZC"),
            Self::MasterControlButtonPress => Some("MBP"),
            Self::RaiseButtonPress => Some("RBP"),
            Self::RaiseButtonRelease => Some("RBR"),
            Self::LowerButtonPress => Some("LBP"),
            Self::LowerButtonRelease => Some("LBR"),
            Self::CordlessWakingUp => Some("CWU"),
            Self::CordlessGoingToSleep => Some("CGS"),
            Self::LedMap => Some("LMP"),
            Self::ZoneMap => Some("ZMP"),
            Self::SystemMode => Some("RSM"),
            Self::Unknown => None,
        }
    }
}

impl fmt::Display for FeedbackTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{:?}({})", self, code),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Decoded feedback line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    /// The bridge is idle and ready for a command
    Prompt,
    /// Zone changed state
    LocalZoneChange(LocalZoneChange),
    /// Master control button pressed
    MasterControlButtonPress(MasterControlButtonPress),
    /// Raise button pressed
    RaiseButtonPress(ButtonEvent),
    /// Raise button released
    RaiseButtonRelease(ButtonEvent),
    /// Lower button pressed
    LowerButtonPress(ButtonEvent),
    /// Lower button released
    LowerButtonRelease(ButtonEvent),
    /// Cordless master control woke up
    CordlessWakingUp(CordlessEvent),
    /// Cordless master control going to sleep
    CordlessGoingToSleep(CordlessEvent),
    /// Phantom button LED map
    LedMap(LedMap),
    /// Zone map
    ZoneMap(ZoneMap),
    /// System mode change
    SystemMode(SystemMode),
    /// Unrecognized line
    Unknown(UnknownFeedback),
}

impl Feedback {
    /// The tag observers are keyed by
    pub fn tag(&self) -> FeedbackTag {
        match self {
            Self::Prompt => FeedbackTag::Prompt,
            Self::LocalZoneChange(_) => FeedbackTag::LocalZoneChange,
            Self::MasterControlButtonPress(_) => FeedbackTag::MasterControlButtonPress,
            Self::RaiseButtonPress(_) => FeedbackTag::RaiseButtonPress,
            Self::RaiseButtonRelease(_) => FeedbackTag::RaiseButtonRelease,
            Self::LowerButtonPress(_) => FeedbackTag::LowerButtonPress,
            Self::LowerButtonRelease(_) => FeedbackTag::LowerButtonRelease,
            Self::CordlessWakingUp(_) => FeedbackTag::CordlessWakingUp,
            Self::CordlessGoingToSleep(_) => FeedbackTag::CordlessGoingToSleep,
            Self::LedMap(_) => FeedbackTag::LedMap,
            Self::ZoneMap(_) => FeedbackTag::ZoneMap,
            Self::SystemMode(_) => FeedbackTag::SystemMode,
            Self::Unknown(_) => FeedbackTag::Unknown,
        }
    }

    /// Effective system number, for variants that are system scoped
    pub fn system_number(&self) -> Option<u8> {
        let scoped: &dyn SystemScoped = match self {
            Self::LocalZoneChange(f) => f,
            Self::MasterControlButtonPress(f) => f,
            Self::RaiseButtonPress(f)
            | Self::RaiseButtonRelease(f)
            | Self::LowerButtonPress(f)
            | Self::LowerButtonRelease(f) => f,
            Self::CordlessWakingUp(f) | Self::CordlessGoingToSleep(f) => f,
            Self::ZoneMap(f) => f,
            Self::SystemMode(f) => f,
            Self::Prompt | Self::LedMap(_) | Self::Unknown(_) => return None,
        };
        Some(scoped.system_number())
    }

    /// Whether the decoder recognized this line
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

fn write_system(f: &mut fmt::Formatter<'_>, system: Option<System>) -> fmt::Result {
    match system {
        Some(system) => write!(f, ",{}", system),
        None => Ok(()),
    }
}

fn write_bitmap(f: &mut fmt::Formatter<'_>, entries: &[MapEntry]) -> fmt::Result {
    entries.iter().try_for_each(|e| write!(f, "{}", e.as_char()))
}

/// Renders the wire line, without the terminator
impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.tag().code().unwrap_or_default();
        match self {
            Self::Prompt => f.write_str(code),
            Self::LocalZoneChange(z) => {
                write!(f, "{},{},{}", code, z.zone_number, z.state)?;
                write_system(f, z.system)
            }
            Self::MasterControlButtonPress(b) => {
                write!(
                    f,
                    "{},{},{},{}",
                    code, b.master_control_number, b.button_number, b.state
                )?;
                write_system(f, b.system)
            }
            Self::RaiseButtonPress(b)
            | Self::RaiseButtonRelease(b)
            | Self::LowerButtonPress(b)
            | Self::LowerButtonRelease(b) => {
                write!(f, "{},{},{}", code, b.master_control_number, b.button_number)?;
                write_system(f, b.system)
            }
            Self::CordlessWakingUp(c) | Self::CordlessGoingToSleep(c) => {
                write!(f, "{},{}", code, c.master_control_number)?;
                write_system(f, c.system)
            }
            Self::LedMap(m) => {
                write!(f, "{},", code)?;
                write_bitmap(f, &m.led_states)
            }
            Self::ZoneMap(m) => {
                write!(f, "{},", code)?;
                write_bitmap(f, &m.zone_states)?;
                write_system(f, m.system)
            }
            Self::SystemMode(m) => {
                write!(f, "{},{},{}", code, m.system_mode, m.event)?;
                write_system(f, m.system)
            }
            Self::Unknown(u) => f.write_str(&u.raw_line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_defaults_to_one() {
        let zone = LocalZoneChange {
            zone_number: 3,
            state: ZoneState::On,
            system: None,
        };
        assert_eq!(zone.system_number(), 1);

        let zone = LocalZoneChange {
            system: Some(System::Two),
            ..zone
        };
        assert_eq!(zone.system_number(), 2);
    }

    #[test]
    fn test_system_tokens() {
        assert_eq!(System::from_token("S1"), Some(System::One));
        assert_eq!(System::from_token("S2"), Some(System::Two));
        assert_eq!(System::from_token("S3"), None);
        assert_eq!(System::from_token("2"), None);
        assert_eq!(System::Two.to_string(), "S2");
        assert_eq!(System::from_number(0), None);
    }

    #[test]
    fn test_feedback_system_number() {
        assert_eq!(Feedback::Prompt.system_number(), None);
        let cgs = Feedback::CordlessGoingToSleep(CordlessEvent {
            master_control_number: 4,
            system: None,
        });
        assert_eq!(cgs.system_number(), Some(1));
        assert_eq!(cgs.tag(), FeedbackTag::CordlessGoingToSleep);
    }

    #[test]
    fn test_display_renders_wire_line() {
        let mbp = Feedback::MasterControlButtonPress(MasterControlButtonPress {
            master_control_number: 2,
            button_number: 5,
            state: ButtonState::Off,
            system: Some(System::One),
        });
        assert_eq!(mbp.to_string(), "MBP,2,5,OFF,S1");

        let lmp = Feedback::LedMap(LedMap {
            led_states: vec![MapEntry::On, MapEntry::Off, MapEntry::Unknown],
        });
        assert_eq!(lmp.to_string(), "LMP,10X");
        assert_eq!(Feedback::Prompt.to_string(), "!");
    }

    #[test]
    fn test_zone_map_lookup_is_one_based() {
        let map = ZoneMap {
            zone_states: vec![MapEntry::Off, MapEntry::On],
            system: None,
        };
        assert_eq!(map.zone(0), None);
        assert_eq!(map.zone(2), Some(MapEntry::On));
        assert_eq!(map.zone(3), None);
    }

    #[test]
    fn test_tag_codes_are_unique() {
        let codes: Vec<_> = FeedbackTag::ALL.iter().filter_map(|t| t.code()).collect();
        let mut deduped = codes.clone();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(codes.len(), deduped.len());
    }
}
