//! Feedback line decoder
//!
//! Classifies a raw line from the bridge into a [`Feedback`] variant. The
//! command code selects a rule from a fixed table; each rule declares the
//! minimum field count it needs and extracts its fields positionally.
//! Fields past what a rule consumes are ignored, so newer firmware that
//! appends fields still decodes.

use super::{
    ButtonEvent, ButtonState, CordlessEvent, Feedback, FeedbackTag, LedMap, LocalZoneChange,
    MapEntry, MasterControlButtonPress, System, SystemMode, UnknownFeedback, ZoneMap, ZoneState,
};
use crate::error::DecodeError;

type Extract = fn(&Fields<'_>) -> Result<Feedback, DecodeError>;

/// One entry of the decode table
struct DecodeRule {
    tag: FeedbackTag,
    /// Field count including the command code
    min_fields: usize,
    extract: Extract,
}

const DECODE_TABLE: &[DecodeRule] = &[
    DecodeRule {
        tag: FeedbackTag::Prompt,
        min_fields: 1,
        extract: |_| Ok(Feedback::Prompt),
    },
    DecodeRule {
        tag: FeedbackTag::LocalZoneChange,
        min_fields: 3,
        extract: local_zone_change,
    },
    DecodeRule {
        tag: FeedbackTag::MasterControlButtonPress,
        min_fields: 4,
        extract: master_control_button_press,
    },
    DecodeRule {
        tag: FeedbackTag::RaiseButtonPress,
        min_fields: 3,
        extract: |f| button_event(f).map(Feedback::RaiseButtonPress),
    },
    DecodeRule {
        tag: FeedbackTag::RaiseButtonRelease,
        min_fields: 3,
        extract: |f| button_event(f).map(Feedback::RaiseButtonRelease),
    },
    DecodeRule {
        tag: FeedbackTag::LowerButtonPress,
        min_fields: 3,
        extract: |f| button_event(f).map(Feedback::LowerButtonPress),
    },
    DecodeRule {
        tag: FeedbackTag::LowerButtonRelease,
        min_fields: 3,
        extract: |f| button_event(f).map(Feedback::LowerButtonRelease),
    },
    DecodeRule {
        tag: FeedbackTag::CordlessWakingUp,
        min_fields: 2,
        extract: |f| cordless_event(f).map(Feedback::CordlessWakingUp),
    },
    DecodeRule {
        tag: FeedbackTag::CordlessGoingToSleep,
        min_fields: 2,
        extract: |f| cordless_event(f).map(Feedback::CordlessGoingToSleep),
    },
    DecodeRule {
        tag: FeedbackTag::LedMap,
        min_fields: 2,
        extract: led_map,
    },
    DecodeRule {
        tag: FeedbackTag::ZoneMap,
        min_fields: 2,
        extract: zone_map,
    },
    DecodeRule {
        tag: FeedbackTag::SystemMode,
        min_fields: 3,
        extract: system_mode,
    },
];

/// Command codes the decoder recognizes
pub fn recognized_codes() -> impl Iterator<Item = &'static str> {
    DECODE_TABLE.iter().filter_map(|rule| rule.tag.code())
}

/// Decode a raw line (terminator already stripped)
///
/// Unrecognized command codes and lines with too few fields decode to
/// [`Feedback::Unknown`]. Only a recognized command with a field value
/// outside its domain is an error.
pub fn decode(raw_line: &str) -> Result<Feedback, DecodeError> {
    let tokens = split_fields(raw_line);

    let Some(code) = tokens.first() else {
        return Ok(unknown(raw_line, tokens));
    };

    let rule = DECODE_TABLE
        .iter()
        .find(|rule| rule.tag.code() == Some(code.as_str()));

    match rule {
        Some(rule) if tokens.len() >= rule.min_fields => {
            let fields = Fields {
                raw_line,
                code: rule.tag.code().unwrap_or_default(),
                tokens: &tokens,
            };
            (rule.extract)(&fields)
        }
        _ => Ok(unknown(raw_line, tokens)),
    }
}

/// Decode a raw line, downgrading malformed lines to [`Feedback::Unknown`]
pub fn decode_lossy(raw_line: &str) -> Feedback {
    match decode(raw_line) {
        Ok(feedback) => feedback,
        Err(e) => {
            tracing::warn!("Malformed feedback: {}", e);
            unknown(raw_line, split_fields(raw_line))
        }
    }
}

fn split_fields(raw_line: &str) -> Vec<String> {
    let stripped: String = raw_line.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() {
        return Vec::new();
    }
    stripped.split(',').map(str::to_string).collect()
}

fn unknown(raw_line: &str, parsed_fields: Vec<String>) -> Feedback {
    Feedback::Unknown(UnknownFeedback {
        raw_line: raw_line.to_string(),
        parsed_fields,
    })
}

/// Positional view over the fields of a recognized line
struct Fields<'a> {
    raw_line: &'a str,
    code: &'static str,
    tokens: &'a [String],
}

impl Fields<'_> {
    fn token(&self, index: usize) -> &str {
        self.tokens.get(index).map(String::as_str).unwrap_or_default()
    }

    fn number(&self, index: usize, field: &'static str) -> Result<u32, DecodeError> {
        let value = self.token(index);
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidNumber {
                field,
                value: value.to_string(),
                raw_line: self.raw_line.to_string(),
            });
        }
        value.parse().map_err(|_| DecodeError::InvalidNumber {
            field,
            value: value.to_string(),
            raw_line: self.raw_line.to_string(),
        })
    }

    /// Trailing system field; absent or empty means no explicit system
    fn system(&self, index: usize) -> Result<Option<System>, DecodeError> {
        let value = self.token(index);
        if value.is_empty() {
            return Ok(None);
        }
        System::from_token(value)
            .map(Some)
            .ok_or_else(|| DecodeError::InvalidSystem {
                value: value.to_string(),
                raw_line: self.raw_line.to_string(),
            })
    }

    fn invalid_state(&self, index: usize) -> DecodeError {
        DecodeError::InvalidState {
            code: self.code,
            value: self.token(index).to_string(),
            raw_line: self.raw_line.to_string(),
        }
    }

    fn bitmap(&self, index: usize) -> Result<Vec<MapEntry>, DecodeError> {
        self.token(index)
            .chars()
            .map(|c| {
                MapEntry::from_char(c).ok_or_else(|| DecodeError::InvalidBitmap {
                    character: c,
                    raw_line: self.raw_line.to_string(),
                })
            })
            .collect()
    }
}

fn local_zone_change(f: &Fields<'_>) -> Result<Feedback, DecodeError> {
    Ok(Feedback::LocalZoneChange(LocalZoneChange {
        zone_number: f.number(1, "zone_number")?,
        state: ZoneState::from_token(f.token(2)).ok_or_else(|| f.invalid_state(2))?,
        system: f.system(3)?,
    }))
}

fn master_control_button_press(f: &Fields<'_>) -> Result<Feedback, DecodeError> {
    Ok(Feedback::MasterControlButtonPress(MasterControlButtonPress {
        master_control_number: f.number(1, "master_control_number")?,
        button_number: f.number(2, "button_number")?,
        state: ButtonState::from_token(f.token(3)).ok_or_else(|| f.invalid_state(3))?,
        system: f.system(4)?,
    }))
}

fn button_event(f: &Fields<'_>) -> Result<ButtonEvent, DecodeError> {
    Ok(ButtonEvent {
        master_control_number: f.number(1, "master_control_number")?,
        button_number: f.number(2, "button_number")?,
        system: f.system(3)?,
    })
}

fn cordless_event(f: &Fields<'_>) -> Result<CordlessEvent, DecodeError> {
    Ok(CordlessEvent {
        master_control_number: f.number(1, "master_control_number")?,
        system: f.system(2)?,
    })
}

fn led_map(f: &Fields<'_>) -> Result<Feedback, DecodeError> {
    Ok(Feedback::LedMap(LedMap {
        led_states: f.bitmap(1)?,
    }))
}

fn zone_map(f: &Fields<'_>) -> Result<Feedback, DecodeError> {
    Ok(Feedback::ZoneMap(ZoneMap {
        zone_states: f.bitmap(1)?,
        system: f.system(2)?,
    }))
}

fn system_mode(f: &Fields<'_>) -> Result<Feedback, DecodeError> {
    Ok(Feedback::SystemMode(SystemMode {
        system_mode: f.token(1).to_string(),
        event: f.token(2).to_string(),
        system: f.system(3)?,
    }))
}
