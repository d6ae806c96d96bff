//! # RadioRA Core
//!
//! Protocol core for the Lutron RadioRA Chronos System Bridge.
//! Provides the feedback model, the line decoder, the outbound command
//! encoder, and the dispatch queue that delivers decoded feedback to
//! observers.

pub mod command;
pub mod dispatch;
pub mod error;
pub mod feedback;

pub use command::{ButtonAction, Command, SwitchState, MAX_DIMMER_LEVEL};

pub use dispatch::{FeedbackQueue, Observer, ObserverKey};

pub use error::{
    CommandError, ControllerError, DecodeError, Error, QueueError, Result, TransportError,
};

pub use feedback::{
    decode, decode_lossy, ButtonEvent, ButtonState, CordlessEvent, Feedback, FeedbackTag, LedMap,
    LocalZoneChange, MapEntry, MasterControlButtonPress, System, SystemMode, SystemScoped,
    UnknownFeedback, ZoneMap, ZoneState,
};
