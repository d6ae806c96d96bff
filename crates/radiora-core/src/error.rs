//! Error handling for the RadioRA bridge library
//!
//! Provides error types for each layer of the library:
//! - Decode errors (malformed feedback fields)
//! - Queue errors (dispatch queue lifecycle)
//! - Command errors (invalid outbound parameters)
//! - Transport errors (line transport I/O)
//! - Controller errors (facade lifecycle)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Feedback decode error
///
/// Raised when a recognized command carries a field value outside its
/// domain. The raw line is always preserved for diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A required integer field is not a base-10 number
    #[error("Field '{field}' is not a number: '{value}' in line '{raw_line}'")]
    InvalidNumber {
        /// The name of the offending field.
        field: &'static str,
        /// The token found on the wire.
        value: String,
        /// The complete line as received.
        raw_line: String,
    },

    /// A state token is outside the set accepted by the command
    #[error("Invalid state '{value}' for {code} in line '{raw_line}'")]
    InvalidState {
        /// The command code being decoded.
        code: &'static str,
        /// The token found on the wire.
        value: String,
        /// The complete line as received.
        raw_line: String,
    },

    /// A system field is not `S1` or `S2`
    #[error("Invalid system field '{value}' in line '{raw_line}'")]
    InvalidSystem {
        /// The token found on the wire.
        value: String,
        /// The complete line as received.
        raw_line: String,
    },

    /// A bitmap field holds a character other than `0`, `1` or `X`
    #[error("Invalid bitmap character '{character}' in line '{raw_line}'")]
    InvalidBitmap {
        /// The offending character.
        character: char,
        /// The complete line as received.
        raw_line: String,
    },
}

impl DecodeError {
    /// The line that failed to decode
    pub fn raw_line(&self) -> &str {
        match self {
            Self::InvalidNumber { raw_line, .. }
            | Self::InvalidState { raw_line, .. }
            | Self::InvalidSystem { raw_line, .. }
            | Self::InvalidBitmap { raw_line, .. } => raw_line,
        }
    }
}

/// Feedback dispatch queue error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The queue has been stopped and accepts no further work
    #[error("Feedback queue is stopped")]
    Stopped,

    /// The dispatch thread terminated because an observer panicked
    #[error("Feedback queue is faulted: dispatch thread terminated")]
    Faulted,

    /// The dispatch thread could not be spawned
    #[error("Failed to start dispatch thread: {reason}")]
    SpawnFailed {
        /// The reason the thread could not be spawned.
        reason: String,
    },

    /// `stop` was called on a queue that was already stopped
    #[error("Feedback queue stopped twice")]
    AlreadyStopped,

    /// An observer panicked; reported by `stop`
    #[error("Feedback observer panicked: {message}")]
    ObserverPanicked {
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl QueueError {
    /// Whether this error reports misuse of the queue API rather than a runtime condition
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::AlreadyStopped)
    }
}

/// Outbound command error
///
/// Raised before anything is written to the transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// System number outside 1..=2
    #[error("Invalid system number {system}: must be 1 or 2")]
    InvalidSystem {
        /// The rejected system number.
        system: u8,
    },

    /// A system number was given to a command that is never system scoped
    #[error("Command {code} does not accept a system number")]
    SystemNotSupported {
        /// The command code.
        code: &'static str,
    },

    /// Dimmer level above 100 percent
    #[error("Invalid dimmer level {level}: must be 0-100")]
    InvalidLevel {
        /// The rejected level.
        level: u8,
    },

    /// Any other parameter outside its domain
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Line transport error
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Failed to open the underlying device
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// The transport is not open
    #[error("Transport not open")]
    NotOpen,

    /// The transport is already delivering lines
    #[error("Transport already open")]
    AlreadyOpen,

    /// Write failed
    #[error("Write failed: {reason}")]
    WriteFailed {
        /// The reason the write failed.
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Controller facade error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller has been shut down
    #[error("Controller not running")]
    NotRunning,

    /// `shutdown` called on a controller that was already shut down
    #[error("Controller already shut down")]
    AlreadyStopped,

    /// Configuration is invalid
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration was rejected.
        reason: String,
    },
}

/// Main error type for the RadioRA library
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Decode error
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Queue error
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Command error
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is an invalid outbound argument
    pub fn is_command_error(&self) -> bool {
        matches!(self, Error::Command(_))
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this reports API misuse rather than a runtime fault
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Error::Queue(e) => e.is_contract_violation(),
            Error::Controller(ControllerError::AlreadyStopped) => true,
            _ => false,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
