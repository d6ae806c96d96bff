//! # RadioRA
//!
//! Control and feedback library for the Lutron RadioRA Chronos System Bridge.
//!
//! ## Architecture
//!
//! RadioRA is organized as a workspace with multiple crates:
//!
//! 1. **radiora-core** - Feedback model, line decoder, command encoder, dispatch queue
//! 2. **radiora-communication** - Serial and in-memory transports, configuration, controller
//! 3. **radiora-installation** - Scenes, scene groups, and scene-to-command resolution
//! 4. **radiora** - This facade crate
//!
//! ## Example
//!
//! ```rust,ignore
//! use radiora::{ControllerConfig, ConnectionParams, FeedbackTag, RadioRaController};
//!
//! radiora::init_logging()?;
//! let config = ControllerConfig::new(ConnectionParams::new("/dev/ttyUSB0"));
//! let controller = RadioRaController::open_serial(config)?;
//! controller.set_observer(FeedbackTag::LocalZoneChange, |feedback| {
//!     println!("{}", feedback);
//! })?;
//! controller.set_local_zone_change_monitoring(true)?;
//! ```

pub use radiora_core::{command, dispatch, feedback};

pub use radiora_core::{
    decode, decode_lossy, ButtonAction, ButtonEvent, ButtonState, Command, CommandError,
    ControllerError, CordlessEvent, DecodeError, Error, Feedback, FeedbackQueue, FeedbackTag,
    LedMap, LocalZoneChange, MapEntry, MasterControlButtonPress, Observer, ObserverKey,
    QueueError, Result, SwitchState, System, SystemMode, SystemScoped, TransportError,
    UnknownFeedback, ZoneMap, ZoneState, MAX_DIMMER_LEVEL,
};

pub use radiora_communication::{
    ConnectionParams, ControllerConfig, ControllerState, LineAssembler, LineHandler,
    LineTransport, MemoryTransport, RadioRaController, SerialTransport,
};

pub use radiora_installation::{
    Installation, InstallationError, Scene, SceneAction, SceneCommand, SceneGroup, SceneKind,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support, defaulting to `info`
///
/// Fails if a global subscriber is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Initialize logging as one JSON object per line, for log collectors
pub fn init_json_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().json().with_current_span(false))
        .try_init()?;

    Ok(())
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
}
