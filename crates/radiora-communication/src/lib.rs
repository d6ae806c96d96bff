//! # RadioRA Communication
//!
//! Line transports for the RadioRA System Bridge (serial and in-memory),
//! connection configuration, and the [`RadioRaController`] facade that
//! decodes feedback and sends commands.

pub mod config;
pub mod controller;
pub mod transport;

pub use config::{ConnectionParams, ControllerConfig, DEFAULT_BAUD_RATE};
pub use controller::{ControllerState, RadioRaController};
pub use transport::{
    LineAssembler, LineHandler, LineTransport, MemoryTransport, SerialTransport, LINE_TERMINATOR,
};
