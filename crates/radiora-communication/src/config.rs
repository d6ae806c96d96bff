//! Connection and controller configuration
//!
//! Both structures serialize to JSON. Loading validates before returning,
//! and saving validates before writing.

use radiora_core::{ControllerError, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Baud rate the bridge ships with
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Serial connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionParams {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// RTS/CTS flow control
    pub hardware_handshaking: bool,
    /// Read timeout of the reader thread, in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            hardware_handshaking: true,
            read_timeout_ms: 100,
        }
    }
}

impl ConnectionParams {
    /// Parameters for a port with every other setting at its default
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_hardware_handshaking(mut self, enabled: bool) -> Self {
        self.hardware_handshaking = enabled;
        self
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> std::result::Result<(), ControllerError> {
        if self.port.trim().is_empty() {
            return Err(invalid("Port name must not be empty"));
        }
        if self.baud_rate == 0 {
            return Err(invalid("Baud rate must be > 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(invalid("Read timeout must be > 0"));
        }
        Ok(())
    }
}

/// Controller configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Serial connection
    pub connection: ConnectionParams,
    /// Two bridges are linked, so system 2 exists
    pub bridged: bool,
    /// System used for system-scoped commands sent without one
    pub default_system: Option<u8>,
}

impl ControllerConfig {
    pub fn new(connection: ConnectionParams) -> Self {
        Self {
            connection,
            ..Self::default()
        }
    }

    /// Load config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::other(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::other(format!("Invalid JSON config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::other(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| Error::other(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate configuration
    ///
    /// The connection is checked by [`SerialTransport::open`] instead, so a
    /// controller running on another transport needs no port name.
    ///
    /// [`SerialTransport::open`]: crate::SerialTransport::open
    pub fn validate(&self) -> std::result::Result<(), ControllerError> {
        match self.default_system {
            None | Some(1) => Ok(()),
            Some(2) if self.bridged => Ok(()),
            Some(2) => Err(invalid("Default system 2 requires a bridged installation")),
            Some(n) => Err(invalid(format!("Default system {} must be 1 or 2", n))),
        }
    }

    /// Whether `system` exists in this installation
    pub fn allows_system(&self, system: u8) -> bool {
        system == 1 || (system == 2 && self.bridged)
    }
}

fn invalid(reason: impl Into<String>) -> ControllerError {
    ControllerError::InvalidConfig {
        reason: reason.into(),
    }
}
