//! RadioRA controller facade
//!
//! Ties a [`LineTransport`] to the feedback decoder and a [`FeedbackQueue`].
//! Every received line is decoded (malformed lines become
//! [`Feedback::Unknown`]) and queued for observers on the dispatch thread,
//! so observers never run on the transport's reader thread.

use crate::config::ControllerConfig;
use crate::transport::{LineHandler, LineTransport, SerialTransport};
use parking_lot::RwLock;
use radiora_core::{
    decode_lossy, ButtonAction, Command, CommandError, ControllerError, Error, Feedback,
    FeedbackQueue, ObserverKey, Result, SwitchState,
};
use radiora_installation::{Installation, SceneAction};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Running,
    ShuttingDown,
    Stopped,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Controller for a RadioRA System Bridge
pub struct RadioRaController {
    transport: Arc<dyn LineTransport>,
    queue: Arc<FeedbackQueue>,
    accepting: Arc<AtomicBool>,
    state: RwLock<ControllerState>,
    config: ControllerConfig,
}

impl RadioRaController {
    /// Start a controller on an already constructed transport
    pub fn start(transport: Arc<dyn LineTransport>, config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let queue = Arc::new(FeedbackQueue::start()?);
        let accepting = Arc::new(AtomicBool::new(true));

        let handler: LineHandler = {
            let queue = queue.clone();
            let accepting = accepting.clone();
            Arc::new(move |line: String| {
                if !accepting.load(Ordering::SeqCst) {
                    tracing::debug!("Ignoring line after shutdown: {}", line);
                    return;
                }
                let feedback = decode_lossy(&line);
                if let Err(e) = queue.enqueue(feedback) {
                    tracing::warn!("Dropped feedback line '{}': {}", line, e);
                }
            })
        };

        if let Err(e) = transport.open(handler) {
            tracing::error!("Failed to open transport {}: {}", transport.name(), e);
            return Err(e.into());
        }

        tracing::info!("RadioRA controller started on {}", transport.name());

        Ok(Self {
            transport,
            queue,
            accepting,
            state: RwLock::new(ControllerState::Running),
            config,
        })
    }

    /// Open the configured serial port and start a controller on it
    pub fn open_serial(config: ControllerConfig) -> Result<Self> {
        let transport = Arc::new(SerialTransport::new(config.connection.clone()));
        Self::start(transport, config)
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        *self.state.read()
    }

    pub fn is_running(&self) -> bool {
        self.state() == ControllerState::Running
    }

    /// Whether an observer panicked and feedback is no longer delivered
    pub fn is_faulted(&self) -> bool {
        self.queue.is_faulted()
    }

    /// Install the observer for a feedback tag, or for everything else
    /// with [`ObserverKey::Any`]
    pub fn set_observer<F>(&self, key: impl Into<ObserverKey>, observer: F) -> Result<()>
    where
        F: Fn(&Feedback) + Send + Sync + 'static,
    {
        self.queue.set_observer(key, observer)?;
        Ok(())
    }

    pub fn remove_observer(&self, key: impl Into<ObserverKey>) -> bool {
        self.queue.remove_observer(key)
    }

    /// Encode and write a command.
    ///
    /// System-scoped commands sent without a system use the configured
    /// default system. Nothing is written when validation fails.
    pub fn send(&self, command: &Command, system: Option<u8>) -> Result<()> {
        if !self.is_running() {
            return Err(ControllerError::NotRunning.into());
        }

        let system = match system {
            None if command.accepts_system() => self.config.default_system,
            other => other,
        };

        if let Some(number) = system {
            if number == 2 && command.accepts_system() && !self.config.allows_system(number) {
                return Err(CommandError::InvalidParameter {
                    param: "system".to_string(),
                    reason: "system 2 requires a bridged installation".to_string(),
                }
                .into());
            }
        }

        let line = command.encode(system)?;
        tracing::info!("Sending {}", line);
        self.transport.write_line(&line).map_err(|e| {
            tracing::error!("Failed to send '{}': {}", line, e);
            Error::from(e)
        })
    }

    pub fn phantom_button_press(
        &self,
        button_number: u32,
        action: ButtonAction,
        system: Option<u8>,
    ) -> Result<()> {
        self.send(
            &Command::PhantomButtonPress {
                button_number,
                action,
                fade_time: None,
                delay_switch: false,
            },
            system,
        )
    }

    pub fn set_dimmer_level(
        &self,
        zone_number: u32,
        level: u8,
        fade_time: Option<u32>,
        system: Option<u8>,
    ) -> Result<()> {
        self.send(
            &Command::SetDimmerLevel {
                zone_number,
                level,
                fade_time,
            },
            system,
        )
    }

    pub fn set_switch_level(
        &self,
        zone_number: u32,
        state: SwitchState,
        delay_time: Option<u32>,
        system: Option<u8>,
    ) -> Result<()> {
        self.send(
            &Command::SetSwitchLevel {
                zone_number,
                state,
                delay_time,
            },
            system,
        )
    }

    pub fn set_grafik_eye_scene(&self, zone_number: u32, scene: u32, system: Option<u8>) -> Result<()> {
        self.send(&Command::SetGrafikEyeScene { zone_number, scene }, system)
    }

    pub fn security_flash_mode(&self, button_number: u32, state: SwitchState) -> Result<()> {
        self.send(
            &Command::SecurityFlashMode {
                button_number,
                state,
            },
            None,
        )
    }

    pub fn version_inquiry(&self) -> Result<()> {
        self.send(&Command::VersionInquiry, None)
    }

    pub fn set_local_zone_change_monitoring(&self, enable: bool) -> Result<()> {
        self.send(&Command::LocalZoneChangeMonitoring { enable }, None)
    }

    pub fn set_master_control_button_press_monitoring(&self, enable: bool) -> Result<()> {
        self.send(&Command::MasterControlButtonPressMonitoring { enable }, None)
    }

    /// Perform a scene action from an installation
    pub fn apply_scene(
        &self,
        installation: &Installation,
        name: &str,
        action: SceneAction,
    ) -> Result<()> {
        let resolved = installation.command_for(name, action)?;
        tracing::debug!("Scene '{}' {} -> {}", name, action, resolved.command);
        self.send(&resolved.command, resolved.system)
    }

    /// Perform an action on every scene of a group that supports it.
    ///
    /// Returns the number of commands sent.
    pub fn apply_scene_group(
        &self,
        installation: &Installation,
        group: &str,
        action: SceneAction,
    ) -> Result<usize> {
        let commands = installation.group_commands(group, action)?;
        for resolved in &commands {
            self.send(&resolved.command, resolved.system)?;
        }
        Ok(commands.len())
    }

    /// Stop the controller
    ///
    /// Stops accepting transport input, closes the transport, then stops the
    /// dispatch queue, waiting for a running observer to return. Buffered
    /// feedback is dropped.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.state.write();
            if *state != ControllerState::Running {
                return Err(ControllerError::AlreadyStopped.into());
            }
            *state = ControllerState::ShuttingDown;
        }
        tracing::info!("Shutting down RadioRA controller on {}", self.transport.name());

        self.accepting.store(false, Ordering::SeqCst);

        // Both calls block on thread joins
        let transport = self.transport.clone();
        let queue = self.queue.clone();
        let result = tokio::task::spawn_blocking(move || {
            if let Err(e) = transport.close() {
                tracing::error!("Failed to close transport: {}", e);
            }
            queue.stop().map_err(Error::from)
        })
        .await
        .unwrap_or_else(|e| Err(Error::other(format!("Shutdown task failed: {}", e))));
        *self.state.write() = ControllerState::Stopped;

        match result {
            Ok(()) => {
                tracing::info!("RadioRA controller stopped");
                Ok(())
            }
            Err(e) => {
                tracing::error!("Feedback queue stopped with error: {}", e);
                Err(e)
            }
        }
    }
}

impl Drop for RadioRaController {
    fn drop(&mut self) {
        if *self.state.read() == ControllerState::Running {
            self.accepting.store(false, Ordering::SeqCst);
            if let Err(e) = self.transport.close() {
                tracing::warn!("Failed to close transport on drop: {}", e);
            }
        }
    }
}

impl fmt::Debug for RadioRaController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadioRaController")
            .field("transport", &self.transport.name())
            .field("state", &self.state())
            .field("queue", &self.queue)
            .field("config", &self.config)
            .finish()
    }
}
