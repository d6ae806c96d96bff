//! Serial port transport
//!
//! Opens the bridge's RS-232 port with the `serialport` crate. A dedicated
//! reader thread assembles lines and hands them to the line handler; writes
//! go through a mutex-guarded clone of the port.

use super::{LineAssembler, LineHandler, LineTransport, LINE_TERMINATOR};
use crate::config::ConnectionParams;
use parking_lot::Mutex;
use radiora_core::TransportError;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

const READ_BUFFER_SIZE: usize = 256;

/// List serial ports present on this machine
pub fn available_ports() -> Result<Vec<String>, TransportError> {
    match serialport::available_ports() {
        Ok(ports) => Ok(ports.into_iter().map(|p| p.port_name).collect()),
        Err(e) => {
            tracing::error!("Failed to enumerate serial ports: {}", e);
            Err(TransportError::Io {
                reason: format!("Failed to enumerate ports: {}", e),
            })
        }
    }
}

/// Transport over a serial port
pub struct SerialTransport {
    params: ConnectionParams,
    writer: Mutex<Option<Box<dyn serialport::SerialPort>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl SerialTransport {
    /// Create a closed transport for `params`
    pub fn new(params: ConnectionParams) -> Self {
        Self {
            params,
            writer: Mutex::new(None),
            reader: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn is_open(&self) -> bool {
        self.writer.lock().is_some()
    }

    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        available_ports()
    }

    fn open_port(&self) -> Result<Box<dyn serialport::SerialPort>, TransportError> {
        let failed = |reason: String| TransportError::FailedToOpen {
            port: self.params.port.clone(),
            reason,
        };

        self.params.validate().map_err(|e| failed(e.to_string()))?;

        let builder = serialport::new(&self.params.port, self.params.baud_rate)
            .timeout(self.params.read_timeout())
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(if self.params.hardware_handshaking {
                serialport::FlowControl::Hardware
            } else {
                serialport::FlowControl::None
            });

        builder.open().map_err(|e| {
            tracing::warn!("Failed to open serial port {}: {}", self.params.port, e);
            failed(e.to_string())
        })
    }
}

impl LineTransport for SerialTransport {
    fn open(&self, handler: LineHandler) -> Result<(), TransportError> {
        let mut writer = self.writer.lock();
        if writer.is_some() {
            return Err(TransportError::AlreadyOpen);
        }

        let port = self.open_port()?;
        let reader_port = port.try_clone().map_err(|e| TransportError::FailedToOpen {
            port: self.params.port.clone(),
            reason: format!("Failed to clone port handle: {}", e),
        })?;

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let port_name = self.params.port.clone();
        let handle = std::thread::Builder::new()
            .name("radiora-serial-reader".to_string())
            .spawn(move || read_loop(reader_port, running, handler, port_name))
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                TransportError::Io {
                    reason: format!("Failed to spawn reader thread: {}", e),
                }
            })?;

        *writer = Some(port);
        *self.reader.lock() = Some(handle);

        tracing::info!(
            "Opened serial port {} at {} baud",
            self.params.port,
            self.params.baud_rate
        );
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut writer = self.writer.lock();
        let port = writer.as_mut().ok_or(TransportError::NotOpen)?;

        let mut data = String::with_capacity(line.len() + 1);
        data.push_str(line);
        data.push(LINE_TERMINATOR);

        port.write_all(data.as_bytes())
            .and_then(|_| port.flush())
            .map_err(|e| TransportError::WriteFailed {
                reason: e.to_string(),
            })
    }

    fn close(&self) -> Result<(), TransportError> {
        self.running.store(false, Ordering::SeqCst);
        let port = self.writer.lock().take();

        if let Some(handle) = self.reader.lock().take() {
            // The handler may close the transport from the reader thread itself
            if handle.thread().id() != std::thread::current().id() && handle.join().is_err() {
                tracing::error!("Serial reader thread for {} panicked", self.params.port);
            }
        }

        if port.is_some() {
            tracing::info!("Closed serial port {}", self.params.port);
        }
        Ok(())
    }

    fn name(&self) -> String {
        format!("serial:{}", self.params.port)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn read_loop(
    mut port: Box<dyn serialport::SerialPort>,
    running: Arc<AtomicBool>,
    handler: LineHandler,
    port_name: String,
) {
    let mut assembler = LineAssembler::new();
    let mut buf = [0u8; READ_BUFFER_SIZE];

    while running.load(Ordering::SeqCst) {
        match port.read(&mut buf) {
            Ok(0) => continue,
            Ok(n) => {
                for line in assembler.push(&buf[..n]) {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    tracing::trace!("RX {}", line);
                    handler(line);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => continue,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::error!("Serial read error on {}: {}", port_name, e);
                break;
            }
        }
    }

    tracing::debug!("Serial reader for {} exiting", port_name);
}
