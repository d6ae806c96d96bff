//! In-process transport for tests and simulation

use super::{LineAssembler, LineHandler, LineTransport};
use parking_lot::Mutex;
use radiora_core::{Feedback, TransportError};

/// Transport that records written lines and delivers injected ones
///
/// Injected lines are delivered on the caller's thread while an internal
/// lock is held, so the handler must not call back into this transport.
#[derive(Default)]
pub struct MemoryTransport {
    handler: Mutex<Option<LineHandler>>,
    written: Mutex<Vec<String>>,
    assembler: Mutex<LineAssembler>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.handler.lock().is_some()
    }

    /// Deliver `line` as if the bridge had sent it.
    ///
    /// Returns `false` when the transport is closed and the line was dropped.
    pub fn inject_line(&self, line: &str) -> bool {
        let handler = self.handler.lock();
        match handler.as_ref() {
            Some(handler) => {
                handler(line.to_string());
                true
            }
            None => {
                tracing::debug!("Dropping injected line on closed transport: {}", line);
                false
            }
        }
    }

    /// Deliver the wire form of `feedback`
    pub fn inject_feedback(&self, feedback: &Feedback) -> bool {
        self.inject_line(&feedback.to_string())
    }

    /// Deliver raw bytes, split into lines the same way a serial port is.
    ///
    /// Returns the number of complete lines delivered.
    pub fn inject_bytes(&self, bytes: &[u8]) -> usize {
        let lines = self.assembler.lock().push(bytes);
        lines.iter().filter(|line| self.inject_line(line)).count()
    }

    /// Every line written so far, without terminators
    pub fn written_lines(&self) -> Vec<String> {
        self.written.lock().clone()
    }

    /// Drain the written lines
    pub fn take_written(&self) -> Vec<String> {
        std::mem::take(&mut *self.written.lock())
    }
}

impl LineTransport for MemoryTransport {
    fn open(&self, handler: LineHandler) -> Result<(), TransportError> {
        let mut slot = self.handler.lock();
        if slot.is_some() {
            return Err(TransportError::AlreadyOpen);
        }
        *slot = Some(handler);
        Ok(())
    }

    fn write_line(&self, line: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::NotOpen);
        }
        self.written.lock().push(line.to_string());
        Ok(())
    }

    fn close(&self) -> Result<(), TransportError> {
        self.handler.lock().take();
        self.assembler.lock().clear();
        Ok(())
    }

    fn name(&self) -> String {
        "memory".to_string()
    }
}
