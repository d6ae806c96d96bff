//! Line transports
//!
//! The bridge speaks whole ASCII lines terminated by `\r`. A transport
//! delivers each received line, terminator stripped, to a handler on its own
//! thread, and writes outbound lines with the terminator appended.

mod memory;
mod serial;

pub use memory::MemoryTransport;
pub use serial::SerialTransport;

use radiora_core::TransportError;
use std::sync::Arc;

/// Line terminator in both directions
pub const LINE_TERMINATOR: char = '\r';

/// Receives each complete inbound line
pub type LineHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Bidirectional line-oriented link to the bridge
pub trait LineTransport: Send + Sync {
    /// Begin delivering received lines to `handler`
    fn open(&self, handler: LineHandler) -> Result<(), TransportError>;

    /// Write one line; the terminator is appended
    fn write_line(&self, line: &str) -> Result<(), TransportError>;

    /// Stop delivering lines.
    ///
    /// Once this returns the handler is not called again.
    fn close(&self) -> Result<(), TransportError>;

    /// Human readable name for logging
    fn name(&self) -> String;
}

/// Splits a byte stream into `\r`-terminated lines
///
/// Stray `\n` bytes are dropped so bridges configured for CRLF still work.
/// Bytes outside ASCII are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes, returning every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in bytes {
            match byte {
                b'\r' => lines.push(std::mem::take(&mut self.buffer)),
                b'\n' => {}
                b if b.is_ascii() => self.buffer.push(char::from(b)),
                b => {
                    tracing::warn!("Non-ASCII byte 0x{:02X} in received line, replaced", b);
                    self.buffer.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
        lines
    }

    /// Bytes received since the last terminator
    pub fn partial(&self) -> &str {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_split_across_pushes() {
        let mut assembler = LineAssembler::new();
        assert!(assembler.push(b"LZC,1,").is_empty());
        assert_eq!(assembler.partial(), "LZC,1,");
        assert_eq!(assembler.push(b"ON\r!\r"), vec!["LZC,1,ON", "!"]);
        assert_eq!(assembler.partial(), "");
    }

    #[test]
    fn test_newlines_ignored_and_empty_lines_kept() {
        let mut assembler = LineAssembler::new();
        assert_eq!(assembler.push(b"!\r\n\r\nCWU,3\r"), vec!["!", "", "CWU,3"]);
    }

    #[test]
    fn test_non_ascii_bytes_replaced() {
        let mut assembler = LineAssembler::new();
        assert_eq!(
            assembler.push(b"LZC,1,\xE9N\r"),
            vec!["LZC,1,\u{FFFD}N"]
        );
        assert_eq!(assembler.push(b"\xFF\r"), vec!["\u{FFFD}"]);
    }
}
