//! Newline frame codec.
//!
//! Wire format: one UTF-8 JSON object per line.
//! ```text
//! ┌──────────────────────────┬──────────┐
//! │ JSON payload (N B)       │ \n or \r │
//! └──────────────────────────┴──────────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines
//! without their terminator. `\r\n` yields one line (the empty line
//! between the two terminators is skipped). A line longer than the
//! receive buffer is discarded up to the next terminator so a single
//! oversized message never desynchronises the stream.

/// Maximum line payload size (protects against memory exhaustion).
pub const MAX_LINE_SIZE: usize = 256;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: [u8; MAX_LINE_SIZE],
    len: usize,
    /// Set after an overflow; bytes are dropped until the next terminator.
    discarding: bool,
    dropped: u32,
}

impl LineDecoder {
    pub const fn new() -> Self {
        Self {
            buf: [0; MAX_LINE_SIZE],
            len: 0,
            discarding: false,
            dropped: 0,
        }
    }

    /// Feed one byte.
    ///
    /// Returns `Some(line)` when a terminator completes a non-empty line.
    /// The returned slice is valid until the next call to `push`.
    pub fn push(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == b'\n' || byte == b'\r' {
            let len = self.len;
            self.len = 0;
            if self.discarding {
                self.discarding = false;
                return None;
            }
            if len == 0 {
                return None;
            }
            return Some(&self.buf[..len]);
        }

        if self.discarding {
            return None;
        }
        if self.len == MAX_LINE_SIZE {
            self.discarding = true;
            self.dropped = self.dropped.wrapping_add(1);
            self.len = 0;
            log::warn!("RX line exceeds {} bytes, discarding", MAX_LINE_SIZE);
            return None;
        }
        self.buf[self.len] = byte;
        self.len += 1;
        None
    }

    /// Number of oversized lines dropped since construction.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    /// Reset decoder state (e.g. after a UART error).
    pub fn reset(&mut self) {
        self.len = 0;
        self.discarding = false;
    }
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}
