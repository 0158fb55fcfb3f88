//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ChannelSupervisor / CommandRouter (domain)
//! ```
//!
//! Driven adapters (PWM + ADC, UART, error-log storage, clocks) implement
//! these traits. The [`ChannelSupervisor`](super::supervisor::ChannelSupervisor)
//! and the RPC layer consume them via generics, so the domain core never
//! touches a peripheral directly and the whole stack runs on the host.
//!
//! Every hardware call is blocking and bounded; a port that cannot finish
//! in time returns [`HalError::Timeout`] instead of hanging.

use std::sync::Arc;

use crate::channel::{ChannelId, SensorReading};
use crate::error::HalError;

use super::events::{AlarmEvent, ErrorLogEntry};

// ───────────────────────────────────────────────────────────────
// Light port (driven adapter: domain ↔ PWM + ADC)
// ───────────────────────────────────────────────────────────────

/// Per-channel actuator and sensor access.
pub trait LightPort {
    /// Command the PWM duty of one channel (0–100 %).
    fn set_channel_duty(&mut self, id: ChannelId, pct: u8) -> Result<(), HalError>;

    /// Sample current and temperature of one channel.
    fn read_channel_sensors(&mut self, id: ChannelId) -> Result<SensorReading, HalError>;
}

// ───────────────────────────────────────────────────────────────
// Serial port (driven adapter: domain → UART)
// ───────────────────────────────────────────────────────────────

/// Outbound byte transport.
///
/// Takes `&self` because the command task and the refresh loop both
/// transmit. Implementations serialise access themselves: a transmit
/// that finds another in flight waits for it, and `timeout_ms` bounds
/// the wait and the write together.
pub trait SerialPort {
    fn transmit(&self, bytes: &[u8], timeout_ms: u32) -> Result<(), HalError>;
}

impl<T: SerialPort + ?Sized> SerialPort for Arc<T> {
    fn transmit(&self, bytes: &[u8], timeout_ms: u32) -> Result<(), HalError> {
        (**self).transmit(bytes, timeout_ms)
    }
}

// ───────────────────────────────────────────────────────────────
// Error log port (driven adapter: domain ↔ persistent log)
// ───────────────────────────────────────────────────────────────

/// Append-only record of alarm transitions.
pub trait ErrorLogPort {
    /// Persist one entry. The oldest entry may be overwritten when full.
    fn append(&mut self, entry: &ErrorLogEntry) -> Result<(), StorageError>;

    /// Up to `max` entries, newest first.
    fn read(&self, max: usize) -> Vec<ErrorLogEntry>;

    /// Drop every stored entry.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Number of entries currently stored.
    fn count(&self) -> usize;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → serial / logging)
// ───────────────────────────────────────────────────────────────

/// The refresh loop emits [`AlarmEvent`]s through this port. Adapters
/// decide where they go (serial event frame, log line, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &AlarmEvent);
}

/// Fan out to two sinks, in order.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AlarmEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

// ───────────────────────────────────────────────────────────────
// Time + system control
// ───────────────────────────────────────────────────────────────

/// Monotonic uptime source.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Device-level operations invoked by `system.*` commands.
pub trait SystemPort {
    fn uptime_ms(&self) -> u64;

    /// Restart the device. Does not return on real hardware.
    fn restart(&self);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage backing the error log.
///
/// Write operations MUST be atomic: no partial writes on power loss.
/// The ESP-IDF NVS API guarantees this natively; the in-memory
/// simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] and [`ErrorLogPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Stored record failed to decode, or a record failed to encode.
    Corrupted,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Corrupted => write!(f, "record corrupted"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for StorageError {}
