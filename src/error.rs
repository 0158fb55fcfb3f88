//! Unified error types for the light controller firmware.
//!
//! A single `Error` enum names every way a command can be rejected.
//! Hardware collaborators report the narrower [`HalError`], which converts
//! into the taxonomy with `?`. All variants are `Copy` so they can be
//! passed through the supervisor and router without allocation.

use core::fmt;

use crate::rpc::wire::Status;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible core operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Channel id outside 1–3.
    InvalidChannel,
    /// Value out of domain or a required field is missing.
    InvalidParameter,
    /// Unknown topic or action.
    InvalidCommand,
    /// Actuation blocked by a latched alarm.
    AlarmActive,
    /// Clear request denied, the fault condition persists.
    AlarmStillActive,
    /// Underlying hardware call failed.
    DeviceError,
    /// Bounded wait exceeded.
    Timeout,
    /// Transmit path already in use.
    Busy,
}

impl Error {
    /// Wire status reported to the remote client for this error.
    pub const fn status(self) -> Status {
        match self {
            Self::InvalidChannel | Self::InvalidParameter => Status::InvalidParameter,
            Self::InvalidCommand => Status::InvalidCommand,
            Self::AlarmActive => Status::AlarmActive,
            Self::AlarmStillActive => Status::Error,
            Self::DeviceError | Self::Timeout | Self::Busy => Status::DeviceError,
        }
    }

    /// Human-readable message carried in error responses.
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidChannel => "invalid light id",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidCommand => "unknown command",
            Self::AlarmActive => "light has an active alarm",
            Self::AlarmStillActive => "alarm condition still present",
            Self::DeviceError => "device error",
            Self::Timeout => "device timeout",
            Self::Busy => "device busy",
        }
    }

    /// Transient hardware conditions a caller may retry.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Busy)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ---------------------------------------------------------------------------
// Hardware errors
// ---------------------------------------------------------------------------

/// Failure reported by a hardware collaborator (PWM, ADC, UART).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalError {
    /// The peripheral call returned an error.
    Device,
    /// The peripheral did not complete within its timeout.
    Timeout,
    /// The peripheral is in use by another task.
    Busy,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => write!(f, "peripheral error"),
            Self::Timeout => write!(f, "peripheral timeout"),
            Self::Busy => write!(f, "peripheral busy"),
        }
    }
}

impl From<HalError> for Error {
    fn from(e: HalError) -> Self {
        match e {
            HalError::Device => Self::DeviceError,
            HalError::Timeout => Self::Timeout,
            HalError::Busy => Self::Busy,
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
