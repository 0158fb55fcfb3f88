//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the safety rules for the light controller: the
//! channel supervisor, alarm latching and the periodic refresh loop.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod refresh;
pub mod supervisor;
