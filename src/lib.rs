//! Luxguard firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod channel;
pub mod config;
pub mod error;
pub mod rpc;
pub mod safety;

pub mod pins;

// Hardware-facing modules; each carries a host simulation so the crate
// builds and tests off-target.
pub mod adapters;
pub mod drivers;
pub mod sensors;

mod esp_link_shims;
