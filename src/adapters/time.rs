//! ESP32 time and system adapter.
//!
//! Provides monotonic uptime, the device restart hook and a blocking
//! delay for the periodic tasks.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic)
//!   and `esp_restart()`.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant`; a
//!   restart is only recorded so tests can observe it.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
#[cfg(not(target_os = "espidf"))]
use log::info;

use crate::app::ports::{Clock, SystemPort};

/// Time adapter for the ESP32-S3 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    restarts: AtomicU32,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            restarts: AtomicU32::new(0),
        }
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic, wraps at `u64::MAX`).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Number of restarts requested so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_restarts(&self) -> u32 {
        self.restarts.load(Ordering::Acquire)
    }
}

impl Clock for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }
}

impl SystemPort for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u64 {
        self.uptime_us() / 1000
    }

    #[cfg(target_os = "espidf")]
    fn restart(&self) {
        // SAFETY: esp_restart() never returns; pending UART output was
        // flushed by the caller.
        unsafe { esp_idf_svc::sys::esp_restart() };
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::AcqRel);
        info!("restart(sim): requested");
    }
}

/// Blocking delay that yields the calling thread (a FreeRTOS task on
/// ESP-IDF) instead of busy-waiting.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl DelayNs for ThreadDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
