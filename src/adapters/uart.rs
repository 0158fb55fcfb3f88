//! UART adapter for the command link.
//!
//! Implements [`SerialPort`] for outbound frames and exposes a blocking
//! [`UartSerial::receive`] for the RX task. Transmits are exclusive: the
//! command engine and the refresh loop share one instance behind an
//! `Arc`, and a transmit that finds another one in flight waits for it.
//! The wait and the write together are bounded by the caller's timeout;
//! only when that expires does the transmit fail with
//! [`HalError::Timeout`].
//!
//! On non-espidf targets transmitted bytes are captured in memory and
//! received bytes come from a queue fed by `sim_push_rx`.

use core::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;
#[cfg(not(target_os = "espidf"))]
use std::sync::{Mutex, PoisonError};

use crate::app::ports::SerialPort;
#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::HalError;

/// Poll step while another frame holds the transmitter.
const TX_WAIT_STEP: Duration = Duration::from_millis(1);

pub struct UartSerial {
    tx_busy: AtomicBool,
    #[cfg(not(target_os = "espidf"))]
    sim: Mutex<SimLink>,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimLink {
    tx: Vec<u8>,
    rx: VecDeque<u8>,
    tx_fault: Option<HalError>,
}

/// Releases the transmit slot on drop.
struct TxGuard<'a>(&'a AtomicBool);

impl Drop for TxGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for UartSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl UartSerial {
    /// The driver must already be installed by `hw_init`.
    pub fn new() -> Self {
        Self {
            tx_busy: AtomicBool::new(false),
            #[cfg(not(target_os = "espidf"))]
            sim: Mutex::new(SimLink::default()),
        }
    }

    /// Take the transmit slot, waiting until `deadline` for the frame in
    /// flight to finish.
    fn claim_tx(&self, deadline: Instant) -> Result<TxGuard<'_>, HalError> {
        loop {
            if self
                .tx_busy
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(TxGuard(&self.tx_busy));
            }
            if Instant::now() >= deadline {
                return Err(HalError::Timeout);
            }
            std::thread::sleep(TX_WAIT_STEP);
        }
    }

    /// Block up to `timeout_ms` for inbound bytes; returns how many were
    /// copied into `buf` (0 on timeout).
    #[cfg(target_os = "espidf")]
    pub fn receive(&self, buf: &mut [u8], timeout_ms: u32) -> usize {
        hw_init::uart_read(buf, timeout_ms)
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn receive(&self, buf: &mut [u8], _timeout_ms: u32) -> usize {
        let mut sim = self.sim();
        let n = buf.len().min(sim.rx.len());
        for (slot, byte) in buf.iter_mut().zip(sim.rx.drain(..n)) {
            *slot = byte;
        }
        n
    }

    #[cfg(target_os = "espidf")]
    fn write_all(&self, bytes: &[u8], timeout_ms: u32) -> Result<(), HalError> {
        hw_init::uart_write(bytes, timeout_ms)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_all(&self, bytes: &[u8], _timeout_ms: u32) -> Result<(), HalError> {
        let mut sim = self.sim();
        if let Some(fault) = sim.tx_fault {
            return Err(fault);
        }
        sim.tx.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl UartSerial {
    fn sim(&self) -> std::sync::MutexGuard<'_, SimLink> {
        self.sim.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue bytes for [`receive`](Self::receive).
    pub fn sim_push_rx(&self, bytes: &[u8]) {
        self.sim().rx.extend(bytes);
    }

    /// Everything transmitted since the last call.
    pub fn sim_take_tx(&self) -> Vec<u8> {
        core::mem::take(&mut self.sim().tx)
    }

    /// Make transmits fail (or succeed again with `None`).
    pub fn sim_fail_tx(&self, fault: Option<HalError>) {
        self.sim().tx_fault = fault;
    }

    /// Hold the transmit slot as if another frame were in flight.
    pub fn sim_hold_tx(&self, held: bool) {
        self.tx_busy.store(held, Ordering::Release);
    }
}

impl SerialPort for UartSerial {
    fn transmit(&self, bytes: &[u8], timeout_ms: u32) -> Result<(), HalError> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        let _guard = self.claim_tx(deadline)?;
        let left = deadline.saturating_duration_since(Instant::now());
        self.write_all(bytes, left.as_millis() as u32)
    }
}
