//! Luxguard Firmware — Main Entry Point
//!
//! Hexagonal architecture with three long-lived tasks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   UartSerial     NvsErrorLog   Esp32Time      │
//! │  (LightPort)       (SerialPort)   (ErrorLog)    (Clock+System) │
//! │  SerialEventSink + LogEventSink (EventSink)                    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        ChannelSupervisor (pure logic, shared)          │    │
//! │  │  Intensity gating · Safety limits · Alarm latching     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  uart-rx task ─▶ FRAME_CHANNEL ─▶ CommandEngine (main task)    │
//! │  refresh task ─▶ RefreshLoop ─▶ alarm events                   │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use log::info;

use luxguard::adapters::error_log::NvsErrorLog;
use luxguard::adapters::hardware::HardwareAdapter;
use luxguard::adapters::log_sink::LogEventSink;
use luxguard::adapters::nvs::NvsAdapter;
use luxguard::adapters::rpc_adapter::SerialEventSink;
use luxguard::adapters::time::{Esp32TimeAdapter, ThreadDelay};
use luxguard::adapters::uart::UartSerial;
use luxguard::app::refresh::RefreshLoop;
use luxguard::app::supervisor::{ChannelSupervisor, SharedSupervisor};
use luxguard::config::SystemConfig;
use luxguard::drivers::hw_init;
use luxguard::rpc::channels::{FRAME_CHANNEL, FrameProducer};
use luxguard::rpc::engine::CommandEngine;
use luxguard::rpc::router::CommandRouter;

/// RX poll chunk and timeout. Short enough that a line is framed
/// promptly, long enough that the task mostly sleeps in the driver.
const RX_CHUNK: usize = 64;
const RX_POLL_MS: u32 = 20;

const REFRESH_STACK: usize = 8 * 1024;
const RX_STACK: usize = 4 * 1024;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Luxguard v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration ──────────────────────────────────────
    let config = SystemConfig::default();
    config.validate().context("invalid built-in configuration")?;
    info!(
        "Limits: current {}–{} mA, temperature {}–{} °C",
        config.current_min_ma, config.current_max_ma, config.temp_min_c, config.temp_max_c
    );

    // ── 3. Peripherals ────────────────────────────────────────
    // Lights come up dark: LEDC channels are configured with duty 0 and
    // the supervisor commands 0 again on construction.
    hw_init::init_peripherals().context("HAL init failed")?;

    // ── 4. Persistent error log ───────────────────────────────
    let nvs = NvsAdapter::new().context("NVS init failed")?;
    let error_log = NvsErrorLog::new(nvs);

    // ── 5. Domain core ────────────────────────────────────────
    let supervisor = ChannelSupervisor::new(
        &config,
        HardwareAdapter::new(),
        error_log,
        Esp32TimeAdapter::new(),
    );
    let shared = SharedSupervisor::new(supervisor);
    let uart = Arc::new(UartSerial::new());

    // ── 6. Refresh task ───────────────────────────────────────
    {
        let shared = shared.clone();
        let mut sink = (
            SerialEventSink::new(Arc::clone(&uart), config.tx_timeout_ms),
            LogEventSink::new(),
        );
        let refresh = RefreshLoop::new(config.refresh_interval_ms);
        thread::Builder::new()
            .name("refresh".into())
            .stack_size(REFRESH_STACK)
            .spawn(move || refresh.run(&shared, &mut sink, &mut ThreadDelay))
            .context("spawn refresh task")?;
    }

    // ── 7. UART receive task ──────────────────────────────────
    {
        let uart = Arc::clone(&uart);
        thread::Builder::new()
            .name("uart-rx".into())
            .stack_size(RX_STACK)
            .spawn(move || {
                let mut producer = FrameProducer::new(&FRAME_CHANNEL);
                let mut buf = [0u8; RX_CHUNK];
                loop {
                    let n = uart.receive(&mut buf, RX_POLL_MS);
                    producer.on_bytes(&buf[..n]);
                }
            })
            .context("spawn uart-rx task")?;
    }

    // ── 8. Command engine (this task, never returns) ──────────
    let router = CommandRouter::new(
        shared,
        Esp32TimeAdapter::new(),
        usize::from(config.error_log_read_max),
    );
    let engine = CommandEngine::new(router, uart, &config);
    info!("Ready");
    engine.run(&FRAME_CHANNEL, &mut ThreadDelay)
}
