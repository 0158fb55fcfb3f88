//! Test rig for integration tests.
//!
//! Wires the real host-simulation adapters (lights, error log) to
//! recording doubles for the serial link, system control and clock, so
//! tests can drive the full line → engine → supervisor → reply path and
//! assert on exactly what went out on the wire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use serde_json::Value;

use luxguard::adapters::error_log::NvsErrorLog;
use luxguard::adapters::hardware::HardwareAdapter;
use luxguard::adapters::nvs::NvsAdapter;
use luxguard::app::events::AlarmEvent;
use luxguard::app::ports::{Clock, EventSink, SerialPort, SystemPort};
use luxguard::app::refresh::RefreshLoop;
use luxguard::app::supervisor::{ChannelSupervisor, SharedSupervisor};
use luxguard::channel::{ChannelId, SensorReading};
use luxguard::config::SystemConfig;
use luxguard::error::HalError;
use luxguard::rpc::engine::{CommandEngine, Handled};
use luxguard::rpc::router::CommandRouter;

// ── Journal: ordered record of externally visible effects ─────

#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Tx(Value),
    Restart,
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Trace>>>);

#[allow(dead_code)]
impl Journal {
    fn push(&self, t: Trace) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(t);
    }

    pub fn take(&self) -> Vec<Trace> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Every transmitted frame so far, parsed.
    pub fn frames(&self) -> Vec<Value> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|t| match t {
                Trace::Tx(v) => Some(v.clone()),
                Trace::Restart => None,
            })
            .collect()
    }
}

// ── Serial ────────────────────────────────────────────────────

/// Parses every transmitted frame into the journal.
#[derive(Clone)]
pub struct RecordingSerial {
    journal: Journal,
    fail: Arc<Mutex<Option<HalError>>>,
}

#[allow(dead_code)]
impl RecordingSerial {
    pub fn fail_with(&self, e: Option<HalError>) {
        *self.fail.lock().unwrap_or_else(PoisonError::into_inner) = e;
    }
}

impl SerialPort for RecordingSerial {
    fn transmit(&self, bytes: &[u8], _timeout_ms: u32) -> Result<(), HalError> {
        if let Some(e) = *self.fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(e);
        }
        assert_eq!(bytes.last(), Some(&b'\n'), "frames are newline-terminated");
        assert!(bytes.len() <= 512, "frame of {} bytes", bytes.len());
        let value = serde_json::from_slice(bytes).expect("frame is valid JSON");
        self.journal.push(Trace::Tx(value));
        Ok(())
    }
}

// ── System + clock ────────────────────────────────────────────

pub struct RecordingSystem {
    journal: Journal,
    clock: TestClock,
}

impl SystemPort for RecordingSystem {
    fn uptime_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn restart(&self) {
        self.journal.push(Trace::Restart);
    }
}

/// Manually advanced uptime.
#[derive(Clone, Default)]
pub struct TestClock(Arc<AtomicU64>);

impl TestClock {
    pub fn set(&self, ms: u64) {
        self.0.store(ms, Ordering::SeqCst);
    }
}

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Records requested delays instead of sleeping.
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ms += u64::from(ns) / 1_000_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += u64::from(ms);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct EventRecorder {
    pub events: Vec<AlarmEvent>,
}

impl EventSink for EventRecorder {
    fn emit(&mut self, event: &AlarmEvent) {
        self.events.push(*event);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Shared = SharedSupervisor<HardwareAdapter, NvsErrorLog<NvsAdapter>, TestClock>;
pub type Engine = CommandEngine<
    HardwareAdapter,
    NvsErrorLog<NvsAdapter>,
    TestClock,
    RecordingSystem,
    RecordingSerial,
>;

pub struct Rig {
    pub engine: Engine,
    pub shared: Shared,
    pub journal: Journal,
    pub serial: RecordingSerial,
    pub clock: TestClock,
    pub refresh: RefreshLoop,
    pub delay: NoDelay,
}

pub fn ch(n: u8) -> ChannelId {
    ChannelId::new(n).unwrap()
}

pub const NOMINAL: SensorReading = SensorReading::new(20.0, 40.0);

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        let journal = Journal::default();
        let clock = TestClock::default();
        let serial = RecordingSerial {
            journal: journal.clone(),
            fail: Arc::default(),
        };

        let mut hw = HardwareAdapter::new();
        for id in ChannelId::ALL {
            hw.sim_set_reading(id, NOMINAL);
        }
        let log = NvsErrorLog::new(NvsAdapter::new().unwrap());
        let shared = SharedSupervisor::new(ChannelSupervisor::new(
            &config,
            hw,
            log,
            clock.clone(),
        ));

        let system = RecordingSystem {
            journal: journal.clone(),
            clock: clock.clone(),
        };
        let router = CommandRouter::new(
            shared.clone(),
            system,
            usize::from(config.error_log_read_max),
        );
        let engine = CommandEngine::new(router, serial.clone(), &config);

        Self {
            engine,
            shared,
            journal,
            serial,
            clock,
            refresh: RefreshLoop::new(config.refresh_interval_ms),
            delay: NoDelay::default(),
        }
    }

    /// A second engine over the same supervisor, transmitting on `serial`.
    pub fn engine_on<T: SerialPort>(
        &self,
        serial: T,
    ) -> CommandEngine<HardwareAdapter, NvsErrorLog<NvsAdapter>, TestClock, RecordingSystem, T>
    {
        let config = SystemConfig::default();
        let system = RecordingSystem {
            journal: self.journal.clone(),
            clock: self.clock.clone(),
        };
        let router = CommandRouter::new(
            self.shared.clone(),
            system,
            usize::from(config.error_log_read_max),
        );
        CommandEngine::new(router, serial, &config)
    }

    /// Feed one raw line through the engine.
    pub fn line(&mut self, line: &str) -> Handled {
        self.engine.handle_line(line.as_bytes(), &mut self.delay)
    }

    /// Send a command and return the full response envelope.
    pub fn call(&mut self, topic: &str, action: &str, data: Value) -> Value {
        let req = serde_json::json!({
            "type": "cmd",
            "id": "t",
            "topic": topic,
            "action": action,
            "data": data,
        });
        let before = self.journal.frames().len();
        assert_eq!(self.line(&req.to_string()), Handled::Replied);
        let frames = self.journal.frames();
        assert_eq!(frames.len(), before + 1, "exactly one reply per command");
        frames[before].clone()
    }

    /// Status string of the reply to a command.
    pub fn status(&mut self, topic: &str, action: &str, data: Value) -> String {
        let resp = self.call(topic, action, data);
        resp["data"]["status"].as_str().unwrap().to_owned()
    }

    pub fn set_reading(&self, id: ChannelId, reading: SensorReading) {
        self.shared
            .with(|s| s.hardware_mut().sim_set_reading(id, reading));
    }

    pub fn duty(&self, id: ChannelId) -> u8 {
        self.shared.with(|s| s.hardware().sim_duty(id))
    }

    /// One refresh tick into `sink`.
    pub fn tick(&mut self, sink: &mut impl EventSink) -> usize {
        self.refresh.tick(&self.shared, sink)
    }
}
