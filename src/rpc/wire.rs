//! JSON wire format.
//!
//! ```text
//! → {"type":"cmd","id":"42","topic":"light","action":"set","data":{"id":2,"intensity":75}}
//! ← {"type":"resp","id":"42","topic":"light","action":"set","data":{"status":"ok"}}
//! ← {"type":"event","id":"evt-1","topic":"alarm","action":"triggered","data":{...}}
//! ```
//!
//! Inbound lines are parsed into a [`Request`]; anything that is not a
//! JSON object with `"type":"cmd"` yields `None` and is dropped without
//! a reply. Outbound messages are built as typed [`Reply`] values and
//! serialised in one pass, then size-checked against [`MAX_FRAME_SIZE`].
//! List payloads that do not fit lose trailing elements and carry
//! `"truncated":true`.

use core::fmt::Write as _;

use heapless::String as HString;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::events::{AlarmEvent, ErrorLogEntry, LogAction};
use crate::channel::{AlarmKind, CHANNEL_COUNT, ChannelId, SensorReading};
use crate::error::Error;

/// Largest outbound frame, trailing `\n` included.
pub const MAX_FRAME_SIZE: usize = 512;

/// Longest echoed topic / action. Longer values are cut.
pub const MAX_FIELD_LEN: usize = 32;

/// Longest echoed message id; room for a UUID with margin.
pub const MAX_ID_LEN: usize = 64;

/// Id echoed when a request carries none.
pub const UNKNOWN_ID: &str = "unknown";

pub type Field = HString<MAX_FIELD_LEN>;

pub type MessageId = HString<MAX_ID_LEN>;

/// One encoded, newline-terminated outbound frame.
pub type OutFrame = heapless::Vec<u8, MAX_FRAME_SIZE>;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// `data.status` of every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Error,
    InvalidCommand,
    InvalidParameter,
    DeviceError,
    AlarmActive,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Parsed command envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: MessageId,
    pub topic: Field,
    pub action: Field,
    /// `data` object, `Value::Null` when absent.
    pub data: Value,
}

/// Parse one inbound line.
///
/// Returns `None` for anything that is not a JSON object whose `type` is
/// `"cmd"`. A missing or non-string `topic`/`action` still yields a
/// request (it will be answered with `invalid_command`); a missing id is
/// echoed as `"unknown"`, a numeric id as its decimal text.
pub fn parse_request(line: &[u8]) -> Option<Request> {
    let Value::Object(mut obj) = serde_json::from_slice::<Value>(line).ok()? else {
        return None;
    };
    if obj.get("type").and_then(Value::as_str) != Some("cmd") {
        return None;
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => bounded(s),
        Some(Value::Number(n)) => {
            let mut f = MessageId::new();
            let _ = write!(f, "{}", n);
            f
        }
        _ => bounded(UNKNOWN_ID),
    };
    let topic = bounded(obj.get("topic").and_then(Value::as_str).unwrap_or(""));
    let action = bounded(obj.get("action").and_then(Value::as_str).unwrap_or(""));
    let data = obj.remove("data").unwrap_or(Value::Null);

    Some(Request {
        id,
        topic,
        action,
        data,
    })
}

/// Copy at most `N` bytes, cut on a char boundary.
fn bounded<const N: usize>(s: &str) -> HString<N> {
    let mut out = HString::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Reply payloads
// ---------------------------------------------------------------------------

/// Route-specific part of a response's `data` object.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Intensity { id: ChannelId, intensity: u8 },
    Intensities([u8; CHANNEL_COUNT]),
    Sensor { id: ChannelId, reading: SensorReading },
    Sensors(Vec<(ChannelId, SensorReading)>),
    Info { uptime_ms: u64 },
    Count(usize),
    ErrorLog(Vec<ErrorLogEntry>),
    Alarms(Vec<(ChannelId, AlarmKind)>),
    Cleared(Vec<ChannelId>),
}

impl Payload {
    /// Drop the last list element. Returns `false` when nothing is left
    /// to drop.
    fn shrink(&mut self) -> bool {
        match self {
            Self::Sensors(v) => v.pop().is_some(),
            Self::ErrorLog(v) => v.pop().is_some(),
            Self::Alarms(v) => v.pop().is_some(),
            _ => false,
        }
    }
}

/// The `data` object of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub message: Option<&'static str>,
    pub payload: Payload,
    pub truncated: bool,
}

impl Reply {
    pub fn ok(payload: Payload) -> Self {
        Self {
            status: Status::Ok,
            message: None,
            payload,
            truncated: false,
        }
    }

    pub fn ok_message(message: &'static str) -> Self {
        Self {
            message: Some(message),
            ..Self::ok(Payload::Empty)
        }
    }

    pub fn error(err: Error) -> Self {
        Self {
            status: err.status(),
            message: Some(err.message()),
            payload: Payload::Empty,
            truncated: false,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

struct SourceName(ChannelId);

impl Serialize for SourceName {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&self.0)
    }
}

struct Uptime(u64);

impl Serialize for Uptime {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_uptime(self.0))
    }
}

#[derive(Serialize)]
struct SensorView {
    id: u8,
    current: f32,
    temperature: f32,
}

impl SensorView {
    fn new(id: ChannelId, r: &SensorReading) -> Self {
        Self {
            id: id.get(),
            current: r.current_ma,
            temperature: r.temperature_c,
        }
    }
}

#[derive(Serialize)]
struct AlarmView {
    source: SourceName,
    code: AlarmKind,
}

#[derive(Serialize)]
struct LogEntryView {
    timestamp: Uptime,
    source: String,
    code: AlarmKind,
    value: f32,
    action: LogAction,
}

impl From<&ErrorLogEntry> for LogEntryView {
    fn from(e: &ErrorLogEntry) -> Self {
        Self {
            timestamp: Uptime(e.timestamp_ms),
            source: format!("light_{}", e.channel),
            code: e.kind,
            value: e.value,
            action: e.action,
        }
    }
}

impl Serialize for Reply {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(None)?;
        map.serialize_entry("status", &self.status)?;
        if let Some(msg) = self.message {
            map.serialize_entry("message", msg)?;
        }
        match &self.payload {
            Payload::Empty => {}
            Payload::Intensity { id, intensity } => {
                map.serialize_entry("id", &id.get())?;
                map.serialize_entry("intensity", intensity)?;
            }
            Payload::Intensities(values) => {
                map.serialize_entry("intensities", values)?;
            }
            Payload::Sensor { id, reading } => {
                map.serialize_entry("id", &id.get())?;
                map.serialize_entry("current", &reading.current_ma)?;
                map.serialize_entry("temperature", &reading.temperature_c)?;
            }
            Payload::Sensors(list) => {
                let views: Vec<SensorView> =
                    list.iter().map(|(id, r)| SensorView::new(*id, r)).collect();
                map.serialize_entry("sensors", &views)?;
            }
            Payload::Info { uptime_ms } => {
                map.serialize_entry("device", env!("CARGO_PKG_NAME"))?;
                map.serialize_entry("version", env!("CARGO_PKG_VERSION"))?;
                map.serialize_entry("channels", &CHANNEL_COUNT)?;
                map.serialize_entry("uptime_ms", uptime_ms)?;
            }
            Payload::Count(n) => {
                map.serialize_entry("count", n)?;
            }
            Payload::ErrorLog(entries) => {
                let views: Vec<LogEntryView> = entries.iter().map(LogEntryView::from).collect();
                map.serialize_entry("count", &views.len())?;
                map.serialize_entry("entries", &views)?;
            }
            Payload::Alarms(list) => {
                let views: Vec<AlarmView> = list
                    .iter()
                    .map(|(id, kind)| AlarmView {
                        source: SourceName(*id),
                        code: *kind,
                    })
                    .collect();
                map.serialize_entry("alarms", &views)?;
            }
            Payload::Cleared(ids) => {
                let ids: Vec<u8> = ids.iter().map(|id| id.get()).collect();
                map.serialize_entry("cleared", &ids)?;
            }
        }
        if self.truncated {
            map.serialize_entry("truncated", &true)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Envelope encoding
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Envelope<'a, D> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    topic: &'a str,
    action: &'a str,
    data: &'a D,
}

/// Encoding failures. Only reachable for replies whose fixed part alone
/// exceeds the frame size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    Serialize,
    TooLarge,
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Serialize => write!(f, "serialization failed"),
            Self::TooLarge => write!(f, "frame exceeds {} bytes", MAX_FRAME_SIZE),
        }
    }
}

fn encode_envelope<D: Serialize>(env: &Envelope<'_, D>) -> Result<OutFrame, EncodeError> {
    let bytes = serde_json::to_vec(env).map_err(|_| EncodeError::Serialize)?;
    let mut frame = OutFrame::new();
    frame
        .extend_from_slice(&bytes)
        .map_err(|()| EncodeError::TooLarge)?;
    frame.push(b'\n').map_err(|_| EncodeError::TooLarge)?;
    Ok(frame)
}

/// Encode a response to `req`, shrinking list payloads until it fits.
pub fn encode_response(req: &Request, reply: Reply) -> Result<OutFrame, EncodeError> {
    let mut reply = reply;
    loop {
        let env = Envelope {
            kind: "resp",
            id: &req.id,
            topic: &req.topic,
            action: &req.action,
            data: &reply,
        };
        match encode_envelope(&env) {
            Err(EncodeError::TooLarge) if reply.payload.shrink() => reply.truncated = true,
            other => return other,
        }
    }
}

#[derive(Serialize)]
struct EventData {
    timestamp: Uptime,
    code: AlarmKind,
    source: SourceName,
    value: f32,
    status: LogAction,
}

/// Encode an unsolicited `alarm.triggered` event.
pub fn encode_alarm_event(event_id: &str, ev: &AlarmEvent) -> Result<OutFrame, EncodeError> {
    let data = EventData {
        timestamp: Uptime(ev.timestamp_ms),
        code: ev.kind,
        source: SourceName(ev.channel),
        value: ev.value,
        status: LogAction::Disabled,
    };
    encode_envelope(&Envelope {
        kind: "event",
        id: event_id,
        topic: "alarm",
        action: "triggered",
        data: &data,
    })
}

/// Render uptime as `HH:MM:SS.mmm`. Hours keep growing past 99.
pub fn format_uptime(ms: u64) -> String {
    let millis = ms % 1000;
    let secs = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        secs / 3600,
        (secs / 60) % 60,
        secs % 60,
        millis
    )
}
