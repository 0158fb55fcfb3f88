//! Typed commands.
//!
//! `(topic, action)` strings are resolved once into a [`Route`]; the
//! route then decides which `data` keys are required and yields a
//! [`Command`]. Dispatch downstream is a plain `match` on the enum.
//!
//! | Failure | Error |
//! |---------|-------|
//! | unknown topic, unknown action | `InvalidCommand` |
//! | missing / wrong-typed / out-of-range value | `InvalidParameter` |
//! | channel id outside 1–3 | `InvalidChannel` |

use heapless::Vec as HVec;
use serde_json::Value;

use crate::channel::{CHANNEL_COUNT, ChannelId};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Routing table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightAction {
    Set,
    SetAll,
    Get,
    GetAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    GetSensors,
    GetAllSensors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemAction {
    Ping,
    Reset,
    Info,
    GetErrorCount,
    GetErrorLog,
    ClearErrorLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    Status,
    Clear,
}

/// A resolved `(topic, action)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Light(LightAction),
    Status(StatusAction),
    System(SystemAction),
    Alarm(AlarmAction),
}

impl Route {
    pub fn resolve(topic: &str, action: &str) -> Result<Self> {
        let route = match topic {
            "light" => Self::Light(match action {
                "set" => LightAction::Set,
                "set_all" => LightAction::SetAll,
                "get" => LightAction::Get,
                "get_all" => LightAction::GetAll,
                _ => return Err(Error::InvalidCommand),
            }),
            "status" => Self::Status(match action {
                "get_sensors" => StatusAction::GetSensors,
                "get_all_sensors" => StatusAction::GetAllSensors,
                _ => return Err(Error::InvalidCommand),
            }),
            "system" => Self::System(match action {
                "ping" => SystemAction::Ping,
                "reset" => SystemAction::Reset,
                "info" => SystemAction::Info,
                "get_error_count" => SystemAction::GetErrorCount,
                "get_error_log" => SystemAction::GetErrorLog,
                "clear_error_log" => SystemAction::ClearErrorLog,
                _ => return Err(Error::InvalidCommand),
            }),
            "alarm" => Self::Alarm(match action {
                "status" => AlarmAction::Status,
                "clear" => AlarmAction::Clear,
                _ => return Err(Error::InvalidCommand),
            }),
            _ => return Err(Error::InvalidCommand),
        };
        Ok(route)
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A fully validated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetIntensity { id: ChannelId, intensity: u8 },
    SetAll([u8; CHANNEL_COUNT]),
    GetIntensity(ChannelId),
    GetAllIntensities,
    GetSensors(ChannelId),
    GetAllSensors,
    Ping,
    Reset,
    Info,
    GetErrorCount,
    /// Already clamped to the configured read maximum.
    GetErrorLog { count: usize },
    ClearErrorLog,
    AlarmStatus,
    ClearAlarm(HVec<ChannelId, CHANNEL_COUNT>),
}

impl Command {
    /// Build a command from a route and its `data` object.
    ///
    /// `log_read_max` is both the default and the upper bound for
    /// `system.get_error_log`'s `count`.
    pub fn parse(route: Route, data: &Value, log_read_max: usize) -> Result<Self> {
        let cmd = match route {
            Route::Light(LightAction::Set) => Self::SetIntensity {
                id: channel_param(data, "id")?,
                intensity: percent(data.get("intensity"))?,
            },
            Route::Light(LightAction::SetAll) => Self::SetAll(intensities(data)?),
            Route::Light(LightAction::Get) => Self::GetIntensity(channel_param(data, "id")?),
            Route::Light(LightAction::GetAll) => Self::GetAllIntensities,
            Route::Status(StatusAction::GetSensors) => {
                Self::GetSensors(channel_param(data, "id")?)
            }
            Route::Status(StatusAction::GetAllSensors) => Self::GetAllSensors,
            Route::System(SystemAction::Ping) => Self::Ping,
            Route::System(SystemAction::Reset) => Self::Reset,
            Route::System(SystemAction::Info) => Self::Info,
            Route::System(SystemAction::GetErrorCount) => Self::GetErrorCount,
            Route::System(SystemAction::GetErrorLog) => Self::GetErrorLog {
                count: log_count(data, log_read_max)?,
            },
            Route::System(SystemAction::ClearErrorLog) => Self::ClearErrorLog,
            Route::Alarm(AlarmAction::Status) => Self::AlarmStatus,
            Route::Alarm(AlarmAction::Clear) => Self::ClearAlarm(clear_targets(data)?),
        };
        Ok(cmd)
    }
}

// ---------------------------------------------------------------------------
// Parameter extraction
// ---------------------------------------------------------------------------

fn channel(v: Option<&Value>) -> Result<ChannelId> {
    let raw = v.and_then(Value::as_i64).ok_or(Error::InvalidParameter)?;
    u8::try_from(raw)
        .map_err(|_| Error::InvalidChannel)
        .and_then(ChannelId::new)
}

fn channel_param(data: &Value, key: &str) -> Result<ChannelId> {
    channel(data.get(key))
}

/// 0–255 here; the supervisor enforces the 100 % ceiling.
fn percent(v: Option<&Value>) -> Result<u8> {
    let raw = v.and_then(Value::as_i64).ok_or(Error::InvalidParameter)?;
    u8::try_from(raw).map_err(|_| Error::InvalidParameter)
}

fn intensities(data: &Value) -> Result<[u8; CHANNEL_COUNT]> {
    let list = data
        .get("intensities")
        .and_then(Value::as_array)
        .ok_or(Error::InvalidParameter)?;
    if list.len() != CHANNEL_COUNT {
        return Err(Error::InvalidParameter);
    }
    let mut out = [0u8; CHANNEL_COUNT];
    for (slot, v) in out.iter_mut().zip(list) {
        *slot = percent(Some(v))?;
    }
    Ok(out)
}

fn log_count(data: &Value, max: usize) -> Result<usize> {
    match data.get("count") {
        None | Some(Value::Null) => Ok(max),
        Some(v) => {
            let n = v.as_u64().ok_or(Error::InvalidParameter)?;
            Ok(usize::try_from(n).map_or(max, |n| n.min(max)))
        }
    }
}

/// `{"id":n}` or a non-empty `{"lights":[...]}` of at most three ids.
fn clear_targets(data: &Value) -> Result<HVec<ChannelId, CHANNEL_COUNT>> {
    let mut targets = HVec::new();
    if let Some(lights) = data.get("lights") {
        let list = lights.as_array().ok_or(Error::InvalidParameter)?;
        if list.is_empty() || list.len() > CHANNEL_COUNT {
            return Err(Error::InvalidParameter);
        }
        for v in list {
            let id = channel(Some(v))?;
            if !targets.contains(&id) {
                targets.push(id).map_err(|_| Error::InvalidParameter)?;
            }
        }
    } else {
        targets
            .push(channel_param(data, "id")?)
            .map_err(|_| Error::InvalidParameter)?;
    }
    Ok(targets)
}
