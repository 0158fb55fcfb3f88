//! Command router.
//!
//! Stateless per command: resolve the route, parse the typed
//! [`Command`], run it against the shared supervisor or the system port,
//! and turn the outcome into a [`Reply`]. Every recognised envelope gets
//! exactly one reply; `system.reset` additionally asks the caller to
//! restart the device once the reply is on the wire.

use log::{debug, info, warn};

use crate::app::ports::{Clock, ErrorLogPort, LightPort, SystemPort};
use crate::app::supervisor::SharedSupervisor;
use crate::channel::ChannelId;
use crate::error::{Error, Result};

use super::command::{Command, Route};
use super::wire::{Payload, Reply, Request, Status};

/// Work the caller must do after the reply has been transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    None,
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub reply: Reply,
    pub post: PostAction,
}

impl From<Reply> for Outcome {
    fn from(reply: Reply) -> Self {
        Self {
            reply,
            post: PostAction::None,
        }
    }
}

pub struct CommandRouter<H, L, C, S> {
    supervisor: SharedSupervisor<H, L, C>,
    system: S,
    log_read_max: usize,
}

impl<H, L, C, S> CommandRouter<H, L, C, S>
where
    H: LightPort,
    L: ErrorLogPort,
    C: Clock,
    S: SystemPort,
{
    pub fn new(supervisor: SharedSupervisor<H, L, C>, system: S, log_read_max: usize) -> Self {
        Self {
            supervisor,
            system,
            log_read_max,
        }
    }

    pub fn system(&self) -> &S {
        &self.system
    }

    /// Route and execute one request.
    pub fn dispatch(&self, req: &Request) -> Outcome {
        let parsed = Route::resolve(&req.topic, &req.action)
            .and_then(|route| Command::parse(route, &req.data, self.log_read_max));

        match parsed {
            Ok(cmd) => {
                debug!("RPC[{}]: {}.{} → {:?}", req.id, req.topic, req.action, cmd);
                let outcome = self.execute(cmd);
                if outcome.reply.status != Status::Ok {
                    warn!(
                        "RPC[{}]: {}.{} failed: {:?}",
                        req.id, req.topic, req.action, outcome.reply.status
                    );
                }
                outcome
            }
            Err(e) => {
                warn!("RPC[{}]: {}.{} rejected: {}", req.id, req.topic, req.action, e);
                Reply::error(e).into()
            }
        }
    }

    /// Execute an already validated command.
    pub fn execute(&self, cmd: Command) -> Outcome {
        match cmd {
            Command::SetIntensity { id, intensity } => respond(
                self.supervisor
                    .with(|s| s.set_intensity(id, intensity))
                    .map(|()| Payload::Empty),
            ),

            Command::SetAll(values) => respond(
                self.supervisor
                    .with(|s| s.set_all_intensities(values))
                    .map(|()| Payload::Empty),
            ),

            Command::GetIntensity(id) => {
                let intensity = self.supervisor.with(|s| s.get_intensity(id));
                Reply::ok(Payload::Intensity { id, intensity }).into()
            }

            Command::GetAllIntensities => {
                let all = self.supervisor.with(|s| s.get_all_intensities());
                Reply::ok(Payload::Intensities(all)).into()
            }

            Command::GetSensors(id) => respond(
                self.supervisor
                    .with(|s| s.get_sensor_data(id))
                    .map(|reading| Payload::Sensor { id, reading }),
            ),

            Command::GetAllSensors => respond(
                self.supervisor
                    .with(|s| s.get_all_sensor_data())
                    .map(|all| Payload::Sensors(ChannelId::ALL.into_iter().zip(all).collect())),
            ),

            Command::Ping => Reply::ok_message("pong").into(),

            Command::Reset => {
                info!("Reset requested, restarting after reply");
                Outcome {
                    reply: Reply::ok_message("resetting"),
                    post: PostAction::Restart,
                }
            }

            Command::Info => Reply::ok(Payload::Info {
                uptime_ms: self.system.uptime_ms(),
            })
            .into(),

            Command::GetErrorCount => {
                let n = self.supervisor.with(|s| s.error_count());
                Reply::ok(Payload::Count(n)).into()
            }

            Command::GetErrorLog { count } => {
                let entries = self.supervisor.with(|s| s.error_log(count));
                Reply::ok(Payload::ErrorLog(entries)).into()
            }

            Command::ClearErrorLog => respond(
                self.supervisor
                    .with(|s| s.clear_error_log())
                    .map(|()| Payload::Empty),
            ),

            Command::AlarmStatus => {
                let alarms = self.supervisor.with(|s| s.get_alarm_status());
                let list = ChannelId::ALL.into_iter().zip(alarms).collect();
                Reply::ok(Payload::Alarms(list)).into()
            }

            Command::ClearAlarm(ids) => self.clear_alarms(&ids),
        }
    }

    /// Clear each requested channel independently. The reply lists the
    /// channels that were cleared and reports the first failure.
    fn clear_alarms(&self, ids: &[ChannelId]) -> Outcome {
        let mut cleared = Vec::with_capacity(ids.len());
        let mut first_err: Option<Error> = None;
        self.supervisor.with(|s| {
            for &id in ids {
                match s.clear_alarm(id) {
                    Ok(()) => cleared.push(id),
                    Err(e) => {
                        warn!("{}: clear denied: {}", id, e);
                        first_err.get_or_insert(e);
                    }
                }
            }
        });

        match first_err {
            None => Reply::ok(Payload::Cleared(cleared)).into(),
            Some(e) if cleared.is_empty() => Reply::error(e).into(),
            Some(e) => Reply::error(e).with_payload(Payload::Cleared(cleared)).into(),
        }
    }
}

fn respond(result: Result<Payload>) -> Outcome {
    match result {
        Ok(payload) => Reply::ok(payload).into(),
        Err(e) => Reply::error(e).into(),
    }
}
