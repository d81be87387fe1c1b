use anyhow::{Context, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, thread, time::Duration};
use thiserror::Error;
use tracing::{debug, info, warn};

use playback::{
    apply_command, CommandOutcome, DecodedMedia, EditorSession, EngineConfig, PlayableResource,
    SessionCommand, SessionSnapshot, TickOutcome,
};
use timeline::ElementId;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("engine stopped")]
    Stopped,
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),
}

/// Messages accepted by the engine thread.
pub enum RuntimeCommand {
    Apply(SessionCommand),
    MediaDecoded {
        media: DecodedMedia,
        resource: Option<Box<dyn PlayableResource>>,
        reply: Sender<ElementId>,
    },
    Shutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    Applied {
        command: SessionCommand,
        outcome: CommandOutcome,
    },
    Rejected {
        command: SessionCommand,
        error: String,
    },
    Ticked {
        outcome: TickOutcome,
        time: f64,
    },
    Stopped,
}

#[derive(Clone)]
pub struct EngineHandle {
    tx_commands: Sender<RuntimeCommand>,
    pub rx_events: Receiver<EngineEvent>,
    latest: Arc<Mutex<SessionSnapshot>>,
    worker: Arc<Mutex<Option<thread::JoinHandle<()>>>>,
    reply_timeout: Duration,
}

/// Owns an [`EditorSession`] on a dedicated thread and drives its clock
/// from a wall-clock ticker.
pub struct EngineRuntime {
    session: EditorSession,
    rx_commands: Receiver<RuntimeCommand>,
    tx_events: Sender<EngineEvent>,
    latest: Arc<Mutex<SessionSnapshot>>,
}

impl EngineRuntime {
    pub fn start(config: EngineConfig) -> Result<EngineHandle> {
        config.validate().context("engine config")?;
        let tick_interval = config.tick_interval();
        let (tx_commands, rx_commands) = unbounded::<RuntimeCommand>();
        let (tx_events, rx_events) = unbounded::<EngineEvent>();

        let session = EditorSession::new(config);
        let latest = Arc::new(Mutex::new(session.snapshot()));
        let runtime = EngineRuntime {
            session,
            rx_commands,
            tx_events,
            latest: latest.clone(),
        };

        let worker = thread::Builder::new()
            .name("timeline-engine".to_string())
            .spawn(move || runtime.run(tick_interval))
            .context("spawn engine thread")?;
        info!(?tick_interval, "engine started");

        Ok(EngineHandle {
            tx_commands,
            rx_events,
            latest,
            worker: Arc::new(Mutex::new(Some(worker))),
            reply_timeout: Duration::from_secs(5),
        })
    }

    fn run(mut self, tick_interval: Duration) {
        let ticker = crossbeam_channel::tick(tick_interval);
        let rx_commands = self.rx_commands.clone();
        loop {
            crossbeam_channel::select! {
                recv(rx_commands) -> msg => {
                    match msg {
                        Ok(RuntimeCommand::Apply(command)) => self.apply(command),
                        Ok(RuntimeCommand::MediaDecoded { media, resource, reply }) => {
                            self.media_decoded(media, resource, reply)
                        }
                        Ok(RuntimeCommand::Shutdown) | Err(_) => break,
                    }
                }
                recv(ticker) -> _ => {
                    if self.session.clock().is_playing() {
                        let outcome = self.session.tick();
                        let time = self.session.clock().current_time();
                        self.publish(EngineEvent::Ticked { outcome, time });
                    }
                }
            }
        }
        self.session.clear();
        *self.latest.lock() = self.session.snapshot();
        let _ = self.tx_events.send(EngineEvent::Stopped);
        info!("engine stopped");
    }

    fn apply(&mut self, command: SessionCommand) {
        let event = match apply_command(&mut self.session, command.clone()) {
            Ok(outcome) => {
                debug!(?command, ?outcome, "command applied");
                EngineEvent::Applied { command, outcome }
            }
            Err(e) => {
                warn!(?command, error = %e, "command rejected");
                EngineEvent::Rejected {
                    command,
                    error: e.to_string(),
                }
            }
        };
        self.publish(event);
    }

    fn media_decoded(
        &mut self,
        media: DecodedMedia,
        resource: Option<Box<dyn PlayableResource>>,
        reply: Sender<ElementId>,
    ) {
        let id = self.session.on_media_decoded(media.clone(), resource);
        let _ = reply.send(id);
        self.publish(EngineEvent::Applied {
            command: SessionCommand::AddMedia { media },
            outcome: CommandOutcome::Added(id),
        });
    }

    fn publish(&self, event: EngineEvent) {
        *self.latest.lock() = self.session.snapshot();
        let _ = self.tx_events.send(event);
    }
}

impl EngineHandle {
    pub fn send(&self, command: SessionCommand) -> Result<(), RuntimeError> {
        self.tx_commands
            .send(RuntimeCommand::Apply(command))
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Register decoded media and wait for the id the engine assigned.
    pub fn add_media(
        &self,
        media: DecodedMedia,
        resource: Option<Box<dyn PlayableResource>>,
    ) -> Result<ElementId, RuntimeError> {
        let (reply, rx_reply) = bounded(1);
        self.tx_commands
            .send(RuntimeCommand::MediaDecoded {
                media,
                resource,
                reply,
            })
            .map_err(|_| RuntimeError::Stopped)?;
        rx_reply
            .recv_timeout(self.reply_timeout)
            .map_err(|e| match e {
                crossbeam_channel::RecvTimeoutError::Timeout => {
                    RuntimeError::Timeout(self.reply_timeout)
                }
                crossbeam_channel::RecvTimeoutError::Disconnected => RuntimeError::Stopped,
            })
    }

    /// Last state published by the engine thread.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.latest.lock().clone()
    }

    /// Stop the engine thread and wait for it to exit. Safe to call twice.
    pub fn shutdown(&self) -> Result<()> {
        let _ = self.tx_commands.send(RuntimeCommand::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            worker
                .join()
                .map_err(|_| anyhow::anyhow!("engine thread panicked"))?;
        }
        Ok(())
    }
}
