use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{debug, info, warn};

use playback::{EngineConfig, SessionCommand, SessionSnapshot, SimulatedResource, TickOutcome};
use runtime::{EngineEvent, EngineHandle, EngineRuntime};
use timeline::timecode::format_position;

use crate::script::{advance_all, mark_ready, Action, Script};

/// Feed a script to the threaded runtime, then let it run for `run_for`
/// of wall-clock time. Returns the state just before shutdown.
pub fn live(config: EngineConfig, script: &Script, run_for: Duration) -> Result<SessionSnapshot> {
    let tick_step = config.tick_step;
    let handle = EngineRuntime::start(config)?;
    let resources = script.resources();

    let mut ids = Vec::with_capacity(resources.len());
    for (spec, res) in script.media.iter().zip(&resources) {
        let id = handle
            .add_media(spec.media.clone(), Some(Box::new(res.clone())))
            .with_context(|| format!("add {}", spec.media.filename))?;
        ids.push(id);
    }

    for step in &script.steps {
        for action in step.lower(&ids)? {
            match action {
                Action::Command(command) => handle.send(command)?,
                Action::Ready(element) => {
                    mark_ready(&resources[element]);
                    handle.send(SessionCommand::ResourceReady {
                        element_id: ids[element],
                    })?;
                }
                Action::Wait(duration) => pump(&handle, &resources, tick_step, duration),
                Action::Snapshot => print_snapshot(&handle.snapshot())?,
            }
            pump(&handle, &resources, tick_step, Duration::ZERO);
        }
    }

    info!(?run_for, "running");
    pump(&handle, &resources, tick_step, run_for);

    let last = handle.snapshot();
    handle.shutdown()?;
    Ok(last)
}

/// Drain engine events for `duration`, keeping simulated resources in step
/// with the engine's ticks.
fn pump(
    handle: &EngineHandle,
    resources: &[Arc<Mutex<SimulatedResource>>],
    tick_step: f64,
    duration: Duration,
) {
    let deadline = Instant::now() + duration;
    // Queued events are still delivered after the deadline has passed
    while let Ok(event) = handle.rx_events.recv_deadline(deadline) {
        match event {
            EngineEvent::Ticked { outcome, time } => {
                advance_all(resources, tick_step);
                if outcome == TickOutcome::AutoPaused {
                    info!(time, "playback paused at end of media");
                }
            }
            EngineEvent::Applied { command, outcome } => {
                debug!(?command, ?outcome, "applied");
            }
            EngineEvent::Rejected { command, error } => {
                warn!(?command, "rejected: {error}");
            }
            EngineEvent::Stopped => return,
        }
    }
}

pub fn print_snapshot(snapshot: &SessionSnapshot) -> Result<()> {
    info!(
        "{} playing={} visible={}",
        format_position(snapshot.current_time, snapshot.max_time),
        snapshot.is_playing,
        snapshot.visible.len()
    );
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
