use anyhow::Result;
use tracing::{debug, info, warn};

use playback::{apply_command, EditorSession, EngineConfig, SessionCommand, SessionSnapshot};

use crate::script::{advance_all, mark_ready, Action, Script};

/// Run a script against an in-process session, one tick per `tick` step.
/// Returns every snapshot the script asked for, then the final state.
pub fn replay(config: EngineConfig, script: &Script) -> Result<Vec<SessionSnapshot>> {
    let tick_step = config.tick_step;
    let mut session = EditorSession::new(config);
    let resources = script.resources();

    let ids = script
        .media
        .iter()
        .zip(&resources)
        .map(|(spec, res)| session.on_media_decoded(spec.media.clone(), Some(Box::new(res.clone()))))
        .collect::<Vec<_>>();
    info!("loaded {} media elements", ids.len());

    let mut snapshots = Vec::new();
    for step in &script.steps {
        for action in step.lower(&ids)? {
            match action {
                Action::Command(command) => {
                    if command == SessionCommand::Tick {
                        advance_all(&resources, tick_step);
                    }
                    match apply_command(&mut session, command.clone()) {
                        Ok(outcome) => debug!(?command, ?outcome, "applied"),
                        Err(e) => warn!(?command, "rejected: {e}"),
                    }
                }
                Action::Ready(element) => {
                    mark_ready(&resources[element]);
                    let fired = session.resource_ready(ids[element]);
                    debug!(element, fired, "resource ready");
                }
                Action::Wait(duration) => {
                    debug!(?duration, "wait ignored during replay");
                }
                Action::Snapshot => snapshots.push(session.snapshot()),
            }
        }
    }

    snapshots.push(session.snapshot());
    Ok(snapshots)
}
