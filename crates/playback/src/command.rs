use serde::{Deserialize, Serialize};
use timeline::{ElementId, ElementPatch, Position, Seconds, TimelineError};

use crate::clock::TickOutcome;
use crate::{DecodedMedia, EditorSession, TimeEntry, TrimEdge};

/// Serializable form of every user-facing session operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    AddMedia {
        media: DecodedMedia,
    },
    RemoveElement {
        element_id: ElementId,
    },
    Clear,
    Select {
        element_id: ElementId,
    },
    UpdateElement {
        element_id: ElementId,
        patch: ElementPatch,
    },
    Play,
    Pause,
    TogglePlay,
    Seek {
        time: Seconds,
    },
    Tick,
    SetMaxTime {
        max_time: Seconds,
    },
    Scrub {
        pointer_x: f64,
        track_width: f64,
    },
    ClickElement {
        element_id: ElementId,
    },
    BeginTrim {
        element_id: ElementId,
        edge: TrimEdge,
    },
    MoveTrim {
        pointer_x: f64,
        track_width: f64,
    },
    EndTrim,
    SetStartText {
        element_id: ElementId,
        text: String,
    },
    SetEndText {
        element_id: ElementId,
        text: String,
    },
    SetWidth {
        element_id: ElementId,
        width: i64,
    },
    SetHeight {
        element_id: ElementId,
        height: i64,
    },
    SetPosition {
        element_id: ElementId,
        position: Position,
    },
    SetMuted {
        element_id: ElementId,
        muted: bool,
    },
    SetGlobalMute {
        muted: bool,
    },
    SetZoom {
        zoom: i64,
    },
    ResourceReady {
        element_id: ElementId,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum CommandOutcome {
    Applied,
    /// The command was valid but had no effect (a dropped trim move, a
    /// deferred play that was no longer wanted).
    Ignored,
    Added(ElementId),
    Playing(bool),
    Ticked(TickOutcome),
    Time(Seconds),
    Entry(TimeEntry),
    Dimension(u32),
}

fn require(session: &EditorSession, id: ElementId) -> Result<(), TimelineError> {
    if session.registry().contains(id) {
        Ok(())
    } else {
        Err(TimelineError::ElementNotFound(id))
    }
}

fn flag(changed: bool) -> CommandOutcome {
    if changed {
        CommandOutcome::Applied
    } else {
        CommandOutcome::Ignored
    }
}

/// Run one command against the session. Commands naming an unknown element
/// fail with [`TimelineError::ElementNotFound`] and change nothing.
pub fn apply_command(
    session: &mut EditorSession,
    command: SessionCommand,
) -> Result<CommandOutcome, TimelineError> {
    let outcome = match command {
        SessionCommand::AddMedia { media } => {
            CommandOutcome::Added(session.on_media_decoded(media, None))
        }
        SessionCommand::RemoveElement { element_id } => {
            session
                .remove_element(element_id)
                .ok_or(TimelineError::ElementNotFound(element_id))?;
            CommandOutcome::Applied
        }
        SessionCommand::Clear => {
            session.clear();
            CommandOutcome::Applied
        }
        SessionCommand::Select { element_id } => {
            require(session, element_id)?;
            session.select(element_id);
            CommandOutcome::Applied
        }
        SessionCommand::UpdateElement { element_id, patch } => {
            session
                .update_element(element_id, &patch)
                .ok_or(TimelineError::ElementNotFound(element_id))?;
            CommandOutcome::Applied
        }
        SessionCommand::Play => CommandOutcome::Playing(session.play()),
        SessionCommand::Pause => {
            session.pause();
            CommandOutcome::Playing(false)
        }
        SessionCommand::TogglePlay => CommandOutcome::Playing(session.toggle_play()),
        SessionCommand::Seek { time } => {
            session.seek(time);
            CommandOutcome::Time(session.clock().current_time())
        }
        SessionCommand::Tick => CommandOutcome::Ticked(session.tick()),
        SessionCommand::SetMaxTime { max_time } => {
            session.set_max_time(max_time);
            CommandOutcome::Time(session.clock().max_time())
        }
        SessionCommand::Scrub {
            pointer_x,
            track_width,
        } => match session.scrub(pointer_x, track_width) {
            Some(t) => CommandOutcome::Time(t),
            None => CommandOutcome::Ignored,
        },
        SessionCommand::ClickElement { element_id } => {
            require(session, element_id)?;
            session.click_element(element_id);
            CommandOutcome::Time(session.clock().current_time())
        }
        SessionCommand::BeginTrim { element_id, edge } => {
            require(session, element_id)?;
            session.begin_trim(element_id, edge);
            CommandOutcome::Applied
        }
        SessionCommand::MoveTrim {
            pointer_x,
            track_width,
        } => flag(session.move_trim(pointer_x, track_width)),
        SessionCommand::EndTrim => flag(session.end_trim().is_some()),
        SessionCommand::SetStartText { element_id, text } => {
            require(session, element_id)?;
            CommandOutcome::Entry(session.set_start_text(element_id, &text))
        }
        SessionCommand::SetEndText { element_id, text } => {
            require(session, element_id)?;
            CommandOutcome::Entry(session.set_end_text(element_id, &text))
        }
        SessionCommand::SetWidth { element_id, width } => session
            .set_width(element_id, width)
            .map(CommandOutcome::Dimension)
            .ok_or(TimelineError::ElementNotFound(element_id))?,
        SessionCommand::SetHeight { element_id, height } => session
            .set_height(element_id, height)
            .map(CommandOutcome::Dimension)
            .ok_or(TimelineError::ElementNotFound(element_id))?,
        SessionCommand::SetPosition {
            element_id,
            position,
        } => {
            require(session, element_id)?;
            session.set_position(element_id, position);
            CommandOutcome::Applied
        }
        SessionCommand::SetMuted { element_id, muted } => {
            require(session, element_id)?;
            session.set_muted(element_id, muted);
            CommandOutcome::Applied
        }
        SessionCommand::SetGlobalMute { muted } => {
            session.set_global_mute(muted);
            CommandOutcome::Applied
        }
        SessionCommand::SetZoom { zoom } => CommandOutcome::Dimension(session.set_zoom(zoom)),
        SessionCommand::ResourceReady { element_id } => {
            require(session, element_id)?;
            flag(session.resource_ready(element_id))
        }
    };
    Ok(outcome)
}
