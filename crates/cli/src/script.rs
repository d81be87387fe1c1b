use anyhow::{anyhow, Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{path::Path, sync::Arc, time::Duration};

use playback::{DecodedMedia, ReadyState, SessionCommand, SimulatedResource, TrimEdge};
use timeline::{ElementId, ElementPatch, Position, Seconds};

/// A media file the script drops onto the editor before its steps run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaSpec {
    #[serde(flatten)]
    pub media: DecodedMedia,
    /// Whether the simulated resource can play immediately.
    #[serde(default = "default_ready")]
    pub ready: bool,
    /// Simulate an autoplay refusal.
    #[serde(default)]
    pub refuse_play: bool,
}

fn default_ready() -> bool {
    true
}

fn one() -> u32 {
    1
}

/// One scripted user action. Elements are addressed by their index in
/// [`Script::media`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Play,
    Pause,
    TogglePlay,
    Seek {
        time: Seconds,
    },
    Tick {
        #[serde(default = "one")]
        count: u32,
    },
    SetMaxTime {
        max_time: Seconds,
    },
    Scrub {
        pointer_x: f64,
        track_width: f64,
    },
    Click {
        element: usize,
    },
    BeginTrim {
        element: usize,
        edge: TrimEdge,
    },
    MoveTrim {
        pointer_x: f64,
        track_width: f64,
    },
    EndTrim,
    SetStartText {
        element: usize,
        text: String,
    },
    SetEndText {
        element: usize,
        text: String,
    },
    SetWidth {
        element: usize,
        width: i64,
    },
    SetHeight {
        element: usize,
        height: i64,
    },
    SetPosition {
        element: usize,
        x: f64,
        y: f64,
    },
    SetMuted {
        element: usize,
        muted: bool,
    },
    SetGlobalMute {
        muted: bool,
    },
    SetZoom {
        zoom: i64,
    },
    Update {
        element: usize,
        patch: ElementPatch,
    },
    Remove {
        element: usize,
    },
    Clear,
    /// The element's resource finished loading.
    Ready {
        element: usize,
    },
    /// Let wall-clock time pass. Only meaningful for live runs.
    Wait {
        ms: u64,
    },
    Snapshot,
}

/// Lowered form of a step, ready for a driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Command(SessionCommand),
    Ready(usize),
    Wait(Duration),
    Snapshot,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Script {
    #[serde(default)]
    pub media: Vec<MediaSpec>,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse script {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(text)?;
        let count = script.media.len();
        for (i, step) in script.steps.iter().enumerate() {
            if let Some(element) = step.element().filter(|e| *e >= count) {
                return Err(anyhow!(
                    "step {i} targets element {element}, script declares {count}"
                ));
            }
        }
        Ok(script)
    }

    /// A shared simulated resource per declared media, in order.
    pub fn resources(&self) -> Vec<Arc<Mutex<SimulatedResource>>> {
        self.media
            .iter()
            .map(|spec| {
                let mut res = SimulatedResource::new(spec.media.filename.clone());
                if !spec.ready {
                    res.ready = ReadyState::HaveNothing;
                }
                res.refuse_play = spec.refuse_play;
                Arc::new(Mutex::new(res))
            })
            .collect()
    }
}

impl ScriptStep {
    fn element(&self) -> Option<usize> {
        match self {
            ScriptStep::Click { element }
            | ScriptStep::BeginTrim { element, .. }
            | ScriptStep::SetStartText { element, .. }
            | ScriptStep::SetEndText { element, .. }
            | ScriptStep::SetWidth { element, .. }
            | ScriptStep::SetHeight { element, .. }
            | ScriptStep::SetPosition { element, .. }
            | ScriptStep::SetMuted { element, .. }
            | ScriptStep::Update { element, .. }
            | ScriptStep::Remove { element }
            | ScriptStep::Ready { element } => Some(*element),
            _ => None,
        }
    }

    /// Resolve element indices against the ids the engine assigned.
    pub fn lower(&self, ids: &[ElementId]) -> Result<Vec<Action>> {
        let id = |element: usize| {
            ids.get(element)
                .copied()
                .ok_or_else(|| anyhow!("no element at index {element}"))
        };
        let command = match self {
            ScriptStep::Play => SessionCommand::Play,
            ScriptStep::Pause => SessionCommand::Pause,
            ScriptStep::TogglePlay => SessionCommand::TogglePlay,
            ScriptStep::Seek { time } => SessionCommand::Seek { time: *time },
            ScriptStep::Tick { count } => {
                return Ok((0..*count)
                    .map(|_| Action::Command(SessionCommand::Tick))
                    .collect())
            }
            ScriptStep::SetMaxTime { max_time } => SessionCommand::SetMaxTime {
                max_time: *max_time,
            },
            ScriptStep::Scrub {
                pointer_x,
                track_width,
            } => SessionCommand::Scrub {
                pointer_x: *pointer_x,
                track_width: *track_width,
            },
            ScriptStep::Click { element } => SessionCommand::ClickElement {
                element_id: id(*element)?,
            },
            ScriptStep::BeginTrim { element, edge } => SessionCommand::BeginTrim {
                element_id: id(*element)?,
                edge: *edge,
            },
            ScriptStep::MoveTrim {
                pointer_x,
                track_width,
            } => SessionCommand::MoveTrim {
                pointer_x: *pointer_x,
                track_width: *track_width,
            },
            ScriptStep::EndTrim => SessionCommand::EndTrim,
            ScriptStep::SetStartText { element, text } => SessionCommand::SetStartText {
                element_id: id(*element)?,
                text: text.clone(),
            },
            ScriptStep::SetEndText { element, text } => SessionCommand::SetEndText {
                element_id: id(*element)?,
                text: text.clone(),
            },
            ScriptStep::SetWidth { element, width } => SessionCommand::SetWidth {
                element_id: id(*element)?,
                width: *width,
            },
            ScriptStep::SetHeight { element, height } => SessionCommand::SetHeight {
                element_id: id(*element)?,
                height: *height,
            },
            ScriptStep::SetPosition { element, x, y } => SessionCommand::SetPosition {
                element_id: id(*element)?,
                position: Position::new(*x, *y),
            },
            ScriptStep::SetMuted { element, muted } => SessionCommand::SetMuted {
                element_id: id(*element)?,
                muted: *muted,
            },
            ScriptStep::SetGlobalMute { muted } => SessionCommand::SetGlobalMute { muted: *muted },
            ScriptStep::SetZoom { zoom } => SessionCommand::SetZoom { zoom: *zoom },
            ScriptStep::Update { element, patch } => SessionCommand::UpdateElement {
                element_id: id(*element)?,
                patch: patch.clone(),
            },
            ScriptStep::Remove { element } => SessionCommand::RemoveElement {
                element_id: id(*element)?,
            },
            ScriptStep::Clear => SessionCommand::Clear,
            ScriptStep::Ready { element } => return Ok(vec![Action::Ready(*element)]),
            ScriptStep::Wait { ms } => return Ok(vec![Action::Wait(Duration::from_millis(*ms))]),
            ScriptStep::Snapshot => return Ok(vec![Action::Snapshot]),
        };
        Ok(vec![Action::Command(command)])
    }
}

/// Mark a simulated resource as loaded.
pub fn mark_ready(res: &Arc<Mutex<SimulatedResource>>) {
    res.lock().ready = ReadyState::HaveEnoughData;
}

/// Move every playing resource's own play head forward.
pub fn advance_all(resources: &[Arc<Mutex<SimulatedResource>>], dt: Seconds) {
    for res in resources {
        res.lock().advance(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "media": [
            {"kind": "video", "src": "blob:a", "filename": "a.mp4", "natural_width": 1920, "natural_height": 1080},
            {"kind": "image", "src": "blob:b", "filename": "b.png", "natural_width": 800, "natural_height": 600, "ready": false}
        ],
        "steps": [
            {"step": "set_start_text", "element": 1, "text": "00:15.0"},
            {"step": "tick", "count": 3},
            {"step": "begin_trim", "element": 0, "edge": "end"},
            {"step": "wait", "ms": 250},
            {"step": "snapshot"}
        ]
    }"#;

    #[test]
    fn parses_media_and_steps() {
        let script = Script::parse(SCRIPT).unwrap();
        assert_eq!(script.media.len(), 2);
        assert!(script.media[0].ready);
        assert!(!script.media[1].ready);
        assert_eq!(script.steps[1], ScriptStep::Tick { count: 3 });

        let resources = script.resources();
        assert_eq!(resources[1].lock().ready, ReadyState::HaveNothing);
        assert_eq!(resources[0].lock().name, "a.mp4");
    }

    #[test]
    fn out_of_range_element_is_rejected() {
        let text = r#"{"media": [], "steps": [{"step": "click", "element": 0}]}"#;
        let err = Script::parse(text).unwrap_err();
        assert!(err.to_string().contains("targets element 0"));
    }

    #[test]
    fn lowering_resolves_indices() {
        let script = Script::parse(SCRIPT).unwrap();
        let ids = vec![ElementId::new(), ElementId::new()];

        assert_eq!(
            script.steps[0].lower(&ids).unwrap(),
            vec![Action::Command(SessionCommand::SetStartText {
                element_id: ids[1],
                text: "00:15.0".to_string()
            })]
        );
        assert_eq!(script.steps[1].lower(&ids).unwrap().len(), 3);
        assert_eq!(
            script.steps[3].lower(&ids).unwrap(),
            vec![Action::Wait(Duration::from_millis(250))]
        );
        assert!(ScriptStep::Click { element: 5 }.lower(&ids).is_err());
    }
}
