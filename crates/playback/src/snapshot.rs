use serde::{Deserialize, Serialize};
use timeline::{format_time, timecode::format_position, ElementId, MediaElement, Seconds};

use crate::{EditorSession, GestureState, SessionContext, SyncState};

/// Render-ready view of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementView {
    #[serde(flatten)]
    pub element: MediaElement,
    pub visible: bool,
    pub selected: bool,
    /// `None` when no resource is attached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_state: Option<SyncState>,
    pub start_display: String,
    pub end_display: String,
}

/// Everything a view layer needs to draw one frame of the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_time: Seconds,
    pub is_playing: bool,
    pub max_time: Seconds,
    /// `MM:SS.D / MM:SS.D`
    pub position_display: String,
    pub elements: Vec<ElementView>,
    /// Ids drawn in the preview, in stacking order.
    pub visible: Vec<ElementId>,
    pub selected: Option<ElementId>,
    pub gesture: Option<GestureState>,
    pub context: SessionContext,
}

impl SessionSnapshot {
    pub fn capture(session: &EditorSession) -> Self {
        let clock = session.clock();
        let registry = session.registry();
        let now = clock.current_time();
        let selected = registry.selected();

        let elements = registry
            .iter()
            .map(|e| ElementView {
                element: e.clone(),
                visible: e.is_visible_at(now),
                selected: selected == Some(e.id),
                sync_state: session.driver().state(e.id),
                start_display: format_time(e.window.start),
                end_display: format_time(e.window.end),
            })
            .collect::<Vec<_>>();
        let visible = elements
            .iter()
            .filter(|v| v.visible)
            .map(|v| v.element.id)
            .collect();

        Self {
            current_time: now,
            is_playing: clock.is_playing(),
            max_time: clock.max_time(),
            position_display: format_position(now, clock.max_time()),
            elements,
            visible,
            selected,
            gesture: session.gesture(),
            context: *session.context(),
        }
    }

    pub fn element(&self, id: ElementId) -> Option<&ElementView> {
        self.elements.iter().find(|v| v.element.id == id)
    }
}
