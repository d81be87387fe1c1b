use serde::{Deserialize, Serialize};
use timeline::{round_tenth, ElementId, ElementPatch, Seconds, TimelineRegistry};
use tracing::debug;

use crate::Clock;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimEdge {
    Start,
    End,
}

/// An in-progress trim drag, alive between pointer-down and pointer-up.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct GestureState {
    pub element: ElementId,
    pub edge: TrimEdge,
}

/// Map a track-relative pointer position to a timeline time, rounded to a
/// tenth and clamped to `[0, max_time]`. Degenerate tracks map to nothing.
pub fn pointer_to_time(pointer_x: f64, track_width: f64, max_time: Seconds) -> Option<Seconds> {
    if !(track_width.is_finite() && track_width > 0.0) || !pointer_x.is_finite() {
        return None;
    }
    Some(round_tenth((pointer_x / track_width) * max_time).clamp(0.0, max_time))
}

/// Turns scrub, trim and transport gestures into clock and registry edits.
#[derive(Debug, Clone, Default)]
pub struct GestureResolver {
    active: Option<GestureState>,
}

impl GestureResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<GestureState> {
        self.active
    }

    /// Click on the bare track: seek to the pointer.
    pub fn scrub(&self, clock: &mut Clock, pointer_x: f64, track_width: f64) -> Option<Seconds> {
        let t = pointer_to_time(pointer_x, track_width, clock.max_time())?;
        clock.seek(t);
        Some(clock.current_time())
    }

    /// Click on an element's body: select it, jump to its start and stop playback.
    pub fn click_element(
        &self,
        clock: &mut Clock,
        registry: &mut TimelineRegistry,
        id: ElementId,
    ) -> bool {
        let Some(start) = registry.get(id).map(|e| e.window.start) else {
            return false;
        };
        registry.select(id);
        clock.seek(start);
        clock.pause();
        true
    }

    /// Pointer-down on a trim handle. Replaces any gesture left behind by a
    /// missed pointer-up.
    pub fn begin_trim(&mut self, registry: &TimelineRegistry, id: ElementId, edge: TrimEdge) -> bool {
        if !registry.contains(id) {
            return false;
        }
        if let Some(stale) = self.active.replace(GestureState { element: id, edge }) {
            debug!(element = %stale.element, "replacing stale trim gesture");
        }
        true
    }

    /// Pointer-move during a trim. Moves that would cross the sibling edge
    /// are dropped. Returns whether the registry changed.
    pub fn move_trim(
        &self,
        clock: &Clock,
        registry: &mut TimelineRegistry,
        pointer_x: f64,
        track_width: f64,
    ) -> bool {
        let Some(gesture) = self.active else {
            return false;
        };
        let Some(t) = pointer_to_time(pointer_x, track_width, clock.max_time()) else {
            return false;
        };
        let Some(window) = registry.get(gesture.element).map(|e| e.window) else {
            return false;
        };
        let patch = match gesture.edge {
            TrimEdge::Start if t < window.end => ElementPatch::start_time(t),
            TrimEdge::End if t > window.start => ElementPatch::end_time(t),
            _ => return false,
        };
        registry.update(gesture.element, &patch).is_some()
    }

    /// Pointer-up: always ends the gesture.
    pub fn end_trim(&mut self) -> Option<GestureState> {
        self.active.take()
    }

    /// Forget a gesture whose element has gone away.
    pub fn cancel_for(&mut self, id: ElementId) {
        if self.active.is_some_and(|g| g.element == id) {
            self.active = None;
        }
    }

    /// Transport play/pause button.
    ///
    /// Starting playback first rewinds to the earliest start among the
    /// visible elements, or jumps forward to the next element when nothing
    /// is visible. Returns whether the clock is playing afterwards.
    pub fn toggle_play(&self, clock: &mut Clock, registry: &TimelineRegistry) -> bool {
        if clock.is_playing() {
            clock.pause();
            return false;
        }
        let now = clock.current_time();
        if let Some(start) = registry.earliest_visible_start(now) {
            clock.seek(start);
        } else if let Some(next) = registry.next_start_after(now) {
            clock.seek(next);
        }
        clock.play(registry)
    }
}
