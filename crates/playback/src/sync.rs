use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use timeline::{ElementId, MediaElement, Seconds, TimelineRegistry};
use tracing::debug;

use crate::{Clock, PlayableResource};

/// Per-resource playback state as driven by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Hidden,
    VisiblePaused,
    VisiblePlaying,
}

/// Session-wide flags that are not part of any element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub global_mute: bool,
    /// Timeline zoom in percent, `[50, 150]`.
    pub zoom: u32,
}

impl SessionContext {
    pub const MIN_ZOOM: u32 = 50;
    pub const MAX_ZOOM: u32 = 150;

    pub fn set_zoom(&mut self, zoom: i64) {
        self.zoom = zoom.clamp(Self::MIN_ZOOM as i64, Self::MAX_ZOOM as i64) as u32;
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            global_mute: false,
            zoom: 100,
        }
    }
}

struct ResourceSlot {
    resource: Box<dyn PlayableResource>,
    state: SyncState,
    /// Generation of the deferred play waiting for readiness, if any.
    pending_play: Option<u64>,
}

impl ResourceSlot {
    fn transition(&mut self, id: ElementId, next: SyncState) {
        if self.state != next {
            debug!(element = %id, from = ?self.state, to = ?next, "sync state");
            if next != SyncState::VisiblePlaying {
                self.pending_play = None;
            }
            self.state = next;
        }
    }

    fn start_playback(&mut self, id: ElementId) {
        if let Err(e) = self.resource.play() {
            debug!(element = %id, error = %e, "play request declined");
        }
    }
}

/// Keeps every attached resource aligned with the master clock.
///
/// `reconcile` is the single entry point for clock or registry changes; it
/// reissues `play` on every pass while an element is visible and the clock
/// is running, so a declined play is retried on the next pass.
pub struct MediaSyncDriver {
    slots: HashMap<ElementId, ResourceSlot>,
    resync_threshold: Seconds,
    next_generation: u64,
}

impl MediaSyncDriver {
    pub fn new(resync_threshold: Seconds) -> Self {
        Self {
            slots: HashMap::new(),
            resync_threshold,
            next_generation: 0,
        }
    }

    /// Attach a resource to an element, returning any resource it replaces.
    /// The replaced resource is paused and hidden first.
    pub fn attach(
        &mut self,
        id: ElementId,
        resource: Box<dyn PlayableResource>,
    ) -> Option<Box<dyn PlayableResource>> {
        let previous = self.detach(id);
        self.slots.insert(
            id,
            ResourceSlot {
                resource,
                state: SyncState::Hidden,
                pending_play: None,
            },
        );
        previous
    }

    /// Halt and release an element's resource.
    pub fn detach(&mut self, id: ElementId) -> Option<Box<dyn PlayableResource>> {
        let mut slot = self.slots.remove(&id)?;
        slot.resource.pause();
        slot.resource.set_visible(false);
        debug!(element = %id, "resource detached");
        Some(slot.resource)
    }

    pub fn detach_all(&mut self) {
        let ids: Vec<ElementId> = self.slots.keys().copied().collect();
        for id in ids {
            self.detach(id);
        }
    }

    pub fn is_attached(&self, id: ElementId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn state(&self, id: ElementId) -> Option<SyncState> {
        self.slots.get(&id).map(|s| s.state)
    }

    pub fn has_pending_play(&self, id: ElementId) -> bool {
        self.slots
            .get(&id)
            .is_some_and(|s| s.pending_play.is_some())
    }

    pub fn resource(&self, id: ElementId) -> Option<&dyn PlayableResource> {
        self.slots.get(&id).map(|s| s.resource.as_ref())
    }

    pub fn resync_threshold(&self) -> Seconds {
        self.resync_threshold
    }

    /// Reconcile every attached resource with one consistent snapshot of
    /// clock, registry and context.
    pub fn reconcile(&mut self, clock: &Clock, registry: &TimelineRegistry, ctx: &SessionContext) {
        let orphaned: Vec<ElementId> = self
            .slots
            .keys()
            .copied()
            .filter(|id| !registry.contains(*id))
            .collect();
        for id in orphaned {
            self.detach(id);
        }

        for element in registry.iter() {
            self.reconcile_element(element, clock, ctx);
        }
    }

    fn reconcile_element(&mut self, element: &MediaElement, clock: &Clock, ctx: &SessionContext) {
        let threshold = self.resync_threshold;
        let Some(slot) = self.slots.get_mut(&element.id) else {
            return;
        };
        let id = element.id;
        let now = clock.current_time();

        slot.resource.set_muted(element.muted || ctx.global_mute);

        if !element.window.contains(now) {
            slot.resource.set_visible(false);
            slot.resource.pause();
            // Pre-roll reset only when the play head sits before the window.
            if now < element.window.start {
                slot.resource.seek_to(0.0);
            }
            slot.transition(id, SyncState::Hidden);
            return;
        }

        slot.resource.set_visible(true);
        let local = now - element.window.start;
        if (slot.resource.current_position() - local).abs() > threshold {
            slot.resource.seek_to(local);
        }

        if clock.is_playing() {
            slot.transition(id, SyncState::VisiblePlaying);
            if slot.resource.ready_state().can_play() {
                slot.pending_play = None;
                slot.start_playback(id);
            } else if slot.pending_play.is_none() {
                self.next_generation += 1;
                slot.pending_play = Some(self.next_generation);
                debug!(element = %id, "play deferred until resource is ready");
            }
        } else {
            slot.resource.pause();
            slot.transition(id, SyncState::VisiblePaused);
        }
    }

    /// Readiness notification from a resource. Fires the deferred play only
    /// if the element is still visible and the clock is still running.
    /// Returns whether playback was started.
    pub fn notify_ready(
        &mut self,
        id: ElementId,
        clock: &Clock,
        registry: &TimelineRegistry,
    ) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        let Some(generation) = slot.pending_play.take() else {
            return false;
        };
        let still_visible = registry
            .get(id)
            .is_some_and(|e| e.window.contains(clock.current_time()));
        if slot.state == SyncState::VisiblePlaying && clock.is_playing() && still_visible {
            debug!(element = %id, generation, "deferred play fired");
            slot.start_playback(id);
            true
        } else {
            debug!(element = %id, generation, "deferred play dropped");
            false
        }
    }
}

impl Default for MediaSyncDriver {
    fn default() -> Self {
        Self::new(0.1)
    }
}
