use serde::{Deserialize, Serialize};
use timeline::{
    clamp_dimension, format_time, initial_placement, parse_time_input, round_tenth, ElementId,
    ElementPatch, MediaElement, MediaKind, Position, ResourceRef, Seconds, TimelineRegistry,
};
use tracing::{debug, info};

use crate::clock::TickOutcome;
use crate::snapshot::SessionSnapshot;
use crate::{
    Clock, EngineConfig, GestureResolver, GestureState, MediaSyncDriver, PlayableResource,
    SessionContext, TrimEdge,
};

/// What the decode service reports once a dropped file is usable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DecodedMedia {
    pub kind: MediaKind,
    pub src: String,
    #[serde(default)]
    pub filename: String,
    pub natural_width: u32,
    pub natural_height: u32,
}

/// Outcome of a manual time entry in the property panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeEntry {
    /// Applied value after clamping.
    Accepted(Seconds),
    /// Text was malformed or the element is gone; the field should show
    /// `display` again.
    Rejected { display: String },
}

/// One editing session: clock, registry, gestures and resource sync.
///
/// Every public mutation finishes with a re-derivation pass, so visibility
/// and resource state are consistent whenever a method returns.
pub struct EditorSession {
    config: EngineConfig,
    clock: Clock,
    registry: TimelineRegistry,
    gestures: GestureResolver,
    context: SessionContext,
    driver: MediaSyncDriver,
}

impl EditorSession {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            clock: Clock::new(config.max_time),
            registry: TimelineRegistry::new(),
            gestures: GestureResolver::new(),
            context: SessionContext::default(),
            driver: MediaSyncDriver::new(config.resync_threshold),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn registry(&self) -> &TimelineRegistry {
        &self.registry
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn driver(&self) -> &MediaSyncDriver {
        &self.driver
    }

    pub fn gesture(&self) -> Option<GestureState> {
        self.gestures.active()
    }

    pub fn element(&self, id: ElementId) -> Option<&MediaElement> {
        self.registry.get(id)
    }

    pub fn visible_elements(&self) -> Vec<&MediaElement> {
        self.registry.visible_at(self.clock.current_time())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(self)
    }

    fn resync(&mut self) {
        if self.registry.is_empty() {
            self.clock.reset();
        }
        self.driver
            .reconcile(&self.clock, &self.registry, &self.context);
    }

    // ----- registry -----

    /// Create an element for freshly decoded media and select it.
    pub fn on_media_decoded(
        &mut self,
        media: DecodedMedia,
        resource: Option<Box<dyn PlayableResource>>,
    ) -> ElementId {
        let frame = initial_placement(
            media.natural_width,
            media.natural_height,
            self.config.fit_box,
            self.config.preview_size,
        );
        let element = MediaElement::new(
            media.kind,
            ResourceRef {
                src: media.src,
                filename: media.filename,
            },
            frame,
            self.config.default_window,
        );
        let id = self.registry.add(element).id;
        self.registry.select(id);
        if let Some(resource) = resource {
            self.driver.attach(id, resource);
        }
        info!(element = %id, kind = ?media.kind, "media added");
        self.resync();
        id
    }

    /// Insert a prepared element under a fresh id.
    pub fn add_element(&mut self, element: MediaElement) -> ElementId {
        let id = self.registry.add(element).id;
        self.resync();
        id
    }

    pub fn attach_resource(&mut self, id: ElementId, resource: Box<dyn PlayableResource>) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        self.driver.attach(id, resource);
        self.resync();
        true
    }

    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> Option<MediaElement> {
        let updated = self.registry.update(id, patch).cloned();
        self.resync();
        updated
    }

    pub fn remove_element(&mut self, id: ElementId) -> Option<MediaElement> {
        let removed = self.registry.remove(id);
        if removed.is_some() {
            self.gestures.cancel_for(id);
            self.driver.detach(id);
            info!(element = %id, "media removed");
        }
        self.resync();
        removed
    }

    pub fn clear(&mut self) {
        self.registry.clear();
        self.gestures.end_trim();
        self.driver.detach_all();
        info!("timeline cleared");
        self.resync();
    }

    pub fn select(&mut self, id: ElementId) -> bool {
        self.registry.select(id)
    }

    // ----- clock -----

    pub fn play(&mut self) -> bool {
        let playing = self.clock.play(&self.registry);
        self.resync();
        playing
    }

    pub fn pause(&mut self) {
        self.clock.pause();
        self.resync();
    }

    pub fn toggle_play(&mut self) -> bool {
        let playing = self.gestures.toggle_play(&mut self.clock, &self.registry);
        debug!(playing, time = self.clock.current_time(), "transport toggled");
        self.resync();
        playing
    }

    pub fn seek(&mut self, t: Seconds) {
        self.clock.seek(t);
        self.resync();
    }

    /// Advance the clock by the configured step.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.clock.tick(self.config.tick_step, &self.registry);
        if outcome == TickOutcome::AutoPaused {
            debug!(time = self.clock.current_time(), "playback reached end of media");
        }
        if outcome != TickOutcome::Idle {
            self.resync();
        }
        outcome
    }

    pub fn set_max_time(&mut self, max_time: Seconds) {
        self.clock.set_max_time(max_time);
        self.resync();
    }

    // ----- gestures -----

    pub fn scrub(&mut self, pointer_x: f64, track_width: f64) -> Option<Seconds> {
        let t = self.gestures.scrub(&mut self.clock, pointer_x, track_width);
        self.resync();
        t
    }

    pub fn click_element(&mut self, id: ElementId) -> bool {
        let hit = self
            .gestures
            .click_element(&mut self.clock, &mut self.registry, id);
        self.resync();
        hit
    }

    pub fn begin_trim(&mut self, id: ElementId, edge: TrimEdge) -> bool {
        self.gestures.begin_trim(&self.registry, id, edge)
    }

    pub fn move_trim(&mut self, pointer_x: f64, track_width: f64) -> bool {
        let changed = self
            .gestures
            .move_trim(&self.clock, &mut self.registry, pointer_x, track_width);
        if changed {
            self.resync();
        }
        changed
    }

    pub fn end_trim(&mut self) -> Option<GestureState> {
        self.gestures.end_trim()
    }

    // ----- property panel -----

    /// Manual start entry: clamped to `[0, end - 0.1]`.
    pub fn set_start_text(&mut self, id: ElementId, text: &str) -> TimeEntry {
        let Some(window) = self.registry.get(id).map(|e| e.window) else {
            return TimeEntry::Rejected {
                display: format_time(0.0),
            };
        };
        let Ok(value) = parse_time_input(text) else {
            debug!(element = %id, text, "rejected start time entry");
            return TimeEntry::Rejected {
                display: format_time(window.start),
            };
        };
        let start = round_tenth(value.min(window.end - 0.1)).max(0.0);
        self.update_element(id, &ElementPatch::start_time(start));
        TimeEntry::Accepted(start)
    }

    /// Manual end entry: clamped to `[start + 0.1, max_time]`.
    pub fn set_end_text(&mut self, id: ElementId, text: &str) -> TimeEntry {
        let Some(window) = self.registry.get(id).map(|e| e.window) else {
            return TimeEntry::Rejected {
                display: format_time(0.0),
            };
        };
        let Ok(value) = parse_time_input(text) else {
            debug!(element = %id, text, "rejected end time entry");
            return TimeEntry::Rejected {
                display: format_time(window.end),
            };
        };
        let end = round_tenth(value.min(self.clock.max_time()).max(window.start + 0.1));
        self.update_element(id, &ElementPatch::end_time(end));
        TimeEntry::Accepted(end)
    }

    pub fn set_width(&mut self, id: ElementId, width: i64) -> Option<u32> {
        let width = clamp_dimension(width, self.config.max_width);
        let patch = ElementPatch {
            width: Some(width),
            ..ElementPatch::default()
        };
        self.update_element(id, &patch).map(|e| e.frame.width)
    }

    pub fn set_height(&mut self, id: ElementId, height: i64) -> Option<u32> {
        let height = clamp_dimension(height, self.config.max_height);
        let patch = ElementPatch {
            height: Some(height),
            ..ElementPatch::default()
        };
        self.update_element(id, &patch).map(|e| e.frame.height)
    }

    pub fn set_position(&mut self, id: ElementId, position: Position) -> bool {
        let patch = ElementPatch {
            position: Some(position),
            ..ElementPatch::default()
        };
        self.update_element(id, &patch).is_some()
    }

    pub fn set_muted(&mut self, id: ElementId, muted: bool) -> bool {
        let patch = ElementPatch {
            muted: Some(muted),
            ..ElementPatch::default()
        };
        self.update_element(id, &patch).is_some()
    }

    pub fn set_global_mute(&mut self, muted: bool) {
        self.context.global_mute = muted;
        self.resync();
    }

    pub fn set_zoom(&mut self, zoom: i64) -> u32 {
        self.context.set_zoom(zoom);
        self.context.zoom
    }

    // ----- resources -----

    /// Readiness notification from an element's resource.
    pub fn resource_ready(&mut self, id: ElementId) -> bool {
        self.driver
            .notify_ready(id, &self.clock, &self.registry)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
