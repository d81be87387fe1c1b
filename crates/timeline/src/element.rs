use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::Seconds;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ElementId(pub Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify by MIME type the way the upload layer reports it.
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Handle to decoded media owned by the decode service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRef {
    pub src: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Spatial placement of an element on the preview canvas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub position: Position,
    pub width: u32,
    pub height: u32,
}

/// Half-open visibility interval `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TimeWindow {
    pub start: Seconds,
    pub end: Seconds,
}

impl TimeWindow {
    pub fn new(start: Seconds, end: Seconds) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, t: Seconds) -> bool {
        self.start <= t && t < self.end
    }

    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new(0.0, 10.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaElement {
    pub id: ElementId,
    pub kind: MediaKind,
    pub resource: ResourceRef,
    pub frame: Placement,
    pub window: TimeWindow,
    #[serde(default)]
    pub muted: bool,
}

impl MediaElement {
    pub fn new(kind: MediaKind, resource: ResourceRef, frame: Placement, window: TimeWindow) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            resource,
            frame,
            window,
            muted: false,
        }
    }

    pub fn is_visible_at(&self, t: Seconds) -> bool {
        self.window.contains(t)
    }
}

/// Partial update applied through [`crate::TimelineRegistry::update`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Seconds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

impl ElementPatch {
    pub fn start_time(t: Seconds) -> Self {
        Self {
            start_time: Some(t),
            ..Self::default()
        }
    }

    pub fn end_time(t: Seconds) -> Self {
        Self {
            end_time: Some(t),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
