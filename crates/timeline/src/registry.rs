use serde::{Deserialize, Serialize};

use crate::{ElementId, ElementPatch, MediaElement, Seconds, TimelineError};

/// Insertion-ordered set of media elements plus the current selection.
///
/// Every mutation keeps `0 <= start < end` for each element: window edits
/// that would invert a window are corrected here rather than rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimelineRegistry {
    elements: Vec<MediaElement>,
    #[serde(default)]
    selected: Option<ElementId>,
}

impl TimelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an element under a freshly generated id and return the stored copy.
    pub fn add(&mut self, mut element: MediaElement) -> &MediaElement {
        element.id = ElementId::new();
        while self.contains(element.id) {
            element.id = ElementId::new();
        }
        element.window.start = element.window.start.max(0.0);
        if element.window.end <= element.window.start {
            element.window.end = element.window.start + 1.0;
        }
        self.elements.push(element);
        &self.elements[self.elements.len() - 1]
    }

    /// Apply a partial update. Returns the updated element, or `None` for an unknown id.
    ///
    /// A start at or past the end pushes the end to `start + 1`; an end at or
    /// before the start is discarded and replaced by `start + 1`. When both
    /// are present the start is applied first.
    pub fn update(&mut self, id: ElementId, patch: &ElementPatch) -> Option<&MediaElement> {
        let element = self.elements.iter_mut().find(|e| e.id == id)?;

        if let Some(start) = patch.start_time.filter(|t| t.is_finite()) {
            let start = start.max(0.0);
            element.window.start = start;
            if start >= element.window.end {
                element.window.end = start + 1.0;
            }
        }
        if let Some(end) = patch.end_time.filter(|t| t.is_finite()) {
            if end <= element.window.start {
                element.window.end = element.window.start + 1.0;
            } else {
                element.window.end = end;
            }
        }
        if let Some(position) = patch.position {
            element.frame.position = position;
        }
        if let Some(width) = patch.width {
            element.frame.width = width;
        }
        if let Some(height) = patch.height {
            element.frame.height = height;
        }
        if let Some(muted) = patch.muted {
            element.muted = muted;
        }

        Some(element)
    }

    pub fn try_update(
        &mut self,
        id: ElementId,
        patch: &ElementPatch,
    ) -> Result<&MediaElement, TimelineError> {
        self.update(id, patch)
            .ok_or(TimelineError::ElementNotFound(id))
    }

    pub fn remove(&mut self, id: ElementId) -> Option<MediaElement> {
        let idx = self.elements.iter().position(|e| e.id == id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(idx))
    }

    pub fn clear(&mut self) {
        self.elements.clear();
        self.selected = None;
    }

    /// Elements whose window contains `t`, in insertion order.
    pub fn visible_at(&self, t: Seconds) -> Vec<&MediaElement> {
        self.elements.iter().filter(|e| e.window.contains(t)).collect()
    }

    pub fn any_visible_at(&self, t: Seconds) -> bool {
        self.elements.iter().any(|e| e.window.contains(t))
    }

    /// Smallest start among the elements visible at `t`.
    pub fn earliest_visible_start(&self, t: Seconds) -> Option<Seconds> {
        self.elements
            .iter()
            .filter(|e| e.window.contains(t))
            .map(|e| e.window.start)
            .reduce(f64::min)
    }

    /// Nearest start strictly after `t`.
    pub fn next_start_after(&self, t: Seconds) -> Option<Seconds> {
        self.elements
            .iter()
            .map(|e| e.window.start)
            .filter(|start| *start > t)
            .reduce(f64::min)
    }

    pub fn get(&self, id: ElementId) -> Option<&MediaElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.iter().any(|e| e.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaElement> {
        self.elements.iter()
    }

    pub fn elements(&self) -> &[MediaElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Select an element. Unknown ids leave the selection untouched.
    pub fn select(&mut self, id: ElementId) -> bool {
        if self.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    pub fn selected_element(&self) -> Option<&MediaElement> {
        self.selected.and_then(|id| self.get(id))
    }
}
