use serde::{Deserialize, Serialize};
use timeline::{round_tenth, Seconds, TimelineRegistry, MAX_TIMECODE};

/// Result of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Clock was paused; nothing happened.
    Idle,
    Advanced,
    /// The tick would have left every window or reached `max_time`.
    AutoPaused,
}

/// Master playback clock. `current_time` stays in `[0, max_time]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    current_time: Seconds,
    playing: bool,
    max_time: Seconds,
}

impl Clock {
    /// `max_time` is capped at [`MAX_TIMECODE`].
    pub fn new(max_time: Seconds) -> Self {
        let max_time = if max_time.is_finite() && max_time > 0.0 {
            max_time.min(MAX_TIMECODE)
        } else {
            60.0
        };
        Self {
            current_time: 0.0,
            playing: false,
            max_time,
        }
    }

    pub fn current_time(&self) -> Seconds {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn max_time(&self) -> Seconds {
        self.max_time
    }

    /// Start playing if anything is visible now or starts later.
    /// Returns whether the clock is playing afterwards.
    pub fn play(&mut self, registry: &TimelineRegistry) -> bool {
        if !self.playing {
            let t = self.current_time;
            if registry.any_visible_at(t) || registry.next_start_after(t).is_some() {
                self.playing = true;
            }
        }
        self.playing
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Advance by `step` while playing. A tick that lands outside every
    /// window, or at/after `max_time`, pauses the clock and is discarded.
    pub fn tick(&mut self, step: Seconds, registry: &TimelineRegistry) -> TickOutcome {
        if !self.playing {
            return TickOutcome::Idle;
        }
        let next = round_tenth(self.current_time + step);
        if !registry.any_visible_at(next) || next >= self.max_time {
            self.playing = false;
            return TickOutcome::AutoPaused;
        }
        self.current_time = next;
        TickOutcome::Advanced
    }

    /// Move the play head. Clamped to `[0, max_time]`; non-finite input is ignored.
    pub fn seek(&mut self, t: Seconds) {
        if t.is_finite() {
            self.current_time = t.clamp(0.0, self.max_time);
        }
    }

    /// Change the timeline length. Non-positive values are ignored and
    /// anything past [`MAX_TIMECODE`] is capped.
    pub fn set_max_time(&mut self, max_time: Seconds) {
        if max_time.is_finite() && max_time > 0.0 {
            let max_time = max_time.min(MAX_TIMECODE);
            self.max_time = max_time;
            self.current_time = self.current_time.min(max_time);
        }
    }

    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.playing = false;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(60.0)
    }
}
