//! Control surface of an externally playable resource (a video element,
//! a decoder session) plus an in-memory stand-in used by the CLI and tests.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use timeline::Seconds;
use tracing::trace;

use crate::PlaybackError;

/// Readiness levels, ordered like media element ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyState {
    HaveNothing,
    HaveMetadata,
    HaveCurrentData,
    HaveFutureData,
    HaveEnoughData,
}

impl ReadyState {
    /// Enough data to start playback at the current position.
    pub fn can_play(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

pub trait PlayableResource: Send {
    /// Ask the resource to start playing. The resource may refuse.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn seek_to(&mut self, position: Seconds);
    fn current_position(&self) -> Seconds;
    fn ready_state(&self) -> ReadyState;
    fn set_visible(&mut self, visible: bool);
    fn set_muted(&mut self, muted: bool);
}

/// Shared handle, so a caller can keep observing a resource after handing
/// it to the engine.
impl<R: PlayableResource> PlayableResource for Arc<Mutex<R>> {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.lock().play()
    }

    fn pause(&mut self) {
        self.lock().pause()
    }

    fn seek_to(&mut self, position: Seconds) {
        self.lock().seek_to(position)
    }

    fn current_position(&self) -> Seconds {
        self.lock().current_position()
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready_state()
    }

    fn set_visible(&mut self, visible: bool) {
        self.lock().set_visible(visible)
    }

    fn set_muted(&mut self, muted: bool) {
        self.lock().set_muted(muted)
    }
}

/// Observable record of what the engine asked a [`SimulatedResource`] to do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceLog {
    pub plays: usize,
    pub pauses: usize,
    pub seeks: Vec<Seconds>,
}

/// Resource that tracks its own play head in memory.
///
/// `advance` moves the play head while playing, standing in for the
/// resource's internal clock between engine ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedResource {
    pub name: String,
    pub position: Seconds,
    pub playing: bool,
    pub visible: bool,
    pub muted: bool,
    pub ready: ReadyState,
    /// When set, `play` fails the way an autoplay policy would.
    pub refuse_play: bool,
    pub log: ResourceLog,
}

impl SimulatedResource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: 0.0,
            playing: false,
            visible: false,
            muted: false,
            ready: ReadyState::HaveEnoughData,
            refuse_play: false,
            log: ResourceLog::default(),
        }
    }

    pub fn loading(name: impl Into<String>) -> Self {
        Self {
            ready: ReadyState::HaveNothing,
            ..Self::new(name)
        }
    }

    pub fn advance(&mut self, dt: Seconds) {
        if self.playing {
            self.position += dt;
        }
    }
}

impl PlayableResource for SimulatedResource {
    fn play(&mut self) -> Result<(), PlaybackError> {
        self.log.plays += 1;
        if self.refuse_play {
            return Err(PlaybackError::PlaybackRefused(self.name.clone()));
        }
        self.playing = true;
        trace!(resource = %self.name, position = self.position, "play");
        Ok(())
    }

    fn pause(&mut self) {
        self.log.pauses += 1;
        self.playing = false;
    }

    fn seek_to(&mut self, position: Seconds) {
        self.log.seeks.push(position);
        self.position = position;
    }

    fn current_position(&self) -> Seconds {
        self.position
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_threshold() {
        assert!(!ReadyState::HaveNothing.can_play());
        assert!(!ReadyState::HaveMetadata.can_play());
        assert!(ReadyState::HaveCurrentData.can_play());
        assert!(ReadyState::HaveEnoughData.can_play());
    }

    #[test]
    fn simulated_resource_advances_only_while_playing() {
        let mut res = SimulatedResource::new("a");
        res.advance(1.0);
        assert_eq!(res.position, 0.0);
        res.play().unwrap();
        res.advance(0.5);
        assert_eq!(res.position, 0.5);
    }

    #[test]
    fn refused_play_reports_error() {
        let mut res = SimulatedResource::new("blocked");
        res.refuse_play = true;
        assert_eq!(
            res.play(),
            Err(PlaybackError::PlaybackRefused("blocked".to_string()))
        );
        assert!(!res.playing);
        assert_eq!(res.log.plays, 1);
    }

    #[test]
    fn shared_handle_forwards_to_inner() {
        let shared = Arc::new(Mutex::new(SimulatedResource::new("shared")));
        let mut handle: Box<dyn PlayableResource> = Box::new(shared.clone());
        handle.seek_to(3.0);
        handle.play().unwrap();
        let inner = shared.lock();
        assert!(inner.playing);
        assert_eq!(inner.position, 3.0);
    }
}
