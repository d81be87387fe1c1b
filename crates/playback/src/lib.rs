use thiserror::Error;

pub mod clock;
pub mod command;
pub mod config;
pub mod gesture;
pub mod resource;
pub mod session;
pub mod snapshot;
pub mod sync;

pub use clock::{Clock, TickOutcome};
pub use command::{apply_command, CommandOutcome, SessionCommand};
pub use config::EngineConfig;
pub use gesture::{GestureResolver, GestureState, TrimEdge};
pub use resource::{PlayableResource, ReadyState, SimulatedResource};
pub use session::{DecodedMedia, EditorSession, TimeEntry};
pub use snapshot::{ElementView, SessionSnapshot};
pub use sync::{MediaSyncDriver, SessionContext, SyncState};

#[derive(Debug, Error, PartialEq)]
pub enum PlaybackError {
    #[error("resource refused playback: {0}")]
    PlaybackRefused(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
