use thiserror::Error;

mod element;
pub use element::*;
mod registry;
pub use registry::*;
mod layout;
pub use layout::*;
pub mod timecode;
pub use timecode::{format_time, parse_time_input, round_tenth, MAX_TIMECODE};

/// Timeline position in seconds.
pub type Seconds = f64;

#[derive(Debug, Error, PartialEq)]
pub enum TimelineError {
    #[error("invalid time text {0:?}, expected MM:SS.D")]
    InvalidTimeText(String),
    #[error("element not found: {0}")]
    ElementNotFound(ElementId),
}
