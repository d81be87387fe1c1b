//! Tenth-of-a-second timecode display (`MM:SS.D`) and manual time entry.

use crate::{Seconds, TimelineError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static TIME_INPUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}):(\d{2})\.(\d)$").expect("valid time input pattern"));

/// Largest time whose display still fits the two-digit minute field.
pub const MAX_TIMECODE: Seconds = 5999.9;

/// Round to one decimal place.
pub fn round_tenth(t: Seconds) -> Seconds {
    (t * 10.0).round() / 10.0
}

/// Timecode broken into display fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timecode {
    pub minutes: u64,
    pub seconds: u64,
    pub tenths: u64,
}

impl Timecode {
    /// Split a time into minutes, seconds and tenths. Negative and
    /// non-finite times display as zero.
    pub fn from_seconds(t: Seconds) -> Self {
        let total_tenths = if t.is_finite() && t > 0.0 {
            (t * 10.0).round() as u64
        } else {
            0
        };
        Self {
            minutes: total_tenths / 600,
            seconds: (total_tenths / 10) % 60,
            tenths: total_tenths % 10,
        }
    }

    pub fn to_seconds(&self) -> Seconds {
        let tenths = self.minutes * 600 + self.seconds * 10 + self.tenths;
        tenths as f64 / 10.0
    }

    /// Parse strictly `MM:SS.D`. Seconds above 59 are accepted as typed.
    pub fn parse(s: &str) -> Result<Self, TimelineError> {
        let invalid = || TimelineError::InvalidTimeText(s.to_string());
        let caps = TIME_INPUT.captures(s).ok_or_else(invalid)?;
        let field = |i: usize| -> Result<u64, TimelineError> {
            caps[i].parse::<u64>().map_err(|_| invalid())
        };
        Ok(Self {
            minutes: field(1)?,
            seconds: field(2)?,
            tenths: field(3)?,
        })
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}.{}", self.minutes, self.seconds, self.tenths)
    }
}

pub fn format_time(t: Seconds) -> String {
    Timecode::from_seconds(t).to_string()
}

/// Parse manual entry text into seconds, rounded to one decimal.
pub fn parse_time_input(s: &str) -> Result<Seconds, TimelineError> {
    Timecode::parse(s).map(|tc| round_tenth(tc.to_seconds()))
}

/// `current / max` display used by the transport bar.
pub fn format_position(current: Seconds, max: Seconds) -> String {
    format!("{} / {}", format_time(current), format_time(max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "00:00.0");
        assert_eq!(format_time(0.3), "00:00.3");
        assert_eq!(format_time(12.5), "00:12.5");
        assert_eq!(format_time(59.9), "00:59.9");
        assert_eq!(format_time(60.0), "01:00.0");
        assert_eq!(format_time(125.7), "02:05.7");
    }

    #[test]
    fn test_format_time_handles_float_noise() {
        assert_eq!(format_time(0.1 + 0.2), "00:00.3");
        assert_eq!(format_time(-1.0), "00:00.0");
        assert_eq!(format_time(f64::NAN), "00:00.0");
    }

    #[test]
    fn test_parse_time_input() {
        assert_eq!(parse_time_input("00:00.0"), Ok(0.0));
        assert_eq!(parse_time_input("00:15.3"), Ok(15.3));
        assert_eq!(parse_time_input("01:02.5"), Ok(62.5));
        assert_eq!(parse_time_input("00:75.0"), Ok(75.0));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for text in ["", "0:00.0", "00:00", "00:00.00", "00:00:00", " 00:00.0", "aa:bb.c", "00:00.0\n"] {
            assert_eq!(
                parse_time_input(text),
                Err(TimelineError::InvalidTimeText(text.to_string())),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_round_trip_every_tenth() {
        let last = (MAX_TIMECODE * 10.0).round() as u32;
        for tenths in 0..=last {
            let t = tenths as f64 / 10.0;
            let back = parse_time_input(&format_time(t)).unwrap();
            assert_eq!(round_tenth(back), round_tenth(t), "t = {t}");
        }
    }

    #[test]
    fn test_largest_timecode_stays_two_digit() {
        assert_eq!(format_time(MAX_TIMECODE), "99:59.9");
        assert_eq!(parse_time_input("99:59.9"), Ok(MAX_TIMECODE));
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(12.0, 60.0), "00:12.0 / 01:00.0");
    }
}
