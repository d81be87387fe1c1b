use serde::{Deserialize, Serialize};
use std::time::Duration;
use timeline::{Seconds, Size, TimeWindow, MAX_TIMECODE};

use crate::PlaybackError;

/// Session-wide tunables. Every field has a default so partial JSON files load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound of the timeline in seconds.
    pub max_time: Seconds,
    /// Clock advance per tick.
    pub tick_step: Seconds,
    /// Wall-clock cadence of the tick in the live runtime.
    pub tick_interval_ms: u64,
    /// Drift tolerated before a resource is re-seeked.
    pub resync_threshold: Seconds,
    /// Window given to newly decoded media.
    pub default_window: TimeWindow,
    /// Box that decoded media is fitted into.
    pub fit_box: Size,
    pub preview_size: Size,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_time: 60.0,
            tick_step: 0.1,
            tick_interval_ms: 100,
            resync_threshold: 0.1,
            default_window: TimeWindow::new(0.0, 10.0),
            fit_box: Size::new(320.0, 240.0),
            preview_size: Size::new(640.0, 360.0),
            max_width: 1920,
            max_height: 1080,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, PlaybackError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| PlaybackError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.max_time) {
            return Err(PlaybackError::InvalidConfig(format!(
                "max_time must be > 0, got {}",
                self.max_time
            )));
        }
        if self.max_time > MAX_TIMECODE {
            return Err(PlaybackError::InvalidConfig(format!(
                "max_time must be <= {MAX_TIMECODE}, got {}",
                self.max_time
            )));
        }
        // Ticks land on tenths
        let tenths = self.tick_step * 10.0;
        let whole_tenths = tenths.round() >= 1.0 && (tenths - tenths.round()).abs() < 1e-9;
        if !positive(self.tick_step) || !whole_tenths {
            return Err(PlaybackError::InvalidConfig(format!(
                "tick_step must be a positive multiple of 0.1, got {}",
                self.tick_step
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(PlaybackError::InvalidConfig(
                "tick_interval_ms must be > 0".to_string(),
            ));
        }
        if !(self.resync_threshold.is_finite() && self.resync_threshold >= 0.0) {
            return Err(PlaybackError::InvalidConfig(format!(
                "resync_threshold must be >= 0, got {}",
                self.resync_threshold
            )));
        }
        let w = self.default_window;
        if !(w.start.is_finite() && w.end.is_finite() && 0.0 <= w.start && w.start < w.end) {
            return Err(PlaybackError::InvalidConfig(format!(
                "default_window must satisfy 0 <= start < end, got [{}, {})",
                w.start, w.end
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor() {
        let config = EngineConfig::default();
        assert_eq!(config.max_time, 60.0);
        assert_eq!(config.tick_step, 0.1);
        assert_eq!(config.tick_interval(), Duration::from_millis(100));
        assert_eq!(config.default_window, TimeWindow::new(0.0, 10.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{ "max_time": 30.0 }"#).unwrap();
        assert_eq!(config.max_time, 30.0);
        assert_eq!(config.resync_threshold, 0.1);
    }

    #[test]
    fn rejects_non_positive_max_time() {
        let err = EngineConfig::from_json(r#"{ "max_time": 0.0 }"#).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_max_time_past_timecode_range() {
        let err = EngineConfig::from_json(r#"{ "max_time": 7200.0 }"#).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidConfig(_)));
        assert!(EngineConfig::from_json(r#"{ "max_time": 5999.9 }"#).is_ok());
    }

    #[test]
    fn tick_step_must_be_whole_tenths() {
        for bad in [0.04, 0.05, 0.15, 0.0, -0.1] {
            let config = EngineConfig {
                tick_step: bad,
                ..EngineConfig::default()
            };
            assert!(config.validate().is_err(), "{bad} accepted");
        }
        for good in [0.1, 0.2, 0.3, 1.0] {
            let config = EngineConfig {
                tick_step: good,
                ..EngineConfig::default()
            };
            assert!(config.validate().is_ok(), "{good} rejected");
        }
    }

    #[test]
    fn rejects_inverted_default_window() {
        let config = EngineConfig {
            default_window: TimeWindow::new(5.0, 5.0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(EngineConfig::from_json("{ nope").is_err());
    }
}
