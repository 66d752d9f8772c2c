//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::ear::DEFAULT_EAR_THRESHOLD;
use crate::DmsError;

/// Accepted EAR threshold range
pub const EAR_THRESHOLD_RANGE: (f32, f32) = (0.1, 0.3);

/// Accepted closure delay range (seconds)
pub const CLOSURE_DELAY_RANGE: (f32, f32) = (1.0, 5.0);

/// DMS configuration
///
/// Every evaluation reads the values passed to it, so an update takes effect
/// on the next frame, including in the middle of a closure episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Average EAR below this value counts as closed
    pub ear_threshold: f32,

    /// Continuous closure needed before the alarm sounds (seconds)
    pub closure_delay_secs: f32,

    /// Allow the alarm to start
    pub alarm_enabled: bool,

    /// Process frames and run the session clock
    pub detection_enabled: bool,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: DEFAULT_EAR_THRESHOLD,
            closure_delay_secs: 2.0,
            alarm_enabled: true,
            detection_enabled: false,
        }
    }
}

impl DmsConfig {
    /// Create strict config (eyes count as closed sooner, shorter delay)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.25,
            closure_delay_secs: 1.0,
            ..Default::default()
        }
    }

    /// Create lenient config (lower threshold, longer delay)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.15,
            closure_delay_secs: 3.5,
            ..Default::default()
        }
    }

    /// Check the tunables against their accepted ranges
    pub fn validate(&self) -> Result<(), DmsError> {
        check_range("ear_threshold", self.ear_threshold, EAR_THRESHOLD_RANGE)?;
        check_range("closure_delay_secs", self.closure_delay_secs, CLOSURE_DELAY_RANGE)?;
        Ok(())
    }
}

fn check_range(field: &'static str, value: f32, (min, max): (f32, f32)) -> Result<(), DmsError> {
    // NaN fails both comparisons and is rejected here too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(DmsError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
