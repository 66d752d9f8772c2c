//! Per-frame monitor output

use serde::{Deserialize, Serialize};

use crate::state::EyeStatus;
use crate::trigger::{AlarmState, AlarmTransition};

/// State published after every frame or closure sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    /// Whether the detector found a face
    pub face_detected: bool,

    /// Average EAR below threshold (always false without a face)
    pub eyes_closed: bool,

    /// Left eye EAR (last reading is kept while no face is visible)
    pub left_ear: f32,

    /// Right eye EAR
    pub right_ear: f32,

    /// Mean of both eyes
    pub average_ear: f32,

    /// Current continuous closure (seconds)
    pub closure_secs: f32,

    /// Alarm state after this evaluation
    pub alarm: AlarmState,

    /// Detector sequence number of the frame behind this snapshot
    pub sequence: u64,

    /// Detector timestamp (milliseconds)
    pub timestamp_ms: u64,
}

impl FrameSnapshot {
    pub fn eye_status(&self) -> EyeStatus {
        EyeStatus::from_flags(self.face_detected, self.eyes_closed)
    }

    /// Fraction of the closure delay elapsed, capped at 1
    pub fn closure_progress(&self, delay_secs: f32) -> f32 {
        if delay_secs <= 0.0 {
            return 1.0;
        }
        (self.closure_secs / delay_secs).clamp(0.0, 1.0)
    }
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub snapshot: FrameSnapshot,
    /// Alarm edge the alert sink must follow, if any
    pub transition: Option<AlarmTransition>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_progress() {
        let snapshot = FrameSnapshot {
            face_detected: true,
            eyes_closed: true,
            closure_secs: 1.0,
            ..Default::default()
        };
        assert!((snapshot.closure_progress(2.0) - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.closure_progress(0.5), 1.0);
        assert_eq!(snapshot.eye_status(), EyeStatus::Closed);
    }

    #[test]
    fn test_serializes_alarm_state() {
        let snapshot = FrameSnapshot {
            alarm: AlarmState::Sounding,
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["alarm"], "Sounding");
        assert_eq!(json["face_detected"], false);
    }
}
