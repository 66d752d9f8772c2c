//! Driver Monitoring System (DMS)
//!
//! Eye-closure drowsiness detection over face-mesh landmarks:
//! - Eye aspect ratio (EAR) per eye and averaged
//! - Closed/open classification against a threshold
//! - Continuous closure timing
//! - Alarm trigger with once-per-episode debounce
//! - Session time and alert statistics
//!
//! Everything here is synchronous and clock-agnostic: callers pass the
//! current `Instant` and the latest `DmsConfig` into every evaluation.

pub mod analysis;
pub mod closure;
pub mod config;
pub mod ear;
pub mod session;
pub mod state;
pub mod trigger;

pub use analysis::{FrameOutcome, FrameSnapshot};
pub use closure::ClosureTimer;
pub use config::DmsConfig;
pub use ear::{calculate_ear, eyes_closed, EarReading};
pub use session::{SessionAggregator, SessionStats};
pub use state::EyeStatus;
pub use trigger::{AlarmState, AlarmTransition, AlarmTrigger};

use landmarks::LandmarkFrame;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("Landmark detector unavailable: {0}")]
    DetectorUnavailable(String),
}

/// Drowsiness monitor for one camera session.
///
/// Owns the closure timer, alarm trigger and session statistics. Frame
/// evaluation and closure sampling mutate that state in place, so a single
/// task must drive it.
pub struct DmsModule {
    closure: ClosureTimer,
    trigger: AlarmTrigger,
    session: SessionAggregator,
    ear: EarReading,
    face_detected: bool,
    eyes_closed: bool,
    sequence: u64,
    timestamp_ms: u64,
    face_absent_frames: u32,
}

impl DmsModule {
    pub fn new() -> Self {
        Self {
            closure: ClosureTimer::new(),
            trigger: AlarmTrigger::new(),
            session: SessionAggregator::new(),
            ear: EarReading::default(),
            face_detected: false,
            eyes_closed: false,
            sequence: 0,
            timestamp_ms: 0,
            face_absent_frames: 0,
        }
    }

    /// Analyze one detector result
    pub fn process(&mut self, frame: &LandmarkFrame, config: &DmsConfig, now: Instant) -> FrameOutcome {
        self.sequence = frame.sequence;
        self.timestamp_ms = frame.timestamp_ms;
        self.face_detected = frame.face_detected();

        if self.face_detected {
            self.face_absent_frames = 0;
            self.ear = EarReading::from_frame(frame);
            self.eyes_closed = eyes_closed(self.ear.average, config.ear_threshold);
        } else {
            self.face_absent_frames += 1;
            self.eyes_closed = false;
            if self.face_absent_frames == 1 {
                debug!("Face lost at frame {}", frame.sequence);
            }
        }

        self.evaluate(config, now)
    }

    /// Re-evaluate the last observation at `now`. Driven by the closure
    /// sampling clock so the duration and the trigger advance between frames.
    pub fn sample(&mut self, config: &DmsConfig, now: Instant) -> FrameOutcome {
        self.evaluate(config, now)
    }

    fn evaluate(&mut self, config: &DmsConfig, now: Instant) -> FrameOutcome {
        let closure = self.closure.update(self.face_detected, self.eyes_closed, now);
        let transition = self.trigger.evaluate(closure, self.eyes_closed, config);
        if transition == Some(AlarmTransition::Started) {
            self.session.record_alert();
        }

        FrameOutcome {
            snapshot: self.snapshot_at(closure),
            transition,
        }
    }

    fn snapshot_at(&self, closure: Duration) -> FrameSnapshot {
        FrameSnapshot {
            face_detected: self.face_detected,
            eyes_closed: self.eyes_closed,
            left_ear: self.ear.left,
            right_ear: self.ear.right,
            average_ear: self.ear.average,
            closure_secs: closure.as_secs_f32(),
            alarm: self.trigger.state(),
            sequence: self.sequence,
            timestamp_ms: self.timestamp_ms,
        }
    }

    /// Snapshot of the current state at `now`
    pub fn snapshot(&self, now: Instant) -> FrameSnapshot {
        self.snapshot_at(self.closure.duration(now))
    }

    /// Detection switched off: end the closure episode, force the alarm
    /// idle and freeze the session clock. Counters are left untouched.
    pub fn suspend(&mut self, now: Instant) -> Option<AlarmTransition> {
        self.closure.reset();
        self.face_detected = false;
        self.eyes_closed = false;
        self.session.pause(now);
        self.trigger.force_idle()
    }

    /// Detection switched on: the session clock continues
    pub fn resume(&mut self, now: Instant) {
        self.session.resume(now);
    }

    /// Session clock tick
    pub fn tick_session(&mut self, now: Instant) -> SessionStats {
        self.session.tick(now);
        self.session.stats()
    }

    pub fn session_stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.trigger.state()
    }

    /// Start a new session (driver change)
    pub fn reset_state(&mut self) {
        *self = Self::new();
    }
}

impl Default for DmsModule {
    fn default() -> Self {
        Self::new()
    }
}
