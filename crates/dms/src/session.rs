//! Session statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Published session statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Whole seconds of active detection
    pub elapsed_seconds: u64,
    /// Alarm episodes raised this session
    pub alert_count: u32,
}

impl SessionStats {
    /// Elapsed time as `mm:ss` (minutes keep growing past 59)
    pub fn elapsed_display(&self) -> String {
        format_elapsed(self.elapsed_seconds)
    }
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            session_id: Uuid::nil(),
            started_at: DateTime::<Utc>::default(),
            elapsed_seconds: 0,
            alert_count: 0,
        }
    }
}

pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Accumulates active detection time and alert episodes.
///
/// Elapsed time is banked from absolute instants while running, so delayed
/// or coalesced ticks catch up instead of losing seconds. Pausing freezes
/// the counter and resuming continues from the frozen value.
#[derive(Debug, Clone)]
pub struct SessionAggregator {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    running_since: Option<Instant>,
    banked: Duration,
    elapsed_seconds: u64,
    alert_count: u32,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started_at: Utc::now(),
            running_since: None,
            banked: Duration::ZERO,
            elapsed_seconds: 0,
            alert_count: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    /// Start or continue counting from `now`
    pub fn resume(&mut self, now: Instant) {
        if self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    /// Stop counting, keeping everything accumulated so far
    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }

    /// Session clock tick. Ignored while paused.
    pub fn tick(&mut self, now: Instant) -> u64 {
        if let Some(since) = self.running_since {
            let total = self.banked + now.saturating_duration_since(since);
            self.elapsed_seconds = self.elapsed_seconds.max(total.as_secs());
        }
        self.elapsed_seconds
    }

    /// Count one alert episode
    pub fn record_alert(&mut self) -> u32 {
        self.alert_count += 1;
        self.alert_count
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id,
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds,
            alert_count: self.alert_count,
        }
    }
}

impl Default for SessionAggregator {
    fn default() -> Self {
        Self::new()
    }
}
