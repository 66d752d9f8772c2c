//! Alerting System
//!
//! Drives the audible/haptic drowsiness alert: a repeating siren while the
//! alarm sounds, plus a one-shot test pulse.

mod sink;
mod tone;

pub use sink::{AlertSink, PulseOutput, TerminalBell};
pub use tone::ToneAlarm;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Siren sweep played for each pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SirenProfile {
    /// Start and end frequency (Hz)
    pub base_hz: f32,
    /// Frequency at the middle of the sweep (Hz)
    pub peak_hz: f32,
    /// Length of one pulse (ms)
    pub duration_ms: u64,
}

impl Default for SirenProfile {
    fn default() -> Self {
        Self {
            base_hz: 800.0,
            peak_hz: 1200.0,
            duration_ms: 500,
        }
    }
}

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Gap between siren pulses while sounding (ms)
    pub pulse_interval_ms: u64,
    /// Tone of each pulse
    pub siren: SirenProfile,
    /// Vibration pattern requested when the alarm starts (on/off ms)
    pub haptic_pattern_ms: Vec<u64>,
    /// Vibration for the test pulse (ms)
    pub test_haptic_ms: u64,
    /// Ring the terminal bell on each pulse
    pub terminal_bell: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            pulse_interval_ms: 600,
            siren: SirenProfile::default(),
            haptic_pattern_ms: vec![500, 200, 500, 200, 500, 200, 500],
            test_haptic_ms: 200,
            terminal_bell: true,
        }
    }
}

impl AlertConfig {
    pub fn pulse_interval(&self) -> Duration {
        Duration::from_millis(self.pulse_interval_ms.max(1))
    }
}

/// Why a pulse was emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulseKind {
    /// Part of a sounding alarm
    Alarm,
    /// Manual test from the control surface
    Test,
}

/// One audible pulse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub kind: PulseKind,
    pub siren: SirenProfile,
    /// Pulses emitted since the alarm started (1-based, 0 for tests)
    pub index: u64,
}
