//! Alert sink and pulse output traits

use std::io::Write;
use tracing::{debug, info};

use crate::{Pulse, PulseKind};

/// Receiver of alarm edges from the trigger.
///
/// `start` while started and `stop` while stopped are no-ops.
pub trait AlertSink: Send {
    fn start(&mut self);
    fn stop(&mut self);
    /// Single pulse that leaves the alarm state alone
    fn test_pulse(&mut self);
    fn is_sounding(&self) -> bool;
}

/// Device that renders pulses and vibrations
pub trait PulseOutput: Send + Sync {
    fn emit(&self, pulse: &Pulse);
    /// Request a vibration pattern (on/off ms); empty cancels vibration
    fn vibrate(&self, pattern_ms: &[u64]);
}

/// Rings the terminal bell and logs each pulse
#[derive(Debug, Clone, Default)]
pub struct TerminalBell {
    pub bell: bool,
}

impl TerminalBell {
    pub fn new(bell: bool) -> Self {
        Self { bell }
    }
}

impl PulseOutput for TerminalBell {
    fn emit(&self, pulse: &Pulse) {
        match pulse.kind {
            PulseKind::Alarm => info!(
                "ALARM pulse #{} ({:.0}-{:.0} Hz, {}ms)",
                pulse.index, pulse.siren.base_hz, pulse.siren.peak_hz, pulse.siren.duration_ms
            ),
            PulseKind::Test => info!("Test pulse"),
        }
        if self.bell {
            let mut stderr = std::io::stderr();
            // Bell is best effort
            let _ = stderr.write_all(b"\x07").and_then(|_| stderr.flush());
        }
    }

    fn vibrate(&self, pattern_ms: &[u64]) {
        if pattern_ms.is_empty() {
            debug!("Vibration cancelled");
        } else {
            debug!("Vibration requested: {:?}", pattern_ms);
        }
    }
}
