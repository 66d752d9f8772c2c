//! Repeating siren alarm

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::sink::{AlertSink, PulseOutput};
use crate::{AlertConfig, Pulse, PulseKind};

/// Alert sink that pulses the siren until stopped.
///
/// The first pulse fires inside `start`, the rest from a background task on
/// the configured interval. Must be started from within a Tokio runtime.
pub struct ToneAlarm {
    config: AlertConfig,
    output: Arc<dyn PulseOutput>,
    repeater: Option<JoinHandle<()>>,
}

impl ToneAlarm {
    pub fn new(config: AlertConfig, output: Arc<dyn PulseOutput>) -> Self {
        info!("Creating tone alarm with config: {:?}", config);
        Self {
            config,
            output,
            repeater: None,
        }
    }

    fn pulse(&self, kind: PulseKind, index: u64) -> Pulse {
        Pulse {
            kind,
            siren: self.config.siren.clone(),
            index,
        }
    }
}

impl AlertSink for ToneAlarm {
    fn start(&mut self) {
        if self.repeater.is_some() {
            debug!("Alarm already sounding");
            return;
        }

        let period = self.config.pulse_interval();
        info!("Alarm sounding, pulse every {}ms", period.as_millis());

        self.output.emit(&self.pulse(PulseKind::Alarm, 1));
        self.output.vibrate(&self.config.haptic_pattern_ms);

        let output = Arc::clone(&self.output);
        let template = self.pulse(PulseKind::Alarm, 1);
        self.repeater = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut index = template.index;
            loop {
                ticker.tick().await;
                index += 1;
                output.emit(&Pulse {
                    index,
                    ..template.clone()
                });
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(repeater) = self.repeater.take() {
            repeater.abort();
            self.output.vibrate(&[]);
            info!("Alarm silenced");
        }
    }

    fn test_pulse(&mut self) {
        debug!("Test pulse requested");
        self.output.emit(&self.pulse(PulseKind::Test, 0));
        self.output.vibrate(&[self.config.test_haptic_ms]);
    }

    fn is_sounding(&self) -> bool {
        self.repeater.is_some()
    }
}

impl Drop for ToneAlarm {
    fn drop(&mut self) {
        if let Some(repeater) = self.repeater.take() {
            repeater.abort();
        }
    }
}
