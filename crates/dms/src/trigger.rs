//! Alarm trigger state machine

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::DmsConfig;

/// Alarm state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlarmState {
    #[default]
    Idle,
    Sounding,
}

/// Edge produced by an evaluation; the caller drives the alert sink from it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmTransition {
    /// Idle -> Sounding, once per closure episode
    Started,
    /// Sounding -> Idle
    Stopped,
}

/// Decides when an alert starts and stops.
///
/// Starting needs the alarm enabled, closed eyes and a closure at least as
/// long as the configured delay. Once sounding, only reopened eyes stop it:
/// switching the alarm off does not silence an alert already in progress.
#[derive(Debug, Clone, Default)]
pub struct AlarmTrigger {
    state: AlarmState,
    transitions: u64,
}

impl AlarmTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AlarmState {
        self.state
    }

    pub fn is_sounding(&self) -> bool {
        self.state == AlarmState::Sounding
    }

    /// Number of Idle -> Sounding edges seen
    pub fn starts(&self) -> u64 {
        self.transitions
    }

    /// Evaluate with the latest closure duration and configuration
    pub fn evaluate(
        &mut self,
        closure: Duration,
        eyes_closed: bool,
        config: &DmsConfig,
    ) -> Option<AlarmTransition> {
        match self.state {
            AlarmState::Idle => {
                let delay = config.closure_delay_secs;
                if config.alarm_enabled && eyes_closed && closure.as_secs_f32() >= delay {
                    self.state = AlarmState::Sounding;
                    self.transitions += 1;
                    info!(
                        "Alarm started after {:.2}s closed (delay {:.1}s)",
                        closure.as_secs_f32(),
                        delay
                    );
                    Some(AlarmTransition::Started)
                } else {
                    None
                }
            }
            AlarmState::Sounding => {
                if eyes_closed {
                    None
                } else {
                    self.state = AlarmState::Idle;
                    info!("Alarm stopped, eyes reopened");
                    Some(AlarmTransition::Stopped)
                }
            }
        }
    }

    /// Return to Idle without an eye observation (detection switched off)
    pub fn force_idle(&mut self) -> Option<AlarmTransition> {
        if self.is_sounding() {
            self.state = AlarmState::Idle;
            debug!("Alarm forced idle");
            Some(AlarmTransition::Stopped)
        } else {
            None
        }
    }
}
