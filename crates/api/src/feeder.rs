//! Detector feeder
//!
//! Pulls results from the landmark source at the configured rate and
//! publishes the newest one for the monitor runtime. Slow consumers only
//! ever see the latest frame.

use dms::{DmsConfig, DmsError};
use landmarks::{LandmarkError, LandmarkFrame, LandmarkSource, ReplaySource, SourceConfig};
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Detector lifecycle as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetectorStatus {
    #[default]
    Disabled,
    Loading,
    Running,
    /// Acquisition failed; detection stays off until the user re-enables it
    Unavailable { reason: String },
}

enum StreamEnd {
    Disabled,
    /// End of replay after delivering this many frames
    Exhausted(u64),
}

/// Moves detector results into the frame channel
pub struct DetectorFeeder {
    source: SourceConfig,
    config: Arc<watch::Sender<DmsConfig>>,
    frames: Arc<watch::Sender<Option<LandmarkFrame>>>,
    status: watch::Sender<DetectorStatus>,
}

impl DetectorFeeder {
    pub fn new(
        source: SourceConfig,
        config: Arc<watch::Sender<DmsConfig>>,
        frames: Arc<watch::Sender<Option<LandmarkFrame>>>,
    ) -> (Self, watch::Receiver<DetectorStatus>) {
        let (status, status_rx) = watch::channel(DetectorStatus::Disabled);
        let feeder = Self {
            source,
            config,
            frames,
            status,
        };
        (feeder, status_rx)
    }

    pub async fn run(self) {
        let mut config_rx = self.config.subscribe();

        loop {
            if config_rx.wait_for(|c| c.detection_enabled).await.is_err() {
                break;
            }
            self.status.send_replace(DetectorStatus::Loading);

            let source = match self.open().await {
                Ok(source) => source,
                Err(e) => {
                    self.unavailable(e);
                    continue;
                }
            };

            self.status.send_replace(DetectorStatus::Running);
            match self.stream(source, &mut config_rx).await {
                Ok(StreamEnd::Disabled) => {
                    self.status.send_replace(DetectorStatus::Disabled);
                }
                // Restarting a replay with nothing in it would spin
                Ok(StreamEnd::Exhausted(0)) => self.unavailable(LandmarkError::Empty),
                Ok(StreamEnd::Exhausted(_)) if self.source.loop_replay => {
                    info!("Landmark replay finished, restarting");
                }
                Ok(StreamEnd::Exhausted(_)) => {
                    info!("Landmark replay finished, stopping detection");
                    self.status.send_replace(DetectorStatus::Disabled);
                    self.config.send_modify(|c| c.detection_enabled = false);
                }
                Err(e) => self.unavailable(e),
            }
        }
    }

    async fn open(&self) -> Result<impl LandmarkSource, LandmarkError> {
        let path = self.source.path.as_ref().ok_or(LandmarkError::NotConfigured)?;
        ReplaySource::open(path).await
    }

    async fn stream(
        &self,
        mut source: impl LandmarkSource,
        config_rx: &mut watch::Receiver<DmsConfig>,
    ) -> Result<StreamEnd, LandmarkError> {
        let mut pacing = interval(self.source.frame_interval());
        pacing.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut delivered: u64 = 0;

        loop {
            tokio::select! {
                changed = config_rx.changed() => {
                    if changed.is_err() || !config_rx.borrow_and_update().detection_enabled {
                        return Ok(StreamEnd::Disabled);
                    }
                }
                _ = pacing.tick() => {
                    match source.next_frame().await {
                        Ok(Some(frame)) => {
                            delivered += 1;
                            self.frames.send_replace(Some(frame));
                        }
                        Ok(None) => return Ok(StreamEnd::Exhausted(delivered)),
                        Err(e @ LandmarkError::Parse { .. }) => {
                            // Unreadable result counts as a frame without a face
                            warn!("Dropping detector result: {}", e);
                            counter!("driver_guard_detector_errors_total").increment(1);
                            delivered += 1;
                            self.frames.send_replace(Some(LandmarkFrame::no_face(0, delivered)));
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
    }

    fn unavailable(&self, cause: LandmarkError) {
        let e = DmsError::DetectorUnavailable(cause.to_string());
        error!("{}", e);
        self.status.send_replace(DetectorStatus::Unavailable {
            reason: cause.to_string(),
        });
        self.config.send_modify(|c| c.detection_enabled = false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn enabled_config() -> Arc<watch::Sender<DmsConfig>> {
        let (tx, _rx) = watch::channel(DmsConfig {
            detection_enabled: true,
            ..Default::default()
        });
        Arc::new(tx)
    }

    fn replay_file(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("driver-guard-{}.jsonl", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn wait_status(
        status: &mut watch::Receiver<DetectorStatus>,
        want: impl Fn(&DetectorStatus) -> bool,
    ) -> DetectorStatus {
        tokio::time::timeout(Duration::from_secs(5), status.wait_for(|s| want(s)))
            .await
            .expect("status timeout")
            .unwrap()
            .clone()
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let config = enabled_config();
        let (frames, _frames_rx) = watch::channel(None);
        let (feeder, mut status) = DetectorFeeder::new(SourceConfig::default(), config.clone(), Arc::new(frames));
        tokio::spawn(feeder.run());

        let state = wait_status(&mut status, |s| matches!(s, DetectorStatus::Unavailable { .. })).await;
        assert!(matches!(state, DetectorStatus::Unavailable { reason } if reason.contains("No landmark source")));
        assert!(!config.borrow().detection_enabled);
    }

    #[tokio::test]
    async fn test_replay_delivers_and_stops_at_end() {
        let path = replay_file(concat!(
            "{\"timestamp_ms\":0,\"landmarks\":null}\n",
            "garbage\n",
            "{\"timestamp_ms\":66,\"landmarks\":[{\"x\":0.5,\"y\":0.5}]}\n",
        ));
        let config = enabled_config();
        let (frames, mut frames_rx) = watch::channel(None);
        let source = SourceConfig {
            path: Some(path.clone()),
            fps: 200,
            loop_replay: false,
        };
        let (feeder, mut status) = DetectorFeeder::new(source, config.clone(), Arc::new(frames));
        tokio::spawn(feeder.run());

        // Wait for the last frame of the replay
        tokio::time::timeout(
            Duration::from_secs(5),
            frames_rx.wait_for(|f| matches!(f, Some(frame) if frame.timestamp_ms == 66)),
        )
        .await
        .expect("frame timeout")
        .unwrap();

        wait_status(&mut status, |s| *s == DetectorStatus::Disabled).await;
        tokio::time::timeout(Duration::from_secs(5), async {
            while config.borrow().detection_enabled {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("detection still enabled");

        std::fs::remove_file(path).ok();
    }

    #[tokio::test]
    async fn test_empty_looping_replay_is_unavailable() {
        let path = replay_file("\n   \n");
        let config = enabled_config();
        let (frames, frames_rx) = watch::channel(None);
        let source = SourceConfig {
            path: Some(path.clone()),
            fps: 30,
            loop_replay: true,
        };
        let (feeder, mut status) = DetectorFeeder::new(source, config.clone(), Arc::new(frames));
        tokio::spawn(feeder.run());

        let state = wait_status(&mut status, |s| matches!(s, DetectorStatus::Unavailable { .. })).await;
        assert!(matches!(state, DetectorStatus::Unavailable { reason } if reason.contains("no frames")));
        assert!(!config.borrow().detection_enabled);
        assert!(frames_rx.borrow().is_none());

        // Stays parked instead of reopening the file
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(*status.borrow(), DetectorStatus::Unavailable { .. }));

        std::fs::remove_file(path).ok();
    }
}
