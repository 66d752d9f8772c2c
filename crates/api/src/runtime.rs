//! Monitor runtime
//!
//! One task owns the `DmsModule` and the alert sink. Frames, the closure
//! sampling clock, the session clock, configuration changes and commands
//! are handled one at a time, so core state is never mutated concurrently.

use alerting::AlertSink;
use dms::{AlarmTransition, DmsConfig, DmsModule, FrameOutcome, FrameSnapshot, SessionStats};
use landmarks::LandmarkFrame;
use metrics::{counter, gauge};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info};

/// Closure duration sampling period
pub const CLOSURE_SAMPLE_PERIOD: Duration = Duration::from_millis(100);

/// Session clock period
pub const SESSION_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Requests from the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorCommand {
    /// Fire one test pulse on the alert sink
    TestAlarm,
    /// Discard the session and start a new one
    ResetSession,
}

/// Receiving ends of the runtime's published state
pub struct MonitorOutputs {
    pub snapshots: watch::Receiver<FrameSnapshot>,
    pub session: watch::Receiver<SessionStats>,
}

/// Single-consumer evaluation loop
pub struct MonitorRuntime<S> {
    module: DmsModule,
    sink: S,
    config: watch::Receiver<DmsConfig>,
    frames: watch::Receiver<Option<LandmarkFrame>>,
    commands: mpsc::Receiver<MonitorCommand>,
    snapshots: watch::Sender<FrameSnapshot>,
    session: watch::Sender<SessionStats>,
    active: bool,
}

fn now() -> std::time::Instant {
    tokio::time::Instant::now().into_std()
}

fn ticker(period: Duration) -> Interval {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

impl<S: AlertSink> MonitorRuntime<S> {
    pub fn new(
        sink: S,
        config: watch::Receiver<DmsConfig>,
        frames: watch::Receiver<Option<LandmarkFrame>>,
        commands: mpsc::Receiver<MonitorCommand>,
    ) -> (Self, MonitorOutputs) {
        let module = DmsModule::new();
        let (snapshots, snapshots_rx) = watch::channel(FrameSnapshot::default());
        let (session, session_rx) = watch::channel(module.session_stats());

        let runtime = Self {
            module,
            sink,
            config,
            frames,
            commands,
            snapshots,
            session,
            active: false,
        };
        let outputs = MonitorOutputs {
            snapshots: snapshots_rx,
            session: session_rx,
        };
        (runtime, outputs)
    }

    /// Run until the configuration holder, the frame channel or the command
    /// channel closes
    pub async fn run(mut self) {
        info!("Starting monitor runtime");

        let mut samples = ticker(CLOSURE_SAMPLE_PERIOD);
        let mut session_clock = ticker(SESSION_TICK_PERIOD);

        let enabled = self.config.borrow_and_update().detection_enabled;
        self.set_active(enabled, &mut session_clock);

        loop {
            tokio::select! {
                changed = self.config.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let enabled = self.config.borrow_and_update().detection_enabled;
                    self.set_active(enabled, &mut session_clock);
                }
                changed = self.frames.changed(), if self.active => {
                    if changed.is_err() {
                        break;
                    }
                    let frame = self.frames.borrow_and_update().clone();
                    if let Some(frame) = frame {
                        self.on_frame(&frame);
                    }
                }
                _ = samples.tick(), if self.active => {
                    let config = self.config.borrow().clone();
                    let outcome = self.module.sample(&config, now());
                    self.publish(outcome);
                }
                _ = session_clock.tick(), if self.active => {
                    let stats = self.module.tick_session(now());
                    self.session.send_replace(stats);
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
            }
        }

        self.sink.stop();
        info!("Monitor runtime stopped");
    }

    fn on_frame(&mut self, frame: &LandmarkFrame) {
        // Latest configuration on every frame
        let config = self.config.borrow().clone();
        let outcome = self.module.process(frame, &config, now());
        counter!("driver_guard_frames_total").increment(1);
        if !outcome.snapshot.face_detected {
            counter!("driver_guard_no_face_frames_total").increment(1);
        }
        self.publish(outcome);
    }

    fn publish(&mut self, outcome: FrameOutcome) {
        match outcome.transition {
            Some(AlarmTransition::Started) => {
                self.sink.start();
                counter!("driver_guard_alerts_total").increment(1);
                self.session.send_replace(self.module.session_stats());
            }
            Some(AlarmTransition::Stopped) => self.sink.stop(),
            None => {}
        }

        let snapshot = outcome.snapshot;
        gauge!("driver_guard_average_ear").set(snapshot.average_ear as f64);
        gauge!("driver_guard_closure_seconds").set(snapshot.closure_secs as f64);
        self.snapshots.send_replace(snapshot);
    }

    fn set_active(&mut self, enabled: bool, session_clock: &mut Interval) {
        if enabled == self.active {
            return;
        }
        self.active = enabled;
        let now = now();

        if enabled {
            info!("Detection enabled");
            self.module.resume(now);
            session_clock.reset();
            // Anything delivered while paused is stale
            self.frames.borrow_and_update();
        } else {
            info!("Detection disabled");
            if self.module.suspend(now).is_some() {
                debug!("Alarm released on suspend");
            }
            self.sink.stop();
            self.snapshots.send_replace(self.module.snapshot(now));
            self.session.send_replace(self.module.session_stats());
        }
    }

    fn on_command(&mut self, command: MonitorCommand) {
        match command {
            MonitorCommand::TestAlarm => self.sink.test_pulse(),
            MonitorCommand::ResetSession => {
                info!("Session reset");
                self.sink.stop();
                self.module.reset_state();
                if self.active {
                    self.module.resume(now());
                }
                self.snapshots.send_replace(self.module.snapshot(now()));
                self.session.send_replace(self.module.session_stats());
            }
        }
    }
}
