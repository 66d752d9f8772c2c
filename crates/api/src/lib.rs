//! DriverGuard Service
//!
//! Wires the detector feeder, the monitor runtime and the alert sink
//! together and serves the control API.

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod feeder;
mod routes;
pub mod runtime;
pub mod settings;

use alerting::{TerminalBell, ToneAlarm};
use dms::{DmsConfig, DmsError, FrameSnapshot, SessionStats};
use feeder::{DetectorFeeder, DetectorStatus};
use runtime::{MonitorCommand, MonitorRuntime};
use settings::{LogSettings, Settings};

/// Pending control commands before senders wait
const COMMAND_QUEUE: usize = 16;

/// How long shutdown waits for the runtime to release the alarm
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Application state shared across handlers
pub struct AppState {
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Latest monitor configuration; every write is seen by the runtime
    pub config: Arc<watch::Sender<DmsConfig>>,
    pub snapshots: watch::Receiver<FrameSnapshot>,
    pub session: watch::Receiver<SessionStats>,
    pub detector: watch::Receiver<DetectorStatus>,
    pub commands: mpsc::Sender<MonitorCommand>,
    /// Prometheus exporter, when enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Send a command to the runtime
    pub async fn command(&self, command: MonitorCommand) -> Result<(), ApiError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ApiError::MonitorStopped)
    }
}

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Configuration rejected: {0}")]
    InvalidConfig(#[from] DmsError),

    #[error("Unknown preset: {0}")]
    UnknownPreset(String),

    #[error("Monitor is not running")]
    MonitorStopped,

    #[error("Metrics exporter is disabled")]
    MetricsDisabled,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::UnknownPreset(_) | ApiError::MetricsDisabled => StatusCode::NOT_FOUND,
            ApiError::MonitorStopped => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        } else {
            warn!("{}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub monitor_running: bool,
    pub detector: DetectorStatus,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/state", get(routes::monitor::get_state))
        .route("/api/v1/session", get(routes::monitor::get_session))
        .route("/api/v1/session/reset", post(routes::alarm::reset_session))
        .route(
            "/api/v1/config",
            get(routes::config::get_config).put(routes::config::update_config),
        )
        .route("/api/v1/config/preset/:name", post(routes::config::apply_preset))
        .route("/api/v1/alarm/test", post(routes::alarm::test_alarm))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let monitor_running = !state.commands.is_closed();
    let status = if monitor_running { "healthy" } else { "degraded" };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        monitor_running,
        detector: state.detector.borrow().clone(),
    };

    Json(response)
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .ok_or(ApiError::MetricsDisabled)
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(settings: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .with_context(|| format!("Invalid log level: {}", settings.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

/// Run the monitor and serve the API until Ctrl-C
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let metrics = if settings.server.metrics {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install metrics recorder")?;
        Some(handle)
    } else {
        None
    };

    let (config_tx, config_rx) = watch::channel(settings.monitor.clone());
    let config = Arc::new(config_tx);
    let (frames_tx, frames_rx) = watch::channel(None);
    let (commands_tx, commands_rx) = mpsc::channel(COMMAND_QUEUE);

    let output = Arc::new(TerminalBell::new(settings.alert.terminal_bell));
    let sink = ToneAlarm::new(settings.alert.clone(), output);
    let (runtime, outputs) = MonitorRuntime::new(sink, config_rx, frames_rx, commands_rx);
    let monitor = tokio::spawn(runtime.run());

    let (feeder, detector) =
        DetectorFeeder::new(settings.source.clone(), Arc::clone(&config), Arc::new(frames_tx));
    let feeder = tokio::spawn(feeder.run());

    let state = Arc::new(AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: std::time::Instant::now(),
        config,
        snapshots: outputs.snapshots,
        session: outputs.session,
        detector,
        commands: commands_tx,
        metrics,
    });
    let app = create_router(state);

    info!("Starting API server on {}", settings.server.addr);

    let listener = tokio::net::TcpListener::bind(&settings.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last command sender, so the runtime now winds down
    feeder.abort();
    match tokio::time::timeout(SHUTDOWN_GRACE, monitor).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Monitor runtime failed: {}", e),
        Err(_) => warn!("Monitor runtime did not stop in time"),
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
