//! Alarm and session control routes

use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use crate::runtime::MonitorCommand;
use crate::{ApiError, AppState};

/// Fire one test pulse on the alert sink
pub async fn test_alarm(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.command(MonitorCommand::TestAlarm).await?;
    Ok(StatusCode::ACCEPTED)
}

/// Discard the session and start a new one
pub async fn reset_session(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.command(MonitorCommand::ResetSession).await?;
    Ok(StatusCode::ACCEPTED)
}
