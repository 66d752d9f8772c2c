//! Monitor Routes

use axum::{extract::State, Json};
use dms::{EyeStatus, FrameSnapshot, SessionStats};
use serde::Serialize;
use std::sync::Arc;

use crate::feeder::DetectorStatus;
use crate::AppState;

/// Response for the live state endpoint
#[derive(Debug, Serialize)]
pub struct StateResponse {
    #[serde(flatten)]
    pub snapshot: FrameSnapshot,
    pub eye_status: EyeStatus,
    pub status_label: &'static str,
    pub hint: &'static str,
    /// Closure as a fraction of the configured delay
    pub closure_progress: f32,
    pub monitoring: bool,
    pub detector: DetectorStatus,
}

/// Response for the session endpoint
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(flatten)]
    pub stats: SessionStats,
    /// Elapsed time as mm:ss
    pub elapsed_display: String,
}

/// Get the latest frame evaluation
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let snapshot = state.snapshots.borrow().clone();
    let config = state.config.borrow().clone();
    let eye_status = snapshot.eye_status();

    Json(StateResponse {
        closure_progress: snapshot.closure_progress(config.closure_delay_secs),
        status_label: eye_status.label(),
        hint: eye_status.hint(),
        eye_status,
        monitoring: config.detection_enabled,
        detector: state.detector.borrow().clone(),
        snapshot,
    })
}

/// Get session statistics
pub async fn get_session(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    let stats = state.session.borrow().clone();
    Json(SessionResponse {
        elapsed_display: stats.elapsed_display(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use crate::create_router;
    use crate::test_support::{body_json, fixture};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use dms::{AlarmState, FrameSnapshot};
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_state_reports_closure_progress() {
        let fx = fixture();
        fx.snapshots.send_replace(FrameSnapshot {
            face_detected: true,
            eyes_closed: true,
            left_ear: 0.12,
            right_ear: 0.14,
            average_ear: 0.13,
            closure_secs: 1.0,
            alarm: AlarmState::Idle,
            sequence: 42,
            timestamp_ms: 1400,
        });

        let response = create_router(fx.state.clone())
            .oneshot(get("/api/v1/state"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["eye_status"], "closed");
        assert_eq!(body["status_label"], "EYES CLOSED");
        assert_eq!(body["closure_progress"], 0.5);
        assert_eq!(body["alarm"], "Idle");
        assert_eq!(body["sequence"], 42);
        assert_eq!(body["monitoring"], false);
        assert_eq!(body["detector"]["state"], "disabled");
    }

    #[tokio::test]
    async fn test_state_without_face() {
        let fx = fixture();
        let response = create_router(fx.state.clone())
            .oneshot(get("/api/v1/state"))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["eye_status"], "no_face");
        assert_eq!(body["status_label"], "NO FACE");
        assert_eq!(body["closure_progress"], 0.0);
    }

    #[tokio::test]
    async fn test_session_display() {
        let fx = fixture();
        fx.session.send_modify(|stats| {
            stats.elapsed_seconds = 125;
            stats.alert_count = 3;
        });

        let response = create_router(fx.state.clone())
            .oneshot(get("/api/v1/session"))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["elapsed_seconds"], 125);
        assert_eq!(body["elapsed_display"], "02:05");
        assert_eq!(body["alert_count"], 3);
    }
}
