//! Configuration Routes

use axum::{
    extract::{Path, State},
    Json,
};
use dms::{DmsConfig, DmsError};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::{ApiError, AppState};

/// Partial configuration update; absent fields keep their value
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    pub ear_threshold: Option<f32>,
    pub closure_delay_secs: Option<f32>,
    pub alarm_enabled: Option<bool>,
    pub detection_enabled: Option<bool>,
}

impl ConfigPatch {
    pub fn apply(&self, config: &DmsConfig) -> DmsConfig {
        DmsConfig {
            ear_threshold: self.ear_threshold.unwrap_or(config.ear_threshold),
            closure_delay_secs: self.closure_delay_secs.unwrap_or(config.closure_delay_secs),
            alarm_enabled: self.alarm_enabled.unwrap_or(config.alarm_enabled),
            detection_enabled: self.detection_enabled.unwrap_or(config.detection_enabled),
        }
    }
}

/// Replace the configuration through `update` if the result is valid.
/// Nothing is published when validation fails or nothing changed.
fn store(
    state: &AppState,
    update: impl FnOnce(&DmsConfig) -> DmsConfig,
) -> Result<DmsConfig, DmsError> {
    let mut result = Ok(());
    state.config.send_if_modified(|current| {
        let next = update(current);
        if let Err(e) = next.validate() {
            result = Err(e);
            return false;
        }
        if next == *current {
            return false;
        }
        info!("Monitor configuration updated: {:?}", next);
        *current = next;
        true
    });
    result?;
    Ok(state.config.borrow().clone())
}

/// Get the current configuration
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<DmsConfig> {
    Json(state.config.borrow().clone())
}

/// Apply a partial update
pub async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<ConfigPatch>,
) -> Result<Json<DmsConfig>, ApiError> {
    let config = store(&state, |current| patch.apply(current))?;
    Ok(Json(config))
}

/// Switch thresholds to a named preset, keeping both toggles
pub async fn apply_preset(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<DmsConfig>, ApiError> {
    let preset = match name.as_str() {
        "default" => DmsConfig::default(),
        "strict" => DmsConfig::strict(),
        "lenient" => DmsConfig::lenient(),
        _ => return Err(ApiError::UnknownPreset(name)),
    };

    let config = store(&state, |current| DmsConfig {
        ear_threshold: preset.ear_threshold,
        closure_delay_secs: preset.closure_delay_secs,
        ..current.clone()
    })?;
    Ok(Json(config))
}
