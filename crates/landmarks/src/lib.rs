//! Landmark Stream Library for DriverGuard
//!
//! Boundary types for the external face-mesh detector:
//! - Normalized 3-D landmark points (468-point face mesh topology)
//! - Per-frame results, either a landmark list or "no face"
//! - Fixed eye index lists used for eye aspect ratio
//! - A JSON Lines replay source standing in for the live detector

pub mod frame;
pub mod source;

pub use frame::{
    LandmarkFrame, LandmarkPoint, FACE_MESH_POINTS, LEFT_EYE_EAR_POINTS, RIGHT_EYE_EAR_POINTS,
};
pub use source::{LandmarkSource, ReplaySource};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Landmark source error types
#[derive(Error, Debug)]
pub enum LandmarkError {
    #[error("Failed to open landmark source {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No landmark source configured")]
    NotConfigured,

    #[error("Landmark replay contains no frames")]
    Empty,

    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame on line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: serde_json::Error,
    },
}

/// Replay source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON Lines file with one detector result per line
    pub path: Option<PathBuf>,
    /// Delivery rate (frames per second)
    pub fps: u32,
    /// Restart from the first line at end of stream
    pub loop_replay: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            fps: 30,
            loop_replay: false,
        }
    }
}

impl SourceConfig {
    /// Interval between delivered frames
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.fps.max(1) as f64)
    }
}
