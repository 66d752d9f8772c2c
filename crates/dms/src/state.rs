//! Driver eye status for display

use serde::{Deserialize, Serialize};

/// Coarse eye status shown to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeStatus {
    #[default]
    NoFace,
    Open,
    Closed,
}

impl EyeStatus {
    pub fn from_flags(face_detected: bool, eyes_closed: bool) -> Self {
        match (face_detected, eyes_closed) {
            (false, _) => EyeStatus::NoFace,
            (true, true) => EyeStatus::Closed,
            (true, false) => EyeStatus::Open,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EyeStatus::NoFace => "NO FACE",
            EyeStatus::Open => "EYES OPEN",
            EyeStatus::Closed => "EYES CLOSED",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            EyeStatus::NoFace => "Position your face in the camera",
            EyeStatus::Open => "Monitoring active",
            EyeStatus::Closed => "Open your eyes",
        }
    }
}
