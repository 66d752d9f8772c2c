//! Landmark frame types

use serde::{Deserialize, Serialize};

/// Number of points in the detector's face mesh topology
pub const FACE_MESH_POINTS: usize = 468;

/// Left eye indices in EAR order: outer corner, upper outer, upper inner,
/// inner corner, lower inner, lower outer
pub const LEFT_EYE_EAR_POINTS: [usize; 6] = [33, 160, 158, 133, 153, 144];

/// Right eye indices in EAR order
pub const RIGHT_EYE_EAR_POINTS: [usize; 6] = [362, 385, 387, 263, 373, 380];

/// Normalized landmark point (x, y in [0, 1] image space)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    /// Relative depth, unused by the eye metrics
    #[serde(default)]
    pub z: f32,
}

impl LandmarkPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Euclidean distance in the image plane
    pub fn distance(&self, other: &LandmarkPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// One detector result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Detector timestamp (milliseconds)
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Frame sequence number
    #[serde(default)]
    pub sequence: u64,
    /// Landmarks of the first detected face, `None` when no face was found
    #[serde(default)]
    pub landmarks: Option<Vec<LandmarkPoint>>,
}

impl LandmarkFrame {
    /// Create a frame carrying face landmarks
    pub fn with_face(landmarks: Vec<LandmarkPoint>, timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            timestamp_ms,
            sequence,
            landmarks: Some(landmarks),
        }
    }

    /// Create a frame where the detector found no face
    pub fn no_face(timestamp_ms: u64, sequence: u64) -> Self {
        Self {
            timestamp_ms,
            sequence,
            landmarks: None,
        }
    }

    pub fn face_detected(&self) -> bool {
        self.landmarks.is_some()
    }

    /// Gather the points at `indices`. Indices past the end of the mesh are
    /// skipped, so a truncated mesh yields fewer points than requested.
    pub fn eye_points(&self, indices: &[usize]) -> Vec<LandmarkPoint> {
        match &self.landmarks {
            Some(points) => indices.iter().filter_map(|&i| points.get(i).copied()).collect(),
            None => Vec::new(),
        }
    }

    pub fn left_eye(&self) -> Vec<LandmarkPoint> {
        self.eye_points(&LEFT_EYE_EAR_POINTS)
    }

    pub fn right_eye(&self) -> Vec<LandmarkPoint> {
        self.eye_points(&RIGHT_EYE_EAR_POINTS)
    }
}
