//! Eye aspect ratio (EAR)
//!
//! `EAR = (|p2 - p6| + |p3 - p5|) / (2 * |p1 - p4|)` over the six eye points
//! in the order outer corner, upper outer, upper inner, inner corner,
//! lower inner, lower outer. An open eye sits around 0.25-0.35, a closed one
//! near 0.1 or below.

use landmarks::{LandmarkFrame, LandmarkPoint};
use serde::{Deserialize, Serialize};

/// Default EAR threshold for the closed classification
pub const DEFAULT_EAR_THRESHOLD: f32 = 0.2;

/// EAR for one eye. Returns 0 unless exactly six points are given, and when
/// the corner-to-corner distance is zero.
pub fn calculate_ear(eye: &[LandmarkPoint]) -> f32 {
    let [p1, p2, p3, p4, p5, p6] = eye else {
        return 0.0;
    };

    let horizontal = p1.distance(p4);
    if horizontal == 0.0 {
        return 0.0;
    }

    (p2.distance(p6) + p3.distance(p5)) / (2.0 * horizontal)
}

/// Closed when the average EAR is strictly below the threshold
pub fn eyes_closed(average_ear: f32, threshold: f32) -> bool {
    average_ear < threshold
}

/// EAR of both eyes for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EarReading {
    pub left: f32,
    pub right: f32,
    pub average: f32,
}

impl EarReading {
    pub fn new(left: f32, right: f32) -> Self {
        Self {
            left,
            right,
            average: (left + right) / 2.0,
        }
    }

    /// Compute from a detector frame. A malformed eye still contributes its
    /// zero to the average.
    pub fn from_frame(frame: &LandmarkFrame) -> Self {
        Self::new(calculate_ear(&frame.left_eye()), calculate_ear(&frame.right_eye()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Eye of the given width with both vertical pairs `height` apart
    fn eye(width: f32, height: f32) -> Vec<LandmarkPoint> {
        let half = height / 2.0;
        vec![
            LandmarkPoint::new(0.0, 0.0),
            LandmarkPoint::new(width / 3.0, -half),
            LandmarkPoint::new(2.0 * width / 3.0, -half),
            LandmarkPoint::new(width, 0.0),
            LandmarkPoint::new(2.0 * width / 3.0, half),
            LandmarkPoint::new(width / 3.0, half),
        ]
    }

    #[test]
    fn test_open_eye_ratio() {
        let ear = calculate_ear(&eye(0.1, 0.03));
        assert!((ear - 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_wrong_length_returns_zero() {
        assert_eq!(calculate_ear(&[]), 0.0);
        assert_eq!(calculate_ear(&eye(0.1, 0.03)[..5]), 0.0);

        let mut seven = eye(0.1, 0.03);
        seven.push(LandmarkPoint::new(0.5, 0.5));
        assert_eq!(calculate_ear(&seven), 0.0);
    }

    #[test]
    fn test_zero_width_returns_zero() {
        let points = vec![LandmarkPoint::new(0.4, 0.4); 6];
        assert_eq!(calculate_ear(&points), 0.0);
    }

    #[test]
    fn test_collinear_eye_near_zero() {
        let ear = calculate_ear(&eye(0.1, 0.0));
        assert!(ear.abs() < 1e-6);
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(eyes_closed(0.19, 0.2));
        assert!(!eyes_closed(0.2, 0.2));
        assert!(!eyes_closed(0.21, 0.2));
    }

    #[test]
    fn test_degenerate_eye_averages_in() {
        let reading = EarReading::new(0.3, 0.0);
        assert!((reading.average - 0.15).abs() < 1e-6);
        assert!(eyes_closed(reading.average, DEFAULT_EAR_THRESHOLD));
    }

    #[test]
    fn test_reading_from_no_face_frame() {
        let reading = EarReading::from_frame(&LandmarkFrame::no_face(0, 0));
        assert_eq!(reading, EarReading::default());
    }

    proptest! {
        #[test]
        fn prop_ear_non_negative(coords in prop::collection::vec((0.0f32..1.0, 0.0f32..1.0), 6)) {
            let points: Vec<_> = coords.into_iter().map(|(x, y)| LandmarkPoint::new(x, y)).collect();
            let ear = calculate_ear(&points);
            prop_assert!(ear >= 0.0);
        }

        #[test]
        fn prop_non_six_length_is_zero(len in 0usize..20) {
            prop_assume!(len != 6);
            let points = vec![LandmarkPoint::new(0.1, 0.2); len];
            prop_assert_eq!(calculate_ear(&points), 0.0);
        }

        #[test]
        fn prop_classification_flips_at_threshold(ear in 0.0f32..0.5, threshold in 0.1f32..0.3) {
            prop_assert_eq!(eyes_closed(ear, threshold), ear < threshold);
        }
    }
}
