//! Mouth landmark geometry in display-canvas pixel coordinates

use serde::{Deserialize, Serialize};

use crate::types::ExpressionSample;

/// Index of the left mouth corner in the mouth contour
pub const MOUTH_LEFT_CORNER: usize = 0;
/// Index of the right mouth corner
pub const MOUTH_RIGHT_CORNER: usize = 6;
/// Index of the upper-lip midpoint
pub const MOUTH_UPPER_LIP: usize = 14;
/// Index of the lower-lip midpoint
pub const MOUTH_LOWER_LIP: usize = 18;

/// A 2D point; y grows downward (image coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The four points the curvature step reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouthAnchors {
    pub left_corner: LandmarkPoint,
    pub right_corner: LandmarkPoint,
    pub upper_lip: LandmarkPoint,
    pub lower_lip: LandmarkPoint,
}

/// Ordered mouth contour (20 points in the 68-point convention)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MouthLandmarks(pub Vec<LandmarkPoint>);

impl MouthLandmarks {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self(points)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Anchor points, or None when any required index is missing
    pub fn anchors(&self) -> Option<MouthAnchors> {
        Some(MouthAnchors {
            left_corner: *self.0.get(MOUTH_LEFT_CORNER)?,
            right_corner: *self.0.get(MOUTH_RIGHT_CORNER)?,
            upper_lip: *self.0.get(MOUTH_UPPER_LIP)?,
            lower_lip: *self.0.get(MOUTH_LOWER_LIP)?,
        })
    }

    /// Rescale from detector-frame pixels into display pixels
    pub fn rescaled(&self, sx: f64, sy: f64) -> Self {
        Self(
            self.0
                .iter()
                .map(|p| LandmarkPoint::new(p.x * sx, p.y * sy))
                .collect(),
        )
    }

    /// Synthetic 20-point contour with the anchors placed as given.
    ///
    /// Non-anchor points are interpolated along the lips; handy for
    /// recordings and tests.
    pub fn from_anchors(left: LandmarkPoint, right: LandmarkPoint, upper: LandmarkPoint, lower: LandmarkPoint) -> Self {
        let mut points = Vec::with_capacity(20);
        for i in 0..20 {
            let p = match i {
                MOUTH_LEFT_CORNER => left,
                MOUTH_RIGHT_CORNER => right,
                MOUTH_UPPER_LIP => upper,
                MOUTH_LOWER_LIP => lower,
                _ => {
                    let t = (i % 10) as f64 / 10.0;
                    let mid_y = if i < 12 { upper.y } else { lower.y };
                    LandmarkPoint::new(left.x + (right.x - left.x) * t, mid_y)
                }
            };
            points.push(p);
        }
        Self(points)
    }
}

/// One frame's detection payload from the face model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub expressions: ExpressionSample,
    /// Mouth contour; may be empty when the model gave no landmarks
    #[serde(default)]
    pub mouth: MouthLandmarks,
}

impl Detection {
    pub fn new(expressions: ExpressionSample, mouth: MouthLandmarks) -> Self {
        Self { expressions, mouth }
    }

    /// Detection with no landmarks; the curvature step is skipped
    pub fn expressions_only(expressions: ExpressionSample) -> Self {
        Self {
            expressions,
            mouth: MouthLandmarks::default(),
        }
    }
}
