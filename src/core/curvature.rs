//! Landmark Curvature Adjustment
//!
//! curvature = (lip_center_y - corner_y) / |lower_lip.y - upper_lip.y|
//!
//! Image coordinates: y grows downward, so corners sitting higher than the
//! lip centre give a positive curvature (smile, +3) and drooping corners a
//! negative one (frown, -5). Missing anchors or a zero opening skip the step.

use tracing::debug;

use crate::clamp_score;
use crate::types::{CurvatureOutcome, MouthLandmarks};
use crate::{CURVATURE_FROWN_THRESHOLD, CURVATURE_SMILE_THRESHOLD};

#[derive(Debug, Default, Clone, Copy)]
pub struct CurvatureAdjuster;

impl CurvatureAdjuster {
    pub fn new() -> Self {
        Self
    }

    /// Classify the mouth shape
    pub fn measure(&self, mouth: &MouthLandmarks) -> CurvatureOutcome {
        let Some(a) = mouth.anchors() else {
            debug!(points = mouth.len(), "curvature skipped: mouth anchors missing");
            return CurvatureOutcome::SkippedMissing;
        };

        let openness = (a.lower_lip.y - a.upper_lip.y).abs();
        if openness == 0.0 || !openness.is_finite() {
            debug!("curvature skipped: zero mouth opening");
            return CurvatureOutcome::SkippedFlat;
        }

        let lip_center_y = (a.upper_lip.y + a.lower_lip.y) / 2.0;
        let corner_y = (a.left_corner.y + a.right_corner.y) / 2.0;
        let curvature = (lip_center_y - corner_y) / openness;

        let outcome = if curvature > CURVATURE_SMILE_THRESHOLD {
            CurvatureOutcome::Smile { curvature }
        } else if curvature < CURVATURE_FROWN_THRESHOLD {
            CurvatureOutcome::Frown { curvature }
        } else {
            CurvatureOutcome::Neutral { curvature }
        };
        debug!(curvature, delta = outcome.delta(), "mouth curvature");
        outcome
    }

    /// Apply an outcome to an instant score and re-clamp
    pub fn apply(&self, instant: f64, outcome: &CurvatureOutcome) -> f64 {
        clamp_score(instant + outcome.delta())
    }

    /// Measure and apply in one step
    pub fn adjust(&self, instant: f64, mouth: &MouthLandmarks) -> (f64, CurvatureOutcome) {
        let outcome = self.measure(mouth);
        (self.apply(instant, &outcome), outcome)
    }
}
