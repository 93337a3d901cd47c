//! Per-frame score signals: fused instant score and curvature outcome

use serde::{Deserialize, Serialize};

use crate::types::ReasonCode;
use crate::{CURVATURE_FROWN_PENALTY, CURVATURE_SMILE_BONUS};

/// Instant score from expression fusion, with its breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InstantScore {
    /// round(happy * 17)
    pub happy_bonus: f64,
    /// round((sad + angry) * 20)
    pub negative_penalty: f64,
    /// base + bonus - penalty, before clamping
    pub unclamped: f64,
    /// Clamped to [60, 100]
    pub value: f64,
}

/// What the mouth-curvature step decided for a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurvatureOutcome {
    /// Corners above the lip centre line
    Smile { curvature: f64 },
    /// Corners below the lip centre line
    Frown { curvature: f64 },
    /// Inside the ±0.1 dead zone
    Neutral { curvature: f64 },
    /// Required mouth indices absent
    SkippedMissing,
    /// Zero mouth opening, curvature undefined
    SkippedFlat,
}

impl CurvatureOutcome {
    /// Signed score correction: +3, -5 or 0
    pub fn delta(&self) -> f64 {
        match self {
            CurvatureOutcome::Smile { .. } => CURVATURE_SMILE_BONUS,
            CurvatureOutcome::Frown { .. } => -CURVATURE_FROWN_PENALTY,
            _ => 0.0,
        }
    }

    pub fn curvature(&self) -> Option<f64> {
        match self {
            CurvatureOutcome::Smile { curvature }
            | CurvatureOutcome::Frown { curvature }
            | CurvatureOutcome::Neutral { curvature } => Some(*curvature),
            _ => None,
        }
    }

    /// Short label for terminal output
    pub fn label(&self) -> &'static str {
        match self {
            CurvatureOutcome::Smile { .. } => "+3",
            CurvatureOutcome::Frown { .. } => "-5",
            CurvatureOutcome::Neutral { .. } => "0",
            CurvatureOutcome::SkippedMissing => "skip(missing)",
            CurvatureOutcome::SkippedFlat => "skip(flat)",
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, CurvatureOutcome::SkippedMissing | CurvatureOutcome::SkippedFlat)
    }

    pub fn reason(&self) -> ReasonCode {
        match self {
            CurvatureOutcome::Smile { .. } => ReasonCode::S002_CURVATURE_SMILE,
            CurvatureOutcome::Frown { .. } => ReasonCode::S002_CURVATURE_FROWN,
            CurvatureOutcome::Neutral { .. } => ReasonCode::S002_CURVATURE_NEUTRAL,
            CurvatureOutcome::SkippedMissing => ReasonCode::S002_CURVATURE_SKIPPED_MISSING,
            CurvatureOutcome::SkippedFlat => ReasonCode::S002_CURVATURE_SKIPPED_FLAT,
        }
    }
}
