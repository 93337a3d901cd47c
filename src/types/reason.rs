//! Reason codes explaining what happened to each frame

use serde::{Deserialize, Serialize};

/// Reason codes for frame outcomes and pipeline decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // S001: Frame outcome
    // =========================================================================
    /// Frame scored and running score updated
    S001_FRAME_SCORED,
    /// No face in frame, running score untouched
    S001_NO_FACE,
    /// Detector failed or returned malformed data
    S001_DETECTION_FAILED,

    // =========================================================================
    // S002: Curvature step
    // =========================================================================
    /// Corners up, bonus applied
    S002_CURVATURE_SMILE,
    /// Corners down, penalty applied
    S002_CURVATURE_FROWN,
    /// Curvature inside the dead zone
    S002_CURVATURE_NEUTRAL,
    /// Required mouth indices missing
    S002_CURVATURE_SKIPPED_MISSING,
    /// Lips closed flat, curvature undefined
    S002_CURVATURE_SKIPPED_FLAT,

    // =========================================================================
    // S003: Celebration
    // =========================================================================
    /// Entered the top tier, celebration fired
    S003_CELEBRATION_FIRED,
    /// Still in the top tier, celebration already fired
    S003_CELEBRATION_HELD,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::S001_FRAME_SCORED => "S001_FRAME_SCORED",
            Self::S001_NO_FACE => "S001_NO_FACE",
            Self::S001_DETECTION_FAILED => "S001_DETECTION_FAILED",
            Self::S002_CURVATURE_SMILE => "S002_CURVATURE_SMILE",
            Self::S002_CURVATURE_FROWN => "S002_CURVATURE_FROWN",
            Self::S002_CURVATURE_NEUTRAL => "S002_CURVATURE_NEUTRAL",
            Self::S002_CURVATURE_SKIPPED_MISSING => "S002_CURVATURE_SKIPPED_MISSING",
            Self::S002_CURVATURE_SKIPPED_FLAT => "S002_CURVATURE_SKIPPED_FLAT",
            Self::S003_CELEBRATION_FIRED => "S003_CELEBRATION_FIRED",
            Self::S003_CELEBRATION_HELD => "S003_CELEBRATION_HELD",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::S001_FRAME_SCORED => "Frame scored",
            Self::S001_NO_FACE => "No face detected",
            Self::S001_DETECTION_FAILED => "Detection failed, retrying",
            Self::S002_CURVATURE_SMILE => "Mouth corners up",
            Self::S002_CURVATURE_FROWN => "Mouth corners down",
            Self::S002_CURVATURE_NEUTRAL => "Mouth curvature neutral",
            Self::S002_CURVATURE_SKIPPED_MISSING => "Mouth landmarks missing",
            Self::S002_CURVATURE_SKIPPED_FLAT => "Mouth closed flat",
            Self::S003_CELEBRATION_FIRED => "Perfect score celebration",
            Self::S003_CELEBRATION_HELD => "Perfect score held",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
