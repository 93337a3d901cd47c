//! Long-lived state: the running score and the camera lifecycle

use serde::{Deserialize, Serialize};

use crate::INITIAL_SCORE;

/// The running smile score carried across frames.
///
/// Read anywhere; written only by the adaptive smoother.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreState {
    pub(crate) current_score: f64,
    pub(crate) update_count: u64,
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreState {
    pub fn new() -> Self {
        Self {
            current_score: INITIAL_SCORE,
            update_count: 0,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_score(score: f64) -> Self {
        Self {
            current_score: score,
            update_count: 0,
        }
    }

    /// Smoothed running score in [60, 100]
    pub fn current_score(&self) -> f64 {
        self.current_score
    }

    /// Rounded score shown to the user
    pub fn rounded(&self) -> i64 {
        self.current_score.round() as i64
    }

    /// Number of smoother updates applied
    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

/// Camera lifecycle, owned by the camera collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CameraState {
    /// No stream, nothing requested
    Idle,
    /// Models loading / permission pending
    Initializing,
    /// Frames available
    Streaming,
    /// Initialization or stream failed; retry available
    Error,
}

impl std::fmt::Display for CameraState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CameraState::Idle => "IDLE",
            CameraState::Initializing => "INITIALIZING",
            CameraState::Streaming => "STREAMING",
            CameraState::Error => "ERROR",
        };
        write!(f, "{}", name)
    }
}
