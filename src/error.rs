//! Error types for the scoring pipeline and its hosts.

use thiserror::Error;

use crate::types::CameraState;

pub type Result<T> = std::result::Result<T, SmileError>;

#[derive(Debug, Error)]
pub enum SmileError {
    /// Detection payload present but unusable (NaN, out-of-range probability)
    #[error("Malformed detection: {0}")]
    MalformedDetection(String),

    /// The detector itself failed for this frame
    #[error("Detection failed: {0}")]
    DetectionFailed(String),

    /// A finite frame source has no more frames
    #[error("Frame source exhausted")]
    SourceExhausted,

    #[error("Invalid camera transition: {from} -> {to}")]
    InvalidCameraTransition { from: CameraState, to: CameraState },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SmileError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedDetection(msg.into())
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::DetectionFailed(msg.into())
    }

    /// Frame-level failures are retried; everything else is surfaced.
    pub fn is_frame_failure(&self) -> bool {
        matches!(
            self,
            SmileError::MalformedDetection(_) | SmileError::DetectionFailed(_) | SmileError::Json(_)
        )
    }
}
