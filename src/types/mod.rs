//! Core types for Smile Meter

mod expression;
mod landmarks;
mod output;
mod reason;
mod signals;
mod state;
mod tier;

pub use expression::ExpressionSample;
pub use landmarks::{
    Detection, LandmarkPoint, MouthAnchors, MouthLandmarks, MOUTH_LEFT_CORNER, MOUTH_LOWER_LIP,
    MOUTH_RIGHT_CORNER, MOUTH_UPPER_LIP,
};
pub use output::{CelebrationEvent, FrameOutcome, ScoreUpdate};
pub use reason::ReasonCode;
pub use signals::{CurvatureOutcome, InstantScore};
pub use state::{CameraState, ScoreState};
pub use tier::Tier;
