//! Output structures published to the display and celebration layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CurvatureOutcome, InstantScore, ReasonCode, Tier};
use crate::{CELEBRATION_EFFECT_MS, PRIZE_BANNER_MS};

/// One scored frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreUpdate {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Expression fusion result
    pub fusion: InstantScore,
    /// Curvature step decision
    pub curvature: CurvatureOutcome,
    /// Instant score after curvature and re-clamp
    pub instant: f64,
    /// Smoothing weight used for this frame
    pub alpha: f64,
    /// Running score after the update
    pub score: f64,
    /// Score shown to the user
    pub rounded: i64,
    /// Feedback tier for the rounded score
    pub tier: Tier,
    /// Celebration fired on this frame
    pub celebrate: bool,
    /// Why the frame ended the way it did
    pub reason: ReasonCode,
}

impl ScoreUpdate {
    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.tier.color_code();
        let reset = Tier::color_reset();

        format!(
            "{}{} score={} ({:.2}) | instant={:.0} | α={:.2} | {} | {}{}",
            color,
            self.tier.emoji(),
            self.rounded,
            self.score,
            self.instant,
            self.alpha,
            self.tier.key(),
            self.tier.message(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "score={} | running={:.2} | instant={:.0} | alpha={:.2} | tier={} | reason={}",
            self.rounded,
            self.score,
            self.instant,
            self.alpha,
            self.tier.key(),
            self.reason.code()
        )
    }
}

/// Fire-once event for the celebration collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CelebrationEvent {
    pub timestamp: DateTime<Utc>,
    /// Rounded score that triggered it (always 100)
    pub score: i64,
    /// How long the visual effect should run
    pub effect_ms: u64,
    /// How long the prize banner should stay up
    pub prize_banner_ms: u64,
}

impl CelebrationEvent {
    pub fn new(score: i64) -> Self {
        Self {
            timestamp: Utc::now(),
            score,
            effect_ms: CELEBRATION_EFFECT_MS,
            prize_banner_ms: PRIZE_BANNER_MS,
        }
    }
}

/// Result of processing one frame through the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// Face found and scored
    Scored(ScoreUpdate),
    /// No face; running score left as is
    NoFace { score: f64, rounded: i64 },
}

impl FrameOutcome {
    pub fn no_face(score: f64) -> Self {
        FrameOutcome::NoFace {
            score,
            rounded: score.round() as i64,
        }
    }

    pub fn reason(&self) -> ReasonCode {
        match self {
            FrameOutcome::Scored(update) => update.reason,
            FrameOutcome::NoFace { .. } => ReasonCode::S001_NO_FACE,
        }
    }

    pub fn as_update(&self) -> Option<&ScoreUpdate> {
        match self {
            FrameOutcome::Scored(update) => Some(update),
            FrameOutcome::NoFace { .. } => None,
        }
    }
}
