//! Smile Meter: real-time smile scoring from facial expression signals
//!
//! Per frame: detection → expression fusion → mouth curvature → clamp →
//! adaptive smoother → tier classifier → display / celebration.

pub mod config;
pub mod core;
pub mod error;
pub mod types;

pub use config::SmileConfig;
pub use error::{Result, SmileError};

// =============================================================================
// SCORE RANGE
// =============================================================================

/// Lowest score any stage may produce
pub const SCORE_MIN: f64 = 60.0;

/// Highest score any stage may produce
pub const SCORE_MAX: f64 = 100.0;

/// Running score at startup
pub const INITIAL_SCORE: f64 = 80.0;

// =============================================================================
// EXPRESSION FUSION WEIGHTS
// =============================================================================

/// Neutral starting point of the instant score
pub const FUSION_BASE: f64 = 80.0;

/// happy ∈ [0,1] is worth up to this many points
pub const HAPPY_WEIGHT: f64 = 17.0;

/// (sad + angry) is scaled by this before subtraction
pub const NEGATIVE_WEIGHT: f64 = 20.0;

/// Tolerance when validating probabilities against [0,1]
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

// =============================================================================
// MOUTH CURVATURE
// =============================================================================

/// curvature above this counts as upturned corners
pub const CURVATURE_SMILE_THRESHOLD: f64 = 0.1;

/// curvature below this counts as downturned corners
pub const CURVATURE_FROWN_THRESHOLD: f64 = -0.1;

/// Points added for upturned corners
pub const CURVATURE_SMILE_BONUS: f64 = 3.0;

/// Points removed for downturned corners (frowns weigh more than smiles)
pub const CURVATURE_FROWN_PENALTY: f64 = 5.0;

// =============================================================================
// ADAPTIVE SMOOTHING
// =============================================================================

/// Weight on the new instant score when the running score is ≥ 95
pub const ALPHA_AT_95: f64 = 0.20;

/// Weight when 90 ≤ running < 95
pub const ALPHA_AT_90: f64 = 0.25;

/// Weight when 85 ≤ running < 90
pub const ALPHA_AT_85: f64 = 0.30;

/// Weight when running < 85
pub const ALPHA_BELOW_85: f64 = 0.35;

// =============================================================================
// LOOP TIMING
// =============================================================================

/// Fixed delay before re-entering the loop after a detection failure
pub const RETRY_DELAY_MS: u64 = 2000;

/// Pause between frames (one display refresh at 60 Hz)
pub const FRAME_INTERVAL_MS: u64 = 16;

/// API sessions idle longer than this are dropped
pub const SESSION_TTL_SECS: u64 = 600;

/// How long the celebration effect stays on screen
pub const CELEBRATION_EFFECT_MS: u64 = 5000;

/// How long the prize banner stays on screen
pub const PRIZE_BANNER_MS: u64 = 7000;

// =============================================================================
// DETECTOR OPTIONS
// =============================================================================

/// Displays this wide or narrower are treated as mobile
pub const MOBILE_MAX_WIDTH: u32 = 480;

/// Detector input size on mobile-class displays
pub const DETECTOR_INPUT_MOBILE: u32 = 224;

/// Detector input size on desktop-class displays
pub const DETECTOR_INPUT_DESKTOP: u32 = 320;

/// Minimum face confidence accepted from the detector
pub const DETECTOR_SCORE_THRESHOLD: f64 = 0.5;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";

/// Clamp a score into [SCORE_MIN, SCORE_MAX]
pub fn clamp_score(score: f64) -> f64 {
    score.clamp(SCORE_MIN, SCORE_MAX)
}
