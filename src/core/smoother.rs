//! Adaptive Smoother: state-dependent exponential moving average
//!
//! α is picked from the running score *before* the update, so the score gets
//! stickier the higher it already is:
//! - ≥ 95 → 0.20
//! - ≥ 90 → 0.25
//! - ≥ 85 → 0.30
//! - else → 0.35

use tracing::debug;

use crate::types::ScoreState;
use crate::{ALPHA_AT_85, ALPHA_AT_90, ALPHA_AT_95, ALPHA_BELOW_85};

#[derive(Debug, Default, Clone, Copy)]
pub struct AdaptiveSmoother;

impl AdaptiveSmoother {
    pub fn new() -> Self {
        Self
    }

    /// Weight on the new instant score for a given running score
    pub fn alpha_for(&self, current: f64) -> f64 {
        if current >= 95.0 {
            ALPHA_AT_95
        } else if current >= 90.0 {
            ALPHA_AT_90
        } else if current >= 85.0 {
            ALPHA_AT_85
        } else {
            ALPHA_BELOW_85
        }
    }

    /// Blend a clamped instant score into the running score, return α used.
    ///
    /// Convex combination: if both inputs are in [60,100] so is the result.
    pub fn update(&self, state: &mut ScoreState, instant: f64) -> f64 {
        let alpha = self.alpha_for(state.current_score);
        let previous = state.current_score;
        state.current_score = previous * (1.0 - alpha) + instant * alpha;
        state.update_count += 1;

        debug!(
            previous,
            instant,
            alpha,
            current = state.current_score,
            "score smoothed"
        );
        alpha
    }
}
