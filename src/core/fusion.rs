//! Expression Fusion: turns expression probabilities into an instant score
//!
//! instant = clamp(80 + round(happy * 17) - round((sad + angry) * 20), 60, 100)
//!
//! Each term is rounded before combining. `f64::round` rounds half away from
//! zero; both terms are non-negative so this is plain half-up.

use tracing::debug;

use crate::types::{ExpressionSample, InstantScore};
use crate::{clamp_score, FUSION_BASE, HAPPY_WEIGHT, NEGATIVE_WEIGHT};

/// Stateless fusion of expression probabilities
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionFusion;

impl ExpressionFusion {
    /// Create new fusion stage
    pub fn new() -> Self {
        Self
    }

    /// Fuse a sample and return the clamped instant score with breakdown
    pub fn fuse(&self, sample: &ExpressionSample) -> InstantScore {
        let happy_bonus = (sample.happy * HAPPY_WEIGHT).round();
        // sad + angry may exceed 1; the final clamp bounds the penalty
        let negative_penalty = ((sample.sad + sample.angry) * NEGATIVE_WEIGHT).round();

        let unclamped = FUSION_BASE + happy_bonus - negative_penalty;
        let value = clamp_score(unclamped);

        debug!(
            happy = sample.happy,
            sad = sample.sad,
            angry = sample.angry,
            happy_bonus,
            negative_penalty,
            instant = value,
            "expression fusion"
        );

        InstantScore {
            happy_bonus,
            negative_penalty,
            unclamped,
            value,
        }
    }

    /// Quick fuse - just return the instant score
    pub fn quick_fuse(&self, sample: &ExpressionSample) -> f64 {
        self.fuse(sample).value
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_face_scores_base() {
        let fusion = ExpressionFusion::new();
        let s = ExpressionSample::from_pairs([("neutral", 1.0)]);
        assert_eq!(fusion.quick_fuse(&s), 80.0);
    }

    #[test]
    fn test_full_happy() {
        let fusion = ExpressionFusion::new();
        let result = fusion.fuse(&ExpressionSample::new(1.0, 0.0, 0.0));
        assert_eq!(result.happy_bonus, 17.0);
        assert_eq!(result.negative_penalty, 0.0);
        assert_eq!(result.value, 97.0);
    }

    #[test]
    fn test_rounding_ties_go_up() {
        let fusion = ExpressionFusion::new();
        // 0.5 * 17 = 8.5 → 9
        assert_eq!(fusion.fuse(&ExpressionSample::new(0.5, 0.0, 0.0)).happy_bonus, 9.0);
        // 0.125 * 20 = 2.5 → 3
        assert_eq!(fusion.fuse(&ExpressionSample::new(0.0, 0.125, 0.0)).negative_penalty, 3.0);
        // 0.02 * 17 = 0.34 → 0
        assert_eq!(fusion.fuse(&ExpressionSample::new(0.02, 0.0, 0.0)).happy_bonus, 0.0);
    }

    #[test]
    fn test_penalty_not_capped_before_clamp() {
        let fusion = ExpressionFusion::new();
        let result = fusion.fuse(&ExpressionSample::new(0.0, 0.9, 0.9));
        assert_eq!(result.negative_penalty, 36.0);
        assert_eq!(result.unclamped, 44.0);
        assert_eq!(result.value, 60.0);
    }

    #[test]
    fn test_surprised_and_neutral_are_inert() {
        let fusion = ExpressionFusion::new();
        let plain = ExpressionSample::new(0.4, 0.1, 0.0);
        let mut noisy = plain.clone();
        noisy.surprised = 0.9;
        noisy.neutral = 0.5;
        assert_eq!(fusion.quick_fuse(&plain), fusion.quick_fuse(&noisy));
    }

    #[test]
    fn test_mixed_sample() {
        let fusion = ExpressionFusion::new();
        // 80 + round(10.2)=10 - round(4.0)=4 = 86
        let result = fusion.fuse(&ExpressionSample::new(0.6, 0.15, 0.05));
        assert_eq!(result.value, 86.0);
    }
}
