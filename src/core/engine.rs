//! Smile Engine: one frame through the whole scoring pipeline
//!
//! detection → fusion → curvature → clamp → smoother → tier → celebration
//!
//! No face leaves the running score untouched. Malformed detections are
//! rejected before any stage runs, so a bad frame can never move the score.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    AdaptiveSmoother, CelebrationMode, CelebrationTrigger, CurvatureAdjuster, ExpressionFusion,
    TierClassifier,
};
use crate::error::{Result, SmileError};
use crate::types::{
    CelebrationEvent, Detection, FrameOutcome, ReasonCode, ScoreState, ScoreUpdate,
    Tier,
};

/// What the camera-retry path does to the running score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetPolicy {
    /// Score survives reinitialization
    #[default]
    Keep,
    /// Score returns to its initial value
    Reset,
}

/// Per-frame scoring engine; owns the only `ScoreState`
#[derive(Debug)]
pub struct SmileEngine {
    state: ScoreState,
    fusion: ExpressionFusion,
    curvature: CurvatureAdjuster,
    smoother: AdaptiveSmoother,
    classifier: TierClassifier,
    trigger: CelebrationTrigger,
    last_update: Option<ScoreUpdate>,
    last_celebration: Option<CelebrationEvent>,
}

impl Default for SmileEngine {
    fn default() -> Self {
        Self::new(CelebrationMode::default())
    }
}

impl SmileEngine {
    /// Create new engine at the initial score
    pub fn new(mode: CelebrationMode) -> Self {
        Self {
            state: ScoreState::new(),
            fusion: ExpressionFusion::new(),
            curvature: CurvatureAdjuster::new(),
            smoother: AdaptiveSmoother::new(),
            classifier: TierClassifier::new(),
            trigger: CelebrationTrigger::new(mode),
            last_update: None,
            last_celebration: None,
        }
    }

    /// Process one frame. `None` means no face was found.
    pub fn process(&mut self, detection: Option<&Detection>) -> Result<FrameOutcome> {
        let Some(detection) = detection else {
            debug!(score = self.state.current_score(), "no face in frame");
            return Ok(FrameOutcome::no_face(self.state.current_score()));
        };

        detection.expressions.validate()?;
        if detection.mouth.0.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(SmileError::malformed("mouth landmark is not finite"));
        }

        let fusion = self.fusion.fuse(&detection.expressions);
        let (instant, curvature) = self.curvature.adjust(fusion.value, &detection.mouth);
        let alpha = self.smoother.update(&mut self.state, instant);

        let rounded = self.state.rounded();
        let tier = self.classifier.classify_rounded(rounded);
        let celebration = self.trigger.observe(tier, rounded);
        let celebrate = celebration.is_some();

        let reason = if celebrate {
            ReasonCode::S003_CELEBRATION_FIRED
        } else if tier.is_celebration() {
            ReasonCode::S003_CELEBRATION_HELD
        } else {
            ReasonCode::S001_FRAME_SCORED
        };

        let update = ScoreUpdate {
            timestamp: chrono::Utc::now(),
            fusion,
            curvature,
            instant,
            alpha,
            score: self.state.current_score(),
            rounded,
            tier,
            celebrate,
            reason,
        };

        if celebration.is_some() {
            self.last_celebration = celebration;
        }
        self.last_update = Some(update.clone());
        Ok(FrameOutcome::Scored(update))
    }

    /// Read-only view of the running score
    pub fn state(&self) -> &ScoreState {
        &self.state
    }

    /// Current running score
    pub fn score(&self) -> f64 {
        self.state.current_score()
    }

    /// Tier for the current running score
    pub fn tier(&self) -> Tier {
        self.classifier.classify(self.state.current_score())
    }

    /// Last scored frame, if any
    pub fn current_update(&self) -> Option<&ScoreUpdate> {
        self.last_update.as_ref()
    }

    /// Take the pending celebration event, if one fired since the last call
    pub fn take_celebration(&mut self) -> Option<CelebrationEvent> {
        self.last_celebration.take()
    }

    pub fn celebration_mode(&self) -> CelebrationMode {
        self.trigger.mode()
    }

    /// Camera-retry path: optionally reset the score, always re-arm
    pub fn reinitialize(&mut self, policy: ResetPolicy) {
        match policy {
            ResetPolicy::Keep => {}
            ResetPolicy::Reset => {
                self.state = ScoreState::new();
                self.last_update = None;
            }
        }
        self.trigger.rearm();
        self.last_celebration = None;
        debug!(?policy, score = self.state.current_score(), "engine reinitialized");
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurvatureOutcome, ExpressionSample, LandmarkPoint, MouthLandmarks};

    fn happy(h: f64) -> Detection {
        Detection::expressions_only(ExpressionSample::new(h, 0.0, 0.0))
    }

    #[test]
    fn test_initial_score() {
        let engine = SmileEngine::default();
        assert_eq!(engine.score(), 80.0);
        assert_eq!(engine.tier(), Tier::Natural);
        assert!(engine.current_update().is_none());
    }

    #[test]
    fn test_full_happy_first_frame() {
        let mut engine = SmileEngine::default();
        let outcome = engine.process(Some(&happy(1.0))).unwrap();
        let update = outcome.as_update().unwrap();
        assert_eq!(update.instant, 97.0);
        assert_eq!(update.alpha, 0.35);
        assert!((update.score - 85.95).abs() < 1e-9);
        assert_eq!(update.rounded, 86);
        assert_eq!(update.tier, Tier::SlightSmile);
        assert_eq!(update.curvature, CurvatureOutcome::SkippedMissing);
    }

    #[test]
    fn test_no_face_leaves_state() {
        let mut engine = SmileEngine::default();
        engine.process(Some(&happy(1.0))).unwrap();
        let before = engine.state().clone();
        for _ in 0..5 {
            let outcome = engine.process(None).unwrap();
            assert_eq!(outcome.reason(), ReasonCode::S001_NO_FACE);
        }
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn test_malformed_rejected_without_update() {
        let mut engine = SmileEngine::default();
        let bad = Detection::expressions_only(ExpressionSample::new(f64::NAN, 0.0, 0.0));
        assert!(engine.process(Some(&bad)).is_err());
        assert_eq!(engine.score(), 80.0);
        assert_eq!(engine.state().update_count(), 0);

        let bad_mouth = Detection::new(
            ExpressionSample::new(0.5, 0.0, 0.0),
            MouthLandmarks::new(vec![LandmarkPoint::new(f64::INFINITY, 1.0)]),
        );
        assert!(engine.process(Some(&bad_mouth)).is_err());
        assert_eq!(engine.score(), 80.0);
    }

    #[test]
    fn test_inert_expressions_do_not_drop_frame() {
        let mut engine = SmileEngine::default();
        let sample = ExpressionSample::from_pairs([
            ("happy", 1.0),
            ("surprised", 1.3),
            ("fearful", f64::NAN),
        ]);
        let outcome = engine.process(Some(&Detection::expressions_only(sample))).unwrap();
        assert!((outcome.as_update().unwrap().score - 85.95).abs() < 1e-9);
    }

    #[test]
    fn test_reinitialize_policies() {
        let mut engine = SmileEngine::default();
        engine.process(Some(&happy(1.0))).unwrap();
        let kept = engine.score();

        engine.reinitialize(ResetPolicy::Keep);
        assert_eq!(engine.score(), kept);

        engine.reinitialize(ResetPolicy::Reset);
        assert_eq!(engine.score(), 80.0);
        assert!(engine.current_update().is_none());
    }

    #[test]
    fn test_celebration_reason_codes() {
        let mut engine = SmileEngine::default();
        let mut reasons = Vec::new();
        for _ in 0..60 {
            let detection = Detection::new(
                ExpressionSample::new(1.0, 0.0, 0.0),
                MouthLandmarks::from_anchors(
                    LandmarkPoint::new(100.0, 200.0),
                    LandmarkPoint::new(160.0, 200.0),
                    LandmarkPoint::new(130.0, 205.0),
                    LandmarkPoint::new(130.0, 215.0),
                ),
            );
            reasons.push(engine.process(Some(&detection)).unwrap().reason());
        }
        let fired = reasons.iter().filter(|r| **r == ReasonCode::S003_CELEBRATION_FIRED).count();
        assert_eq!(fired, 1);
        assert_eq!(reasons.last(), Some(&ReasonCode::S003_CELEBRATION_HELD));
        assert!(engine.take_celebration().is_some());
        assert!(engine.take_celebration().is_none());
    }
}
