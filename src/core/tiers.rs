//! Tier Classifier and celebration trigger
//!
//! Thresholds are checked from highest to lowest on the rounded score; first
//! match wins. The top tier (100) requests a celebration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{CelebrationEvent, Tier};

/// Maps running scores to tiers
#[derive(Debug, Default, Clone, Copy)]
pub struct TierClassifier;

impl TierClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a running score (rounded to nearest, ties away from zero)
    pub fn classify(&self, score: f64) -> Tier {
        self.classify_rounded(score.round() as i64)
    }

    /// Classify an already-rounded score
    pub fn classify_rounded(&self, rounded: i64) -> Tier {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.min_score().map_or(true, |min| rounded >= min))
            .unwrap_or(Tier::SevereFrownEncouragement)
    }
}

/// When the celebration fires while the score sits at 100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CelebrationMode {
    /// Once per entry into the top tier
    #[default]
    Edge,
    /// Every frame in the top tier
    Level,
}

impl FromStr for CelebrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edge" => Ok(CelebrationMode::Edge),
            "level" => Ok(CelebrationMode::Level),
            other => Err(format!("unknown celebration mode '{}' (expected edge|level)", other)),
        }
    }
}

/// Tracks top-tier entry so edge mode fires once per crossing
#[derive(Debug, Clone, Default)]
pub struct CelebrationTrigger {
    mode: CelebrationMode,
    in_top_tier: bool,
    fired_count: u64,
}

impl CelebrationTrigger {
    pub fn new(mode: CelebrationMode) -> Self {
        Self {
            mode,
            in_top_tier: false,
            fired_count: 0,
        }
    }

    pub fn mode(&self) -> CelebrationMode {
        self.mode
    }

    /// Feed this frame's tier; returns an event when the celebration fires
    pub fn observe(&mut self, tier: Tier, rounded: i64) -> Option<CelebrationEvent> {
        let entering = tier.is_celebration() && !self.in_top_tier;
        self.in_top_tier = tier.is_celebration();

        let fire = match self.mode {
            CelebrationMode::Edge => entering,
            CelebrationMode::Level => tier.is_celebration(),
        };
        if !fire {
            return None;
        }

        self.fired_count += 1;
        info!(score = rounded, count = self.fired_count, "celebration triggered");
        Some(CelebrationEvent::new(rounded))
    }

    /// Whether the last observed tier was the top one
    pub fn in_top_tier(&self) -> bool {
        self.in_top_tier
    }

    pub fn fired_count(&self) -> u64 {
        self.fired_count
    }

    /// Re-arm: the next top-tier frame counts as an entry
    pub fn rearm(&mut self) {
        self.in_top_tier = false;
    }
}
