//! Feedback tiers: ten ordered score bands, each with a message

use serde::{Deserialize, Serialize};

/// Score band shown to the user, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// Rounded score 100; fires the celebration
    #[serde(rename = "perfect-100")]
    Perfect100,
    PerfectSmile,
    BigSmile,
    HappySmile,
    SlightSmile,
    Natural,
    SlightFrown,
    Frown,
    DeepFrown,
    SevereFrownEncouragement,
}

impl Tier {
    /// All tiers, highest threshold first
    pub const ALL: [Tier; 10] = [
        Tier::Perfect100,
        Tier::PerfectSmile,
        Tier::BigSmile,
        Tier::HappySmile,
        Tier::SlightSmile,
        Tier::Natural,
        Tier::SlightFrown,
        Tier::Frown,
        Tier::DeepFrown,
        Tier::SevereFrownEncouragement,
    ];

    /// Lowest rounded score in this band (None for the catch-all)
    pub fn min_score(&self) -> Option<i64> {
        match self {
            Tier::Perfect100 => Some(100),
            Tier::PerfectSmile => Some(97),
            Tier::BigSmile => Some(95),
            Tier::HappySmile => Some(90),
            Tier::SlightSmile => Some(85),
            Tier::Natural => Some(80),
            Tier::SlightFrown => Some(75),
            Tier::Frown => Some(70),
            Tier::DeepFrown => Some(65),
            Tier::SevereFrownEncouragement => None,
        }
    }

    /// Stable message key for the display layer
    pub fn key(&self) -> &'static str {
        match self {
            Tier::Perfect100 => "perfect-100",
            Tier::PerfectSmile => "perfect-smile",
            Tier::BigSmile => "big-smile",
            Tier::HappySmile => "happy-smile",
            Tier::SlightSmile => "slight-smile",
            Tier::Natural => "natural",
            Tier::SlightFrown => "slight-frown",
            Tier::Frown => "frown",
            Tier::DeepFrown => "deep-frown",
            Tier::SevereFrownEncouragement => "severe-frown-encouragement",
        }
    }

    /// Default message text
    pub fn message(&self) -> &'static str {
        match self {
            Tier::Perfect100 => "Congratulations! A perfect 100!",
            Tier::PerfectSmile => "That's a perfect smile!",
            Tier::BigSmile => "What a big, bright smile!",
            Tier::HappySmile => "You're smiling happily!",
            Tier::SlightSmile => "A little smile there!",
            Tier::Natural => "A natural expression.",
            Tier::SlightFrown => "You're frowning slightly.",
            Tier::Frown => "You're frowning a bit.",
            Tier::DeepFrown => "You're frowning a lot.",
            Tier::SevereFrownEncouragement => "Too much frowning! Cheer up!",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tier::Perfect100 => "🎉",
            Tier::PerfectSmile => "😊",
            Tier::BigSmile => "😁",
            Tier::HappySmile => "😄",
            Tier::SlightSmile => "🙂",
            Tier::Natural => "😌",
            Tier::SlightFrown => "😕",
            Tier::Frown => "😣",
            Tier::DeepFrown => "😖",
            Tier::SevereFrownEncouragement => "😫",
        }
    }

    /// Only the top band celebrates
    pub fn is_celebration(&self) -> bool {
        matches!(self, Tier::Perfect100)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            Tier::Perfect100 => "\x1b[35m",                              // Magenta
            Tier::PerfectSmile | Tier::BigSmile | Tier::HappySmile => "\x1b[32m", // Green
            Tier::SlightSmile | Tier::Natural => "\x1b[36m",             // Cyan
            Tier::SlightFrown | Tier::Frown => "\x1b[33m",               // Yellow
            Tier::DeepFrown | Tier::SevereFrownEncouragement => "\x1b[31m", // Red
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}
