//! Expression probabilities reported by the detector for one frame

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SmileError};
use crate::PROBABILITY_TOLERANCE;

/// Named expression probabilities, each in [0,1].
///
/// Only `happy`, `sad` and `angry` feed the score and are validated.
/// `surprised` and `neutral` are carried but inert; any other fields the
/// model emits land in `other` untouched, whatever their JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionSample {
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub sad: f64,
    #[serde(default)]
    pub angry: f64,
    #[serde(default)]
    pub surprised: f64,
    #[serde(default)]
    pub neutral: f64,
    /// Unrecognized fields (fearful, disgusted, model metadata, ...)
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl ExpressionSample {
    /// Sample with only the scored expressions set
    pub fn new(happy: f64, sad: f64, angry: f64) -> Self {
        Self {
            happy,
            sad,
            angry,
            ..Default::default()
        }
    }

    /// Build from (name, probability) pairs as a model would report them
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        let mut sample = Self::default();
        for (name, p) in pairs {
            match name {
                "happy" => sample.happy = p,
                "sad" => sample.sad = p,
                "angry" => sample.angry = p,
                "surprised" => sample.surprised = p,
                "neutral" => sample.neutral = p,
                other => {
                    sample.other.insert(other.to_string(), Value::from(p));
                }
            }
        }
        sample
    }

    /// Reject NaN/infinite or out-of-range values in the scored expressions.
    ///
    /// Inert and unknown fields are never checked.
    pub fn validate(&self) -> Result<()> {
        let scored = [("happy", self.happy), ("sad", self.sad), ("angry", self.angry)];

        for (name, p) in scored {
            if !p.is_finite() {
                return Err(SmileError::malformed(format!("{} is not finite", name)));
            }
            if p < -PROBABILITY_TOLERANCE || p > 1.0 + PROBABILITY_TOLERANCE {
                return Err(SmileError::malformed(format!(
                    "{} = {} outside [0,1]",
                    name, p
                )));
            }
        }
        Ok(())
    }
}
