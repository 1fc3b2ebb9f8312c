//! Emotional state — read interface onto the agent's mood bookkeeping.

use serde::{Deserialize, Serialize};

use crate::types::{clamp01, EmotionTag};

/// Mood below this counts as negative and forces emotional reasoning.
pub const NEGATIVE_MOOD_THRESHOLD: f64 = -0.25;

/// Point-in-time reading of the agent's emotional state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionSnapshot {
    /// -1 (very negative) .. 1 (very positive)
    pub mood_score: f64,
    #[serde(default)]
    pub tag: EmotionTag,
    /// How strongly the emotion is felt, 0..1
    #[serde(default)]
    pub intensity: f64,
}

impl Default for EmotionSnapshot {
    fn default() -> Self {
        Self {
            mood_score: 0.0,
            tag: EmotionTag::Neutral,
            intensity: 0.0,
        }
    }
}

impl EmotionSnapshot {
    pub fn new(mood_score: f64, tag: EmotionTag) -> Self {
        let mood_score = if mood_score.is_finite() {
            mood_score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        Self {
            mood_score,
            tag,
            intensity: clamp01(mood_score.abs()),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.mood_score < NEGATIVE_MOOD_THRESHOLD
    }
}

/// Collaborator exposing the current mood.
pub trait EmotionSource: Send + Sync {
    fn snapshot(&self) -> EmotionSnapshot;
}

/// A fixed snapshot is its own source.
impl EmotionSource for EmotionSnapshot {
    fn snapshot(&self) -> EmotionSnapshot {
        *self
    }
}
