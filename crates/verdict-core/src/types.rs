//! Core types — risk buckets, situation kinds, reasoning modes, emotional tags.

use serde::{Deserialize, Serialize};

/// Clamp to the unit interval. NaN collapses to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Fresh v4 identifier rendered as a string.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ── Risk level (severity buckets) ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 5] = [
        RiskLevel::None,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Fixed buckets: ≤0.1 none, ≤0.3 low, ≤0.6 medium, ≤0.8 high, else critical.
    pub fn from_severity(severity: f64) -> Self {
        if severity <= 0.1 {
            RiskLevel::None
        } else if severity <= 0.3 {
            RiskLevel::Low
        } else if severity <= 0.6 {
            RiskLevel::Medium
        } else if severity <= 0.8 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::None => "none",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Option risk level (coarse bucket carried by candidate options) ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionRiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl OptionRiskLevel {
    /// Numeric score used when ranking options.
    pub fn score(&self) -> f64 {
        match self {
            OptionRiskLevel::VeryLow => 0.1,
            OptionRiskLevel::Low => 0.2,
            OptionRiskLevel::Medium => 0.5,
            OptionRiskLevel::High => 0.8,
            OptionRiskLevel::VeryHigh => 1.0,
        }
    }

    /// Confidence multiplier applied when annotating options.
    pub fn confidence_multiplier(&self) -> f64 {
        match self {
            OptionRiskLevel::VeryLow => 1.1,
            OptionRiskLevel::Low => 1.05,
            OptionRiskLevel::Medium => 1.0,
            OptionRiskLevel::High => 0.9,
            OptionRiskLevel::VeryHigh => 0.8,
        }
    }

    /// One bucket riskier, saturating at `VeryHigh`.
    pub fn bumped(&self) -> Self {
        match self {
            OptionRiskLevel::VeryLow => OptionRiskLevel::Low,
            OptionRiskLevel::Low => OptionRiskLevel::Medium,
            OptionRiskLevel::Medium => OptionRiskLevel::High,
            OptionRiskLevel::High | OptionRiskLevel::VeryHigh => OptionRiskLevel::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionRiskLevel::VeryLow => "very_low",
            OptionRiskLevel::Low => "low",
            OptionRiskLevel::Medium => "medium",
            OptionRiskLevel::High => "high",
            OptionRiskLevel::VeryHigh => "very_high",
        }
    }
}

impl std::fmt::Display for OptionRiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ── Situations and decisions ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SituationType {
    Task,
    Problem,
    Decision,
    Communication,
    #[default]
    General,
}

impl SituationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SituationType::Task => "task",
            SituationType::Problem => "problem",
            SituationType::Decision => "decision",
            SituationType::Communication => "communication",
            SituationType::General => "general",
        }
    }
}

impl std::fmt::Display for SituationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Routine,
    Strategic,
    Tactical,
    Social,
    Creative,
    Crisis,
    #[default]
    General,
}

// ── Reasoning ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningType {
    Analytical,
    Creative,
    Intuitive,
    Collaborative,
    Cautious,
    Emotional,
}

impl std::fmt::Display for ReasoningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReasoningType::Analytical => write!(f, "analytical"),
            ReasoningType::Creative => write!(f, "creative"),
            ReasoningType::Intuitive => write!(f, "intuitive"),
            ReasoningType::Collaborative => write!(f, "collaborative"),
            ReasoningType::Cautious => write!(f, "cautious"),
            ReasoningType::Emotional => write!(f, "emotional"),
        }
    }
}

// ── Emotion ──

/// Discrete emotional tag supplied by the emotional-state collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmotionTag {
    Anxious,
    Excited,
    Calm,
    Frustrated,
    Content,
    #[default]
    Neutral,
}

impl EmotionTag {
    /// Multiplier applied to every personality influence.
    pub fn influence_multiplier(&self) -> f64 {
        match self {
            EmotionTag::Anxious => 0.8,
            EmotionTag::Excited => 1.2,
            EmotionTag::Calm => 1.1,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionalTone {
    Positive,
    Neutral,
    Negative,
}

impl EmotionalTone {
    pub fn from_mood(mood_score: f64) -> Self {
        if mood_score > 0.0 {
            EmotionalTone::Positive
        } else if mood_score < 0.0 {
            EmotionalTone::Negative
        } else {
            EmotionalTone::Neutral
        }
    }
}

// ── Trends ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}
