//! Personality profile and decision context — the value records every engine reads.
//!
//! Traits are addressed through the [`Trait`] enum and an exhaustive accessor
//! table rather than by name, so a misspelled trait can never silently resolve
//! to nothing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;

use crate::error::{ensure_unit, ValidationError};
use crate::types::{clamp01, DecisionType, EmotionTag};

// ── Big Five traits ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trait {
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
}

impl Trait {
    pub const ALL: [Trait; 5] = [
        Trait::Openness,
        Trait::Conscientiousness,
        Trait::Extraversion,
        Trait::Agreeableness,
        Trait::Neuroticism,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trait::Openness => "openness",
            Trait::Conscientiousness => "conscientiousness",
            Trait::Extraversion => "extraversion",
            Trait::Agreeableness => "agreeableness",
            Trait::Neuroticism => "neuroticism",
        }
    }
}

impl std::fmt::Display for Trait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The eight decision-style archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStyle {
    #[default]
    Analytical,
    Intuitive,
    Directive,
    Conceptual,
    Behavioral,
    Collaborative,
    Cautious,
    Spontaneous,
}

impl DecisionStyle {
    pub const ALL: [DecisionStyle; 8] = [
        DecisionStyle::Analytical,
        DecisionStyle::Intuitive,
        DecisionStyle::Directive,
        DecisionStyle::Conceptual,
        DecisionStyle::Behavioral,
        DecisionStyle::Collaborative,
        DecisionStyle::Cautious,
        DecisionStyle::Spontaneous,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SocialOrientation {
    Individualistic,
    Cooperative,
    Competitive,
    #[default]
    Balanced,
}

impl SocialOrientation {
    pub const ALL: [SocialOrientation; 4] = [
        SocialOrientation::Individualistic,
        SocialOrientation::Cooperative,
        SocialOrientation::Competitive,
        SocialOrientation::Balanced,
    ];
}

// ── Profile ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
    pub risk_tolerance: f64,
    #[serde(default)]
    pub decision_style: DecisionStyle,
    #[serde(default)]
    pub social_orientation: SocialOrientation,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
            risk_tolerance: 0.5,
            decision_style: DecisionStyle::default(),
            social_orientation: SocialOrientation::default(),
        }
    }
}

/// Signed per-trait deltas, applied with clamping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitAdjustments {
    #[serde(default)]
    pub traits: BTreeMap<Trait, f64>,
    #[serde(default)]
    pub risk_tolerance: f64,
}

impl TraitAdjustments {
    pub fn is_empty(&self) -> bool {
        self.risk_tolerance == 0.0 && self.traits.values().all(|d| *d == 0.0)
    }

    pub fn add(&mut self, t: Trait, delta: f64) {
        *self.traits.entry(t).or_insert(0.0) += delta;
    }
}

/// What happened after acting on a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceOutcome {
    pub success: bool,
    /// How satisfying the result was, 0..1
    pub satisfaction: f64,
    /// How much risk the chosen option carried, 0..1
    pub risk_taken: f64,
    /// How socially involved the outcome was, 0..1
    #[serde(default)]
    pub social_involvement: f64,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
}

fn default_learning_rate() -> f64 {
    0.05
}

const MAX_LEARNING_RATE: f64 = 0.2;

impl PersonalityProfile {
    /// Build a profile, rejecting any value outside [0, 1].
    pub fn new(
        openness: f64,
        conscientiousness: f64,
        extraversion: f64,
        agreeableness: f64,
        neuroticism: f64,
        risk_tolerance: f64,
    ) -> Result<Self, ValidationError> {
        let profile = Self {
            openness,
            conscientiousness,
            extraversion,
            agreeableness,
            neuroticism,
            risk_tolerance,
            ..Self::default()
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for t in Trait::ALL {
            ensure_unit(t.as_str(), self.trait_value(t))?;
        }
        ensure_unit("risk_tolerance", self.risk_tolerance)?;
        Ok(())
    }

    pub fn trait_value(&self, t: Trait) -> f64 {
        match t {
            Trait::Openness => self.openness,
            Trait::Conscientiousness => self.conscientiousness,
            Trait::Extraversion => self.extraversion,
            Trait::Agreeableness => self.agreeableness,
            Trait::Neuroticism => self.neuroticism,
        }
    }

    fn trait_mut(&mut self, t: Trait) -> &mut f64 {
        match t {
            Trait::Openness => &mut self.openness,
            Trait::Conscientiousness => &mut self.conscientiousness,
            Trait::Extraversion => &mut self.extraversion,
            Trait::Agreeableness => &mut self.agreeableness,
            Trait::Neuroticism => &mut self.neuroticism,
        }
    }

    /// Trait with the highest value; ties resolve in canonical order.
    pub fn dominant_trait(&self) -> Trait {
        let mut best = Trait::Openness;
        for t in Trait::ALL {
            if self.trait_value(t) > self.trait_value(best) {
                best = t;
            }
        }
        best
    }

    /// Traits at or above `threshold`.
    pub fn traits_above(&self, threshold: f64) -> Vec<Trait> {
        Trait::ALL
            .into_iter()
            .filter(|t| self.trait_value(*t) >= threshold)
            .collect()
    }

    /// Apply signed deltas. Every trait stays in [0, 1] afterwards.
    pub fn apply_adjustments(&mut self, adj: &TraitAdjustments) -> Result<(), ValidationError> {
        for (t, delta) in &adj.traits {
            if !delta.is_finite() {
                return Err(ValidationError::NonFinite {
                    field: format!("adjustment.{}", t),
                });
            }
        }
        if !adj.risk_tolerance.is_finite() {
            return Err(ValidationError::NonFinite {
                field: "adjustment.risk_tolerance".into(),
            });
        }
        for (t, delta) in &adj.traits {
            let slot = self.trait_mut(*t);
            *slot = clamp01(*slot + delta);
        }
        self.risk_tolerance = clamp01(self.risk_tolerance + adj.risk_tolerance);
        Ok(())
    }

    /// Nudge the profile towards what the outcome rewarded. Returns the deltas applied.
    pub fn update_from_experience(
        &mut self,
        outcome: &ExperienceOutcome,
    ) -> Result<TraitAdjustments, ValidationError> {
        ensure_unit("outcome.satisfaction", outcome.satisfaction)?;
        ensure_unit("outcome.risk_taken", outcome.risk_taken)?;
        ensure_unit("outcome.social_involvement", outcome.social_involvement)?;
        if !outcome.learning_rate.is_finite() || outcome.learning_rate < 0.0 {
            return Err(ValidationError::out_of_range(
                "outcome.learning_rate",
                0.0,
                MAX_LEARNING_RATE,
                outcome.learning_rate,
            ));
        }
        let lr = outcome.learning_rate.min(MAX_LEARNING_RATE);

        let mut adj = TraitAdjustments::default();
        if outcome.success {
            adj.risk_tolerance = lr * outcome.risk_taken * outcome.satisfaction;
            adj.add(Trait::Neuroticism, -lr * 0.5 * outcome.satisfaction);
            adj.add(Trait::Conscientiousness, lr * 0.25);
            if outcome.social_involvement > 0.5 {
                adj.add(Trait::Extraversion, lr * 0.5 * outcome.social_involvement);
                adj.add(Trait::Agreeableness, lr * 0.25 * outcome.social_involvement);
            }
        } else {
            adj.risk_tolerance = -lr * outcome.risk_taken;
            adj.add(Trait::Neuroticism, lr * 0.5 * (1.0 - outcome.satisfaction));
            adj.add(Trait::Openness, lr * 0.2);
        }
        self.apply_adjustments(&adj)?;
        Ok(adj)
    }

    /// Deterministically derive a profile from raw seed bytes (an agent genome).
    pub fn from_seed(seed_bytes: &[u8]) -> Self {
        let mut hasher = Sha512::new();
        hasher.update(seed_bytes);
        let h = hasher.finalize();

        // Two bytes per trait, mapped into a [0.15, 0.85] band
        fn unit(h: &[u8], offset: usize) -> f64 {
            let chunk = u16::from_be_bytes([h[offset], h[offset + 1]]);
            0.15 + 0.7 * (chunk as f64 / u16::MAX as f64)
        }
        fn pick<T: Copy>(list: &[T], h: &[u8], offset: usize) -> T {
            let chunk = u32::from_be_bytes([h[offset], h[offset + 1], h[offset + 2], h[offset + 3]]);
            list[(chunk as usize) % list.len()]
        }

        Self {
            openness: unit(&h, 0),
            conscientiousness: unit(&h, 2),
            extraversion: unit(&h, 4),
            agreeableness: unit(&h, 6),
            neuroticism: unit(&h, 8),
            risk_tolerance: unit(&h, 10),
            decision_style: pick(&DecisionStyle::ALL, &h, 12),
            social_orientation: pick(&SocialOrientation::ALL, &h, 16),
        }
    }
}

// ── Decision context ──

/// Situational inputs for one decision. Immutable for the duration of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    #[serde(default)]
    pub decision_type: DecisionType,
    #[serde(default = "half")]
    pub priority: f64,
    #[serde(default = "half")]
    pub risk_level: f64,
    #[serde(default = "half")]
    pub uncertainty: f64,
    #[serde(default = "half")]
    pub social_impact: f64,
    #[serde(default = "half")]
    pub personal_impact: f64,
    #[serde(default)]
    pub stress_level: f64,
    #[serde(default)]
    pub time_pressure: f64,
    #[serde(default)]
    pub cognitive_load: f64,
    #[serde(default)]
    pub emotional_state: EmotionTag,
}

fn half() -> f64 {
    0.5
}

impl Default for DecisionContext {
    fn default() -> Self {
        Self::new(DecisionType::General)
    }
}

impl DecisionContext {
    pub fn new(decision_type: DecisionType) -> Self {
        Self {
            decision_type,
            priority: 0.5,
            risk_level: 0.5,
            uncertainty: 0.5,
            social_impact: 0.5,
            personal_impact: 0.5,
            stress_level: 0.0,
            time_pressure: 0.0,
            cognitive_load: 0.0,
            emotional_state: EmotionTag::Neutral,
        }
    }

    pub fn with_priority(mut self, v: f64) -> Self {
        self.priority = v;
        self
    }
    pub fn with_risk_level(mut self, v: f64) -> Self {
        self.risk_level = v;
        self
    }
    pub fn with_uncertainty(mut self, v: f64) -> Self {
        self.uncertainty = v;
        self
    }
    pub fn with_social_impact(mut self, v: f64) -> Self {
        self.social_impact = v;
        self
    }
    pub fn with_personal_impact(mut self, v: f64) -> Self {
        self.personal_impact = v;
        self
    }
    pub fn with_stress_level(mut self, v: f64) -> Self {
        self.stress_level = v;
        self
    }
    pub fn with_time_pressure(mut self, v: f64) -> Self {
        self.time_pressure = v;
        self
    }
    pub fn with_cognitive_load(mut self, v: f64) -> Self {
        self.cognitive_load = v;
        self
    }
    pub fn with_emotional_state(mut self, tag: EmotionTag) -> Self {
        self.emotional_state = tag;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_unit("context.priority", self.priority)?;
        ensure_unit("context.risk_level", self.risk_level)?;
        ensure_unit("context.uncertainty", self.uncertainty)?;
        ensure_unit("context.social_impact", self.social_impact)?;
        ensure_unit("context.personal_impact", self.personal_impact)?;
        ensure_unit("context.stress_level", self.stress_level)?;
        ensure_unit("context.time_pressure", self.time_pressure)?;
        ensure_unit("context.cognitive_load", self.cognitive_load)?;
        Ok(())
    }
}
