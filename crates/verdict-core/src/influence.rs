//! Personality influence — turns a profile plus a decision context into
//! weighted influence signals, and reshapes candidate options with them.
//!
//! Each Big Five trait yields one influence on a single decision aspect. The
//! raw magnitude is then scaled by situation modifiers (only on the aspects a
//! situational pressure is relevant to), cultural modifiers and the caller's
//! current emotional tag, and clamped to [-1, 1].
//!
//! Results are cached per `(decision_type, priority, risk_level)`; a cache hit
//! decays every influence's `temporal_factor` instead of recomputing it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::{ConsistencyError, OperationalError, Result, ValidationError};
use crate::profile::{
    DecisionContext, DecisionStyle, ExperienceOutcome, PersonalityProfile, Trait,
    TraitAdjustments,
};
use crate::reasoning::{DecisionOption, OptionField};
use crate::types::{clamp01, DecisionType};

/// Threshold above which a situational pressure starts modifying influences.
const PRESSURE_THRESHOLD: f64 = 0.7;

// ── Influence records ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceAspect {
    RiskTolerance,
    DecisionThoroughness,
    SocialConsideration,
    CooperativeTendency,
    OptionExploration,
}

impl InfluenceAspect {
    /// The aspect each trait speaks to.
    pub fn for_trait(t: Trait) -> Self {
        match t {
            Trait::Openness => InfluenceAspect::OptionExploration,
            Trait::Conscientiousness => InfluenceAspect::DecisionThoroughness,
            Trait::Extraversion => InfluenceAspect::SocialConsideration,
            Trait::Agreeableness => InfluenceAspect::CooperativeTendency,
            Trait::Neuroticism => InfluenceAspect::RiskTolerance,
        }
    }
}

/// Option fields touched per aspect, with the fixed scaling applied to them.
const ASPECT_EFFECTS: &[(InfluenceAspect, OptionField, f64)] = &[
    (InfluenceAspect::RiskTolerance, OptionField::RiskFactor, -0.3),
    (InfluenceAspect::RiskTolerance, OptionField::ExpectedReturn, 0.1),
    (InfluenceAspect::DecisionThoroughness, OptionField::Complexity, -0.2),
    (InfluenceAspect::SocialConsideration, OptionField::SocialImpact, 0.3),
    (InfluenceAspect::CooperativeTendency, OptionField::CollaborationPotential, 0.4),
    (InfluenceAspect::OptionExploration, OptionField::Novelty, 0.25),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityInfluence {
    pub trait_id: Trait,
    /// -1 .. 1
    pub influence_strength: f64,
    pub affected_aspect: InfluenceAspect,
    pub confidence: f64,
    /// Starts at 1.0, decays on every cache reuse
    pub temporal_factor: f64,
    pub description: String,
}

impl PersonalityInfluence {
    /// Strength after temporal decay.
    pub fn effective_strength(&self) -> f64 {
        self.influence_strength * self.temporal_factor
    }
}

/// Per-aspect multipliers. Empty means identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CulturalModifiers {
    #[serde(default)]
    pub multipliers: BTreeMap<InfluenceAspect, f64>,
}

impl CulturalModifiers {
    pub fn multiplier(&self, aspect: InfluenceAspect) -> f64 {
        self.multipliers.get(&aspect).copied().unwrap_or(1.0)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        for (aspect, m) in &self.multipliers {
            if !m.is_finite() || *m < 0.0 {
                return Err(ValidationError::invalid(
                    format!("cultural_modifiers.{:?}", aspect),
                    "multiplier must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }
}

// ── Influence cache ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    decision_type: DecisionType,
    priority: u8,
    risk_level: u8,
}

impl CacheKey {
    fn from_context(ctx: &DecisionContext) -> Self {
        Self {
            decision_type: ctx.decision_type,
            priority: (ctx.priority * 100.0).round() as u8,
            risk_level: (ctx.risk_level * 100.0).round() as u8,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    influences: Vec<PersonalityInfluence>,
    inserted_at: Instant,
    last_used: Instant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Bounded map with TTL expiry and least-recently-used eviction.
#[derive(Debug)]
struct InfluenceCache {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
    ttl: Duration,
    decay: f64,
    stats: CacheStats,
}

impl InfluenceCache {
    fn new(capacity: usize, ttl: Duration, decay: f64) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
            decay,
            stats: CacheStats::default(),
        }
    }

    /// Decay and return a live entry, dropping it if expired.
    fn hit(&mut self, key: &CacheKey, now: Instant) -> Option<Vec<PersonalityInfluence>> {
        let expired = match self.entries.get(key) {
            Some(entry) => now.duration_since(entry.inserted_at) > self.ttl,
            None => {
                self.stats.misses += 1;
                return None;
            }
        };
        if expired {
            self.entries.remove(key);
            self.stats.misses += 1;
            return None;
        }
        let decay = self.decay;
        let entry = self.entries.get_mut(key)?;
        for inf in entry.influences.iter_mut() {
            inf.temporal_factor *= decay;
        }
        entry.last_used = now;
        self.stats.hits += 1;
        Some(entry.influences.clone())
    }

    fn insert(&mut self, key: CacheKey, influences: Vec<PersonalityInfluence>, now: Instant) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(k, _)| *k)
            {
                self.entries.remove(&oldest);
                self.stats.evictions += 1;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                influences,
                inserted_at: now,
                last_used: now,
            },
        );
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            ..self.stats
        }
    }
}

// ── Engine ──

pub struct PersonalityInfluenceEngine {
    profile: Option<PersonalityProfile>,
    cultural: CulturalModifiers,
    cache: InfluenceCache,
}

impl PersonalityInfluenceEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            profile: None,
            cultural: CulturalModifiers::default(),
            cache: InfluenceCache::new(
                config.influence_cache_capacity,
                config.influence_cache_ttl(),
                config.influence_decay,
            ),
        }
    }

    pub fn with_profile(config: &EngineConfig, profile: PersonalityProfile) -> Result<Self> {
        let mut engine = Self::new(config);
        engine.set_personality_profile(profile)?;
        Ok(engine)
    }

    pub fn set_personality_profile(&mut self, profile: PersonalityProfile) -> Result<()> {
        profile.validate()?;
        info!(
            "Personality profile set (O={:.2} C={:.2} E={:.2} A={:.2} N={:.2})",
            profile.openness,
            profile.conscientiousness,
            profile.extraversion,
            profile.agreeableness,
            profile.neuroticism
        );
        self.profile = Some(profile);
        self.cache.clear();
        Ok(())
    }

    pub fn profile(&self) -> Option<&PersonalityProfile> {
        self.profile.as_ref()
    }

    /// Profile or a consistency error when none has been set.
    pub fn require_profile(&self) -> Result<&PersonalityProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| ConsistencyError::NoPersonalityProfile.into())
    }

    pub fn set_cultural_modifiers(&mut self, modifiers: CulturalModifiers) -> Result<()> {
        modifiers.validate()?;
        self.cultural = modifiers;
        self.cache.clear();
        Ok(())
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Influence signals for this context. Internal failures degrade to an empty list.
    pub fn calculate_personality_influences(
        &mut self,
        context: &DecisionContext,
    ) -> Result<Vec<PersonalityInfluence>> {
        let profile = self.require_profile()?.clone();
        context.validate()?;

        let key = CacheKey::from_context(context);
        let now = Instant::now();
        if let Some(cached) = self.cache.hit(&key, now) {
            debug!("Influence cache hit for {:?}", key);
            return Ok(cached);
        }

        match compute_influences(&profile, context, &self.cultural) {
            Ok(influences) => {
                debug!("Computed {} influences for {:?}", influences.len(), key);
                self.cache.insert(key, influences.clone(), now);
                Ok(influences)
            }
            Err(e) => {
                error!("Personality influence calculation degraded: {}", e);
                Ok(Vec::new())
            }
        }
    }

    /// Reshape option attributes by the active influences.
    pub fn modify_decision_options(
        &mut self,
        mut options: Vec<DecisionOption>,
        context: &DecisionContext,
    ) -> Result<Vec<DecisionOption>> {
        let influences = self.calculate_personality_influences(context)?;
        for option in options.iter_mut() {
            apply_influences(option, &influences);
        }
        Ok(options)
    }

    /// Score of every archetype, highest first.
    pub fn decision_style_scores(
        &self,
        context: &DecisionContext,
    ) -> Result<Vec<(DecisionStyle, f64)>> {
        let p = self.require_profile()?;
        context.validate()?;
        let mut scores: Vec<(DecisionStyle, f64)> = DecisionStyle::ALL
            .into_iter()
            .map(|style| (style, style_score(style, p, context)))
            .collect();
        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scores)
    }

    pub fn predict_decision_style(&self, context: &DecisionContext) -> Result<DecisionStyle> {
        let scores = self.decision_style_scores(context)?;
        Ok(scores
            .first()
            .map(|(style, _)| *style)
            .unwrap_or_default())
    }

    /// Temporary trait shifts this context would induce. Does not touch the profile.
    pub fn adapt_personality_to_context(
        &self,
        context: &DecisionContext,
    ) -> Result<TraitAdjustments> {
        let p = self.require_profile()?;
        context.validate()?;

        let mut adj = TraitAdjustments::default();
        if context.stress_level > 0.6 {
            adj.add(Trait::Neuroticism, 0.1 * context.stress_level);
            adj.add(Trait::Conscientiousness, -0.05 * context.stress_level);
        }
        if context.time_pressure > 0.6 {
            adj.add(Trait::Conscientiousness, -0.05 * context.time_pressure);
            adj.add(Trait::Openness, -0.05 * context.time_pressure);
        }
        if context.social_impact > 0.6 {
            adj.add(Trait::Extraversion, 0.05 * context.social_impact);
            adj.add(Trait::Agreeableness, 0.05 * context.social_impact);
        }
        if context.uncertainty > 0.6 {
            adj.add(Trait::Openness, 0.05 * context.uncertainty);
            adj.risk_tolerance -= 0.05 * context.uncertainty;
        }
        if context.risk_level > PRESSURE_THRESHOLD {
            adj.risk_tolerance -= 0.1 * context.risk_level;
        }

        // Keep profile + delta inside [0, 1]
        for (t, delta) in adj.traits.iter_mut() {
            let v = p.trait_value(*t);
            *delta = delta.clamp(-v, 1.0 - v);
        }
        adj.risk_tolerance = adj
            .risk_tolerance
            .clamp(-p.risk_tolerance, 1.0 - p.risk_tolerance);
        Ok(adj)
    }

    /// Learn from an outcome. Invalidates cached influences.
    pub fn update_personality_from_experience(
        &mut self,
        outcome: &ExperienceOutcome,
    ) -> Result<TraitAdjustments> {
        let profile = self
            .profile
            .as_mut()
            .ok_or(ConsistencyError::NoPersonalityProfile)?;
        let adj = profile.update_from_experience(outcome)?;
        info!(
            "Profile updated from experience (success={}, risk_tolerance={:.3})",
            outcome.success, profile.risk_tolerance
        );
        self.cache.clear();
        Ok(adj)
    }
}

/// Centre a [0, 1] trait on zero: 0 → -1, 0.5 → 0, 1 → 1.
fn centered(v: f64) -> f64 {
    2.0 * v - 1.0
}

fn compute_influences(
    p: &PersonalityProfile,
    ctx: &DecisionContext,
    cultural: &CulturalModifiers,
) -> std::result::Result<Vec<PersonalityInfluence>, OperationalError> {
    let state = ctx.emotional_state.influence_multiplier();
    let mut out = Vec::with_capacity(Trait::ALL.len());

    for t in Trait::ALL {
        let c = centered(p.trait_value(t));
        let (base, description) = match t {
            Trait::Openness => (
                c * (0.5 + 0.5 * ctx.uncertainty),
                "openness shapes appetite for novel options",
            ),
            Trait::Conscientiousness => (
                c * (0.5 + 0.5 * ctx.priority),
                "conscientiousness shapes how thoroughly options are weighed",
            ),
            Trait::Extraversion => (
                c * (0.3 + 0.7 * ctx.social_impact),
                "extraversion shapes attention to social consequences",
            ),
            Trait::Agreeableness => (
                c * (0.4 + 0.6 * ctx.social_impact),
                "agreeableness shapes willingness to cooperate",
            ),
            Trait::Neuroticism => (
                (-0.6 * c + 0.4 * centered(p.risk_tolerance)) * (0.5 + 0.5 * ctx.risk_level),
                "neuroticism and risk tolerance shape acceptable risk",
            ),
        };
        let aspect = InfluenceAspect::for_trait(t);
        let strength = base
            * situation_multiplier(aspect, ctx)
            * cultural.multiplier(aspect)
            * state;
        if !strength.is_finite() {
            return Err(OperationalError::NonFinite {
                stage: "influence strength",
            });
        }
        let confidence = clamp01(0.5 + 0.4 * c.abs()) * (1.0 - 0.3 * ctx.uncertainty);

        out.push(PersonalityInfluence {
            trait_id: t,
            influence_strength: strength.clamp(-1.0, 1.0),
            affected_aspect: aspect,
            confidence,
            temporal_factor: 1.0,
            description: description.to_string(),
        });
    }
    Ok(out)
}

/// Situational pressures scale only the aspects they bear on.
fn situation_multiplier(aspect: InfluenceAspect, ctx: &DecisionContext) -> f64 {
    use InfluenceAspect::*;
    let mut m = 1.0;
    if ctx.risk_level > PRESSURE_THRESHOLD {
        m *= match aspect {
            RiskTolerance => 1.3,
            DecisionThoroughness => 1.2,
            _ => 1.0,
        };
    }
    if ctx.time_pressure > PRESSURE_THRESHOLD {
        m *= match aspect {
            DecisionThoroughness => 0.7,
            OptionExploration => 0.8,
            _ => 1.0,
        };
    }
    if ctx.stress_level > PRESSURE_THRESHOLD {
        m *= match aspect {
            RiskTolerance => 1.2,
            CooperativeTendency => 0.9,
            _ => 1.0,
        };
    }
    if ctx.social_impact > PRESSURE_THRESHOLD {
        m *= match aspect {
            SocialConsideration => 1.3,
            CooperativeTendency => 1.2,
            _ => 1.0,
        };
    }
    if ctx.cognitive_load > PRESSURE_THRESHOLD {
        m *= match aspect {
            DecisionThoroughness => 0.8,
            OptionExploration => 0.7,
            _ => 1.0,
        };
    }
    m
}

fn apply_influences(option: &mut DecisionOption, influences: &[PersonalityInfluence]) {
    for inf in influences {
        for (aspect, field, scale) in ASPECT_EFFECTS {
            if *aspect != inf.affected_aspect {
                continue;
            }
            let slot = option.attributes.field_mut(*field);
            *slot = clamp01(*slot + inf.effective_strength() * scale);
        }
    }
}

/// Weighted trait combination per archetype. Each weight set sums to 1.
fn style_score(style: DecisionStyle, p: &PersonalityProfile, ctx: &DecisionContext) -> f64 {
    let (o, c, e, a, n) = (
        p.openness,
        p.conscientiousness,
        p.extraversion,
        p.agreeableness,
        p.neuroticism,
    );
    let rt = p.risk_tolerance;
    match style {
        DecisionStyle::Analytical => {
            0.5 * c + 0.2 * (1.0 - n) + 0.2 * (1.0 - ctx.time_pressure) + 0.1 * o
        }
        DecisionStyle::Intuitive => 0.4 * o + 0.3 * (1.0 - c) + 0.3 * ctx.time_pressure,
        DecisionStyle::Directive => 0.35 * c + 0.35 * ctx.time_pressure + 0.3 * (1.0 - a),
        DecisionStyle::Conceptual => 0.5 * o + 0.3 * rt + 0.2 * (1.0 - c),
        DecisionStyle::Behavioral => 0.5 * a + 0.3 * e + 0.2 * ctx.social_impact,
        DecisionStyle::Collaborative => 0.4 * e + 0.4 * a + 0.2 * ctx.social_impact,
        DecisionStyle::Cautious => 0.4 * n + 0.3 * ctx.risk_level + 0.3 * (1.0 - rt),
        DecisionStyle::Spontaneous => 0.4 * (1.0 - c) + 0.3 * rt + 0.3 * e,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::test_option;
    use crate::types::EmotionTag;

    fn engine_with(profile: PersonalityProfile) -> PersonalityInfluenceEngine {
        PersonalityInfluenceEngine::with_profile(&EngineConfig::default(), profile).unwrap()
    }

    fn bold() -> PersonalityProfile {
        PersonalityProfile::new(0.9, 0.3, 0.8, 0.7, 0.1, 0.8).unwrap()
    }

    #[test]
    fn test_no_profile_is_consistency_error() {
        let mut engine = PersonalityInfluenceEngine::new(&EngineConfig::default());
        let err = engine
            .calculate_personality_influences(&DecisionContext::default())
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::EngineError::Consistency(ConsistencyError::NoPersonalityProfile)
        ));
    }

    #[test]
    fn test_one_influence_per_trait_within_bounds() {
        let mut engine = engine_with(bold());
        let ctx = DecisionContext::default()
            .with_risk_level(0.95)
            .with_stress_level(0.9)
            .with_emotional_state(EmotionTag::Excited);
        let influences = engine.calculate_personality_influences(&ctx).unwrap();
        assert_eq!(influences.len(), 5);
        for inf in &influences {
            assert!((-1.0..=1.0).contains(&inf.influence_strength));
            assert_eq!(inf.temporal_factor, 1.0);
        }
    }

    #[test]
    fn test_cache_hit_decays_temporal_factor() {
        let mut engine = engine_with(bold());
        let ctx = DecisionContext::default();
        let first = engine.calculate_personality_influences(&ctx).unwrap();
        let second = engine.calculate_personality_influences(&ctx).unwrap();
        let third = engine.calculate_personality_influences(&ctx).unwrap();
        for ((a, b), c) in first.iter().zip(&second).zip(&third) {
            assert_eq!(a.influence_strength.signum(), b.influence_strength.signum());
            assert!((b.temporal_factor - 0.99).abs() < 1e-12);
            assert!(c.temporal_factor < b.temporal_factor);
        }
        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn test_cache_evicts_at_capacity() {
        let config = EngineConfig {
            influence_cache_capacity: 2,
            ..EngineConfig::default()
        };
        let mut engine = PersonalityInfluenceEngine::with_profile(&config, bold()).unwrap();
        for p in [0.1, 0.2, 0.3] {
            let ctx = DecisionContext::default().with_priority(p);
            engine.calculate_personality_influences(&ctx).unwrap();
        }
        let stats = engine.cache_stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_expired_entries_are_recomputed() {
        let config = EngineConfig {
            influence_cache_ttl_secs: 0,
            ..EngineConfig::default()
        };
        let mut engine = PersonalityInfluenceEngine::with_profile(&config, bold()).unwrap();
        let ctx = DecisionContext::default();
        engine.calculate_personality_influences(&ctx).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        let again = engine.calculate_personality_influences(&ctx).unwrap();
        assert!(again.iter().all(|i| i.temporal_factor == 1.0));
    }

    #[test]
    fn test_state_modifier_scales_strength() {
        let ctx = DecisionContext::default();
        let mut calm = engine_with(bold());
        let mut anxious = engine_with(bold());
        let a = calm
            .calculate_personality_influences(&ctx.clone().with_emotional_state(EmotionTag::Calm))
            .unwrap();
        let b = anxious
            .calculate_personality_influences(&ctx.with_emotional_state(EmotionTag::Anxious))
            .unwrap();
        let open_calm = a.iter().find(|i| i.trait_id == Trait::Openness).unwrap();
        let open_anx = b.iter().find(|i| i.trait_id == Trait::Openness).unwrap();
        let ratio = open_calm.influence_strength / open_anx.influence_strength;
        assert!((ratio - 1.1 / 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_time_pressure_only_touches_relevant_aspects() {
        let base = DecisionContext::default();
        let rushed = base.clone().with_time_pressure(0.9);
        let mut e1 = engine_with(bold());
        let mut e2 = engine_with(bold());
        let calm = e1.calculate_personality_influences(&base).unwrap();
        let hurried = e2.calculate_personality_influences(&rushed).unwrap();
        for (x, y) in calm.iter().zip(&hurried) {
            match x.affected_aspect {
                InfluenceAspect::DecisionThoroughness | InfluenceAspect::OptionExploration => {
                    assert!(y.influence_strength.abs() <= x.influence_strength.abs())
                }
                _ => assert_eq!(x.influence_strength, y.influence_strength),
            }
        }
    }

    #[test]
    fn test_cultural_modifier_scales_aspect() {
        let mut engine = engine_with(bold());
        let mut modifiers = CulturalModifiers::default();
        modifiers
            .multipliers
            .insert(InfluenceAspect::CooperativeTendency, 0.0);
        engine.set_cultural_modifiers(modifiers).unwrap();
        let influences = engine
            .calculate_personality_influences(&DecisionContext::default())
            .unwrap();
        let coop = influences
            .iter()
            .find(|i| i.affected_aspect == InfluenceAspect::CooperativeTendency)
            .unwrap();
        assert_eq!(coop.influence_strength, 0.0);
    }

    #[test]
    fn test_negative_cultural_modifier_rejected() {
        let mut engine = engine_with(bold());
        let mut modifiers = CulturalModifiers::default();
        modifiers.multipliers.insert(InfluenceAspect::RiskTolerance, -1.0);
        assert!(engine.set_cultural_modifiers(modifiers).is_err());
    }

    #[test]
    fn test_modify_options_moves_matching_fields() {
        let mut engine = engine_with(bold());
        let option = test_option("a", 0.7, 0.6, crate::types::OptionRiskLevel::Medium);
        let before = option.attributes.clone();
        let out = engine
            .modify_decision_options(vec![option], &DecisionContext::default())
            .unwrap();
        let after = &out[0].attributes;
        // Bold profile: risk-tolerant, exploratory, social
        assert!(after.risk_factor < before.risk_factor);
        assert!(after.novelty > before.novelty);
        assert!(after.collaboration_potential > before.collaboration_potential);
        for v in [after.risk_factor, after.novelty, after.complexity, after.social_impact] {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_predict_analytical_style() {
        let mut profile = PersonalityProfile::default();
        profile.conscientiousness = 0.9;
        profile.neuroticism = 0.1;
        let engine = engine_with(profile);
        let ctx = DecisionContext::default()
            .with_risk_level(0.2)
            .with_time_pressure(0.1);
        assert_eq!(
            engine.predict_decision_style(&ctx).unwrap(),
            DecisionStyle::Analytical
        );
    }

    #[test]
    fn test_predict_collaborative_style() {
        let profile = PersonalityProfile::new(0.4, 0.3, 0.95, 0.95, 0.3, 0.4).unwrap();
        let engine = engine_with(profile);
        let ctx = DecisionContext::default().with_social_impact(0.9);
        let style = engine.predict_decision_style(&ctx).unwrap();
        assert!(matches!(
            style,
            DecisionStyle::Collaborative | DecisionStyle::Behavioral
        ));
    }

    #[test]
    fn test_adaptation_stays_in_bounds() {
        let profile = PersonalityProfile::new(0.5, 0.02, 0.99, 0.5, 0.98, 0.03).unwrap();
        let engine = engine_with(profile.clone());
        let ctx = DecisionContext::default()
            .with_stress_level(1.0)
            .with_time_pressure(1.0)
            .with_social_impact(1.0)
            .with_uncertainty(1.0)
            .with_risk_level(1.0);
        let adj = engine.adapt_personality_to_context(&ctx).unwrap();
        let mut adapted = profile.clone();
        adapted.apply_adjustments(&adj).unwrap();
        assert!(adapted.validate().is_ok());
        assert!(adj.traits[&Trait::Neuroticism] <= 0.02 + 1e-12);
        // Engine profile is untouched
        assert_eq!(engine.profile().unwrap(), &profile);
    }

    #[test]
    fn test_experience_update_clears_cache() {
        let mut engine = engine_with(bold());
        let ctx = DecisionContext::default();
        engine.calculate_personality_influences(&ctx).unwrap();
        engine
            .update_personality_from_experience(&ExperienceOutcome {
                success: false,
                satisfaction: 0.2,
                risk_taken: 0.9,
                social_involvement: 0.0,
                learning_rate: 0.1,
            })
            .unwrap();
        assert_eq!(engine.cache_stats().entries, 0);
        assert!(engine.profile().unwrap().risk_tolerance < 0.8);
    }
}
