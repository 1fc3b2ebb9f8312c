//! Situation analysis and thought generation.
//!
//! An `Analysis` merges the caller's context with recalled memories, the
//! current mood and the personality influences, then derives key factors,
//! constraints, opportunities and risks. The reasoning mode comes from the
//! dominant trait unless mood is negative, which forces emotional reasoning.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::emotion::EmotionSnapshot;
use crate::error::{ensure_unit, ValidationError};
use crate::influence::PersonalityInfluence;
use crate::memory::MemoryRecord;
use crate::profile::{DecisionContext, DecisionStyle, PersonalityProfile, Trait};
use crate::types::{clamp01, new_id, EmotionalTone, ReasoningType, SituationType};

const HIGH: f64 = 0.7;
const NOTABLE: f64 = 0.6;
const MEMORY_CONFIDENCE_STEP: f64 = 0.02;
const MAX_COUNTED_MEMORIES: usize = 10;
const PATTERN_CONFIDENCE_STEP: f64 = 0.04;
const MAX_COUNTED_PATTERNS: usize = 5;
const UNCERTAINTY_PENALTY: f64 = 0.3;
/// Influences weaker than this are not reported as key factors.
const INFLUENCE_FACTOR_THRESHOLD: f64 = 0.3;
const TRAIT_FACTOR_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Situation {
    #[serde(default = "new_id")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub situation_type: SituationType,
    pub description: String,
    #[serde(default)]
    pub urgency: f64,
    #[serde(default)]
    pub complexity: f64,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Situation {
    pub fn new(situation_type: SituationType, description: &str) -> Self {
        Self {
            id: new_id(),
            situation_type,
            description: description.to_string(),
            urgency: 0.0,
            complexity: 0.0,
            constraints: Vec::new(),
            resources: Vec::new(),
            stakeholders: Vec::new(),
            goals: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_urgency(mut self, v: f64) -> Self {
        self.urgency = v;
        self
    }

    pub fn with_complexity(mut self, v: f64) -> Self {
        self.complexity = v;
        self
    }

    pub fn with_goal(mut self, goal: &str) -> Self {
        self.goals.push(goal.to_string());
        self
    }

    pub fn with_constraint(mut self, constraint: &str) -> Self {
        self.constraints.push(constraint.to_string());
        self
    }

    pub fn with_stakeholder(mut self, who: &str) -> Self {
        self.stakeholders.push(who.to_string());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::missing("situation.id"));
        }
        ensure_unit("situation.urgency", self.urgency)?;
        ensure_unit("situation.complexity", self.complexity)?;
        Ok(())
    }
}

/// A recalled memory of the same situation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub memory_id: String,
    pub description: String,
    pub success: Option<bool>,
    /// importance / 10
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub situation: Situation,
    pub context: DecisionContext,
    pub emotion: EmotionSnapshot,
    pub memories: Vec<MemoryRecord>,
    pub patterns: Vec<Pattern>,
    pub influences: Vec<PersonalityInfluence>,
    pub key_factors: Vec<String>,
    pub constraints: Vec<String>,
    pub opportunities: Vec<String>,
    pub risks: Vec<String>,
    pub reasoning_type: ReasoningType,
    pub confidence: f64,
    #[serde(default)]
    pub predicted_style: Option<DecisionStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThoughtSource {
    Factor,
    Pattern,
    Opportunity,
    Risk,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    pub id: String,
    pub content: String,
    pub reasoning_type: ReasoningType,
    pub source: ThoughtSource,
    pub confidence: f64,
    pub emotional_tone: EmotionalTone,
    /// Traits strong enough to colour this thought
    pub personality_factors: Vec<Trait>,
}

/// Negative mood forces emotional reasoning; otherwise the dominant trait decides.
pub fn reasoning_type_for(profile: Option<&PersonalityProfile>, emotion: &EmotionSnapshot) -> ReasoningType {
    if emotion.is_negative() {
        return ReasoningType::Emotional;
    }
    match profile.map(|p| p.dominant_trait()) {
        Some(Trait::Openness) => ReasoningType::Creative,
        Some(Trait::Conscientiousness) | None => ReasoningType::Analytical,
        Some(Trait::Extraversion) => ReasoningType::Intuitive,
        Some(Trait::Agreeableness) => ReasoningType::Collaborative,
        Some(Trait::Neuroticism) => ReasoningType::Cautious,
    }
}

/// Rises with memory and pattern volume, falls with declared uncertainty.
pub fn analysis_confidence(memories: usize, patterns: usize, uncertainty: f64) -> f64 {
    clamp01(
        0.5 + MEMORY_CONFIDENCE_STEP * memories.min(MAX_COUNTED_MEMORIES) as f64
            + PATTERN_CONFIDENCE_STEP * patterns.min(MAX_COUNTED_PATTERNS) as f64
            - UNCERTAINTY_PENALTY * uncertainty,
    )
}

pub(crate) struct AnalysisInputs<'a> {
    pub situation: &'a Situation,
    pub context: &'a DecisionContext,
    pub emotion: EmotionSnapshot,
    pub memories: Vec<MemoryRecord>,
    pub influences: Vec<PersonalityInfluence>,
    pub profile: Option<&'a PersonalityProfile>,
    pub predicted_style: Option<DecisionStyle>,
}

pub(crate) fn build(inputs: AnalysisInputs<'_>) -> Analysis {
    let AnalysisInputs {
        situation,
        context,
        emotion,
        memories,
        influences,
        profile,
        predicted_style,
    } = inputs;

    let kind = situation.situation_type.as_str();
    let patterns: Vec<Pattern> = memories
        .iter()
        .filter(|m| m.memory_type == kind)
        .map(|m| Pattern {
            memory_id: m.id.clone(),
            description: m.content.clone(),
            success: m.success,
            relevance: clamp01(m.importance as f64 / 10.0),
        })
        .collect();

    let mut key_factors = Vec::new();
    if context.priority > HIGH {
        key_factors.push("High priority".to_string());
    }
    if situation.urgency > HIGH || context.time_pressure > HIGH {
        key_factors.push("Time critical".to_string());
    }
    if situation.complexity > HIGH {
        key_factors.push("High complexity".to_string());
    }
    if !situation.stakeholders.is_empty() {
        key_factors.push(format!("{} stakeholder(s) affected", situation.stakeholders.len()));
    }
    if context.social_impact > NOTABLE {
        key_factors.push("Significant social impact".to_string());
    }
    if context.personal_impact > NOTABLE {
        key_factors.push("Significant personal impact".to_string());
    }
    if context.uncertainty > NOTABLE {
        key_factors.push("High uncertainty".to_string());
    }
    for inf in influences
        .iter()
        .filter(|i| i.effective_strength().abs() > INFLUENCE_FACTOR_THRESHOLD)
    {
        key_factors.push(format!("Personality: {}", inf.description));
    }
    if key_factors.is_empty() {
        key_factors.push(format!("Routine {} with no dominant pressures", kind));
    }

    let mut constraints = situation.constraints.clone();
    if context.time_pressure > HIGH {
        constraints.push("Limited time".to_string());
    }
    if context.cognitive_load > HIGH {
        constraints.push("High cognitive load".to_string());
    }

    let mut opportunities: Vec<String> = patterns
        .iter()
        .filter(|p| p.success == Some(true))
        .map(|p| format!("Reuse approach from: {}", p.description))
        .collect();
    opportunities.extend(situation.goals.iter().map(|g| format!("Advance goal: {}", g)));
    opportunities.extend(situation.resources.iter().map(|r| format!("Leverage available {}", r)));
    if context.uncertainty < 0.3 && context.priority > 0.5 {
        opportunities.push("Clear conditions for decisive action".to_string());
    }

    let mut risks: Vec<String> = patterns
        .iter()
        .filter(|p| p.success == Some(false))
        .map(|p| format!("Repeat of past failure: {}", p.description))
        .collect();
    if context.risk_level > NOTABLE {
        risks.push("Elevated contextual risk".to_string());
    }
    if context.stress_level > HIGH {
        risks.push("Stress may impair judgement".to_string());
    }
    if emotion.is_negative() {
        risks.push("Negative mood may bias the decision".to_string());
    }
    if situation.complexity > HIGH {
        risks.push("Execution complexity".to_string());
    }

    Analysis {
        id: new_id(),
        timestamp: Utc::now(),
        situation: situation.clone(),
        context: context.clone(),
        emotion,
        reasoning_type: reasoning_type_for(profile, &emotion),
        confidence: analysis_confidence(memories.len(), patterns.len(), context.uncertainty),
        memories,
        patterns,
        influences,
        key_factors,
        constraints,
        opportunities,
        risks,
        predicted_style,
    }
}

// ── Thoughts ──

/// Sources each reasoning mode attends to, in order.
fn sources_for(reasoning: ReasoningType) -> &'static [ThoughtSource] {
    use ThoughtSource::*;
    match reasoning {
        ReasoningType::Analytical => &[Factor, Pattern, Risk],
        ReasoningType::Creative => &[Opportunity, Pattern],
        ReasoningType::Intuitive => &[Factor, Opportunity],
        ReasoningType::Collaborative => &[Factor, Opportunity, Constraint],
        ReasoningType::Cautious => &[Risk, Constraint, Pattern],
        ReasoningType::Emotional => &[Risk, Factor],
    }
}

fn phrase(reasoning: ReasoningType, item: &str) -> String {
    match reasoning {
        ReasoningType::Analytical => format!("Weigh the evidence on: {}", item),
        ReasoningType::Creative => format!("What if we build on: {}", item),
        ReasoningType::Intuitive => format!("Gut check on: {}", item),
        ReasoningType::Collaborative => format!("Consider how others see: {}", item),
        ReasoningType::Cautious => format!("Guard against: {}", item),
        ReasoningType::Emotional => format!("This feels significant: {}", item),
    }
}

fn base_confidence(source: ThoughtSource) -> f64 {
    match source {
        ThoughtSource::Factor => 0.7,
        ThoughtSource::Pattern => 0.5,
        ThoughtSource::Opportunity => 0.6,
        ThoughtSource::Risk => 0.65,
        ThoughtSource::Constraint => 0.75,
    }
}

/// One thought per relevant factor, pattern, opportunity, risk or constraint.
pub fn generate_thoughts(analysis: &Analysis, profile: Option<&PersonalityProfile>) -> Vec<Thought> {
    let reasoning = analysis.reasoning_type;
    let tone = EmotionalTone::from_mood(analysis.emotion.mood_score);
    let traits = profile
        .map(|p| p.traits_above(TRAIT_FACTOR_THRESHOLD))
        .unwrap_or_default();
    let damping = 1.0 - 0.2 * analysis.context.uncertainty;
    let mood_factor = if reasoning == ReasoningType::Emotional { 0.9 } else { 1.0 };

    let mut items: Vec<(ThoughtSource, String, f64)> = Vec::new();
    for source in sources_for(reasoning) {
        match source {
            ThoughtSource::Factor => items.extend(
                analysis
                    .key_factors
                    .iter()
                    .map(|f| (*source, f.clone(), base_confidence(*source))),
            ),
            ThoughtSource::Pattern => items.extend(analysis.patterns.iter().map(|p| {
                (
                    *source,
                    p.description.clone(),
                    base_confidence(*source) + 0.4 * p.relevance,
                )
            })),
            ThoughtSource::Opportunity => items.extend(
                analysis
                    .opportunities
                    .iter()
                    .map(|o| (*source, o.clone(), base_confidence(*source))),
            ),
            ThoughtSource::Risk => items.extend(
                analysis
                    .risks
                    .iter()
                    .map(|r| (*source, r.clone(), base_confidence(*source))),
            ),
            ThoughtSource::Constraint => items.extend(
                analysis
                    .constraints
                    .iter()
                    .map(|c| (*source, c.clone(), base_confidence(*source))),
            ),
        }
    }
    // A mode can find nothing it attends to; fall back to the key factors
    if items.is_empty() {
        items.extend(
            analysis
                .key_factors
                .iter()
                .map(|f| (ThoughtSource::Factor, f.clone(), base_confidence(ThoughtSource::Factor))),
        );
    }

    items
        .into_iter()
        .map(|(source, item, confidence)| Thought {
            id: new_id(),
            content: phrase(reasoning, &item),
            reasoning_type: reasoning,
            source,
            confidence: clamp01(confidence * damping * mood_factor),
            emotional_tone: tone,
            personality_factors: traits.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EmotionTag;

    fn memory(id: &str, kind: &str, content: &str, success: Option<bool>) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            memory_type: kind.into(),
            content: content.into(),
            importance: 8,
            timestamp: Utc::now(),
            success,
        }
    }

    fn analyse(
        situation: &Situation,
        context: &DecisionContext,
        emotion: EmotionSnapshot,
        memories: Vec<MemoryRecord>,
        profile: Option<&PersonalityProfile>,
    ) -> Analysis {
        build(AnalysisInputs {
            situation,
            context,
            emotion,
            memories,
            influences: vec![],
            profile,
            predicted_style: None,
        })
    }

    #[test]
    fn test_negative_mood_forces_emotional() {
        let mut p = PersonalityProfile::default();
        p.conscientiousness = 0.9;
        let sad = EmotionSnapshot::new(-0.6, EmotionTag::Frustrated);
        assert_eq!(reasoning_type_for(Some(&p), &sad), ReasoningType::Emotional);
        assert_eq!(
            reasoning_type_for(Some(&p), &EmotionSnapshot::default()),
            ReasoningType::Analytical
        );
    }

    #[test]
    fn test_dominant_trait_picks_mode() {
        let calm = EmotionSnapshot::default();
        let mut p = PersonalityProfile::default();
        p.openness = 0.9;
        assert_eq!(reasoning_type_for(Some(&p), &calm), ReasoningType::Creative);
        p.openness = 0.5;
        p.agreeableness = 0.9;
        assert_eq!(reasoning_type_for(Some(&p), &calm), ReasoningType::Collaborative);
        p.agreeableness = 0.5;
        p.neuroticism = 0.9;
        assert_eq!(reasoning_type_for(Some(&p), &calm), ReasoningType::Cautious);
        assert_eq!(reasoning_type_for(None, &calm), ReasoningType::Analytical);
    }

    #[test]
    fn test_confidence_volume_and_uncertainty() {
        assert!((analysis_confidence(0, 0, 0.0) - 0.5).abs() < 1e-12);
        assert!((analysis_confidence(5, 2, 0.0) - 0.68).abs() < 1e-12);
        // Counts are capped
        assert_eq!(analysis_confidence(50, 50, 0.0), analysis_confidence(10, 5, 0.0));
        assert!(analysis_confidence(3, 1, 0.9) < analysis_confidence(3, 1, 0.1));
    }

    #[test]
    fn test_patterns_match_situation_kind() {
        let s = Situation::new(SituationType::Task, "deploy");
        let memories = vec![
            memory("m1", "task", "deployed with a canary", Some(true)),
            memory("m2", "task", "big-bang rollout", Some(false)),
            memory("m3", "communication", "status email", None),
        ];
        let a = analyse(&s, &DecisionContext::default(), EmotionSnapshot::default(), memories, None);
        assert_eq!(a.patterns.len(), 2);
        assert_eq!(a.memories.len(), 3);
        assert!(a.opportunities.iter().any(|o| o.contains("canary")));
        assert!(a.risks.iter().any(|r| r.contains("big-bang")));
        assert!((a.confidence - (0.5 + 0.06 + 0.08 - 0.15)).abs() < 1e-9);
    }

    #[test]
    fn test_factors_constraints_from_context() {
        let s = Situation::new(SituationType::Decision, "pick a vendor")
            .with_urgency(0.9)
            .with_constraint("budget under 10k")
            .with_stakeholder("finance");
        let ctx = DecisionContext::default()
            .with_time_pressure(0.8)
            .with_priority(0.9);
        let a = analyse(&s, &ctx, EmotionSnapshot::default(), vec![], None);
        assert!(a.key_factors.contains(&"High priority".to_string()));
        assert!(a.key_factors.contains(&"Time critical".to_string()));
        assert!(a.key_factors.iter().any(|f| f.contains("stakeholder")));
        assert_eq!(
            a.constraints,
            vec!["budget under 10k".to_string(), "Limited time".to_string()]
        );
    }

    #[test]
    fn test_quiet_context_still_has_a_factor() {
        let s = Situation::new(SituationType::General, "tidy up");
        let a = analyse(&s, &DecisionContext::default(), EmotionSnapshot::default(), vec![], None);
        assert_eq!(a.key_factors.len(), 1);
        assert!(a.key_factors[0].contains("general"));
    }

    #[test]
    fn test_thoughts_follow_mode_and_mood() {
        let s = Situation::new(SituationType::Task, "deploy").with_goal("ship v2");
        let mut p = PersonalityProfile::default();
        p.openness = 0.9;
        let happy = EmotionSnapshot::new(0.5, EmotionTag::Excited);
        let a = analyse(&s, &DecisionContext::default(), happy, vec![], Some(&p));
        assert_eq!(a.reasoning_type, ReasoningType::Creative);

        let thoughts = generate_thoughts(&a, Some(&p));
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].source, ThoughtSource::Opportunity);
        assert!(thoughts[0].content.contains("ship v2"));
        assert_eq!(thoughts[0].emotional_tone, EmotionalTone::Positive);
        assert_eq!(thoughts[0].personality_factors, vec![Trait::Openness]);
    }

    #[test]
    fn test_empty_mode_falls_back_to_factors() {
        let s = Situation::new(SituationType::Task, "deploy");
        let mut p = PersonalityProfile::default();
        p.openness = 0.9;
        let a = analyse(&s, &DecisionContext::default(), EmotionSnapshot::default(), vec![], Some(&p));
        let thoughts = generate_thoughts(&a, Some(&p));
        assert_eq!(thoughts.len(), 1);
        assert_eq!(thoughts[0].source, ThoughtSource::Factor);
        for t in &thoughts {
            assert!((0.0..=1.0).contains(&t.confidence));
        }
    }

    #[test]
    fn test_situation_yaml_shape() {
        let s: Situation =
            serde_yaml::from_str("type: problem\ndescription: flaky tests\nurgency: 0.4").unwrap();
        assert_eq!(s.situation_type, SituationType::Problem);
        assert!(!s.id.is_empty());
        assert!(s.validate().is_ok());
    }
}
