//! Reasoning engine — the Situation → Analysis → Thoughts → Options →
//! Evaluation → Decision pipeline.
//!
//! Each stage produces an immutable artifact that feeds the next. The engine
//! owns the personality and risk engines it calls, plus the memory and
//! emotion collaborators it reads from, and keeps a bounded decision history.

pub mod analysis;
pub mod options;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::emotion::{EmotionSnapshot, EmotionSource};
use crate::error::{ConsistencyError, Result, ValidationError};
use crate::influence::PersonalityInfluenceEngine;
use crate::memory::{MemoryRecall, NoMemory};
use crate::profile::{DecisionContext, ExperienceOutcome, TraitAdjustments};
use crate::risk::{DecisionRiskSummary, RiskAssessmentEngine};
use crate::types::{clamp01, new_id};

pub use analysis::{Analysis, Pattern, Situation, Thought, ThoughtSource};
pub use options::{
    DecisionOption, OptionAttributes, OptionCharacter, OptionField, ResourceRequirements,
};
pub use validate::{PredicateKind, PredicateOutcome, ValidationPredicate, ValidationReport};

/// Supporting thoughts above this confidence add to decision confidence.
const STRONG_THOUGHT: f64 = 0.7;
const STRONG_THOUGHT_BONUS: f64 = 0.02;
const MAX_THOUGHT_BONUS: f64 = 0.1;
const NARRATED_THOUGHTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub situation: Situation,
    pub analysis: Analysis,
    pub thoughts: Vec<Thought>,
    pub options: Vec<DecisionOption>,
    pub selected_index: usize,
    pub selected_option_id: String,
    pub reasoning: String,
    pub confidence: f64,
    pub risk_assessment: DecisionRiskSummary,
    #[serde(default)]
    pub outcome: Option<ExperienceOutcome>,
}

impl Decision {
    /// The chosen entry of `options`.
    pub fn selected_option(&self) -> Option<&DecisionOption> {
        self.options.get(self.selected_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionStatistics {
    pub total: usize,
    pub average_confidence: f64,
    pub by_reasoning_type: BTreeMap<String, usize>,
    pub by_character: BTreeMap<String, usize>,
    pub outcomes_recorded: usize,
    pub success_rate: Option<f64>,
}

pub struct ReasoningEngine {
    influence: PersonalityInfluenceEngine,
    risk: RiskAssessmentEngine,
    memory: Box<dyn MemoryRecall>,
    emotion: Box<dyn EmotionSource>,
    predicates: Vec<Box<dyn ValidationPredicate>>,
    history: VecDeque<Decision>,
    config: EngineConfig,
}

impl ReasoningEngine {
    pub fn new(
        config: &EngineConfig,
        influence: PersonalityInfluenceEngine,
        risk: RiskAssessmentEngine,
        memory: Box<dyn MemoryRecall>,
        emotion: Box<dyn EmotionSource>,
    ) -> Self {
        Self {
            influence,
            risk,
            memory,
            emotion,
            predicates: Vec::new(),
            history: VecDeque::new(),
            config: config.clone(),
        }
    }

    /// Fresh engines, no memories and a neutral mood.
    pub fn with_defaults(config: &EngineConfig) -> Self {
        Self::new(
            config,
            PersonalityInfluenceEngine::new(config),
            RiskAssessmentEngine::new(config),
            Box::new(NoMemory),
            Box::new(EmotionSnapshot::default()),
        )
    }

    pub fn influence(&self) -> &PersonalityInfluenceEngine {
        &self.influence
    }

    pub fn influence_mut(&mut self) -> &mut PersonalityInfluenceEngine {
        &mut self.influence
    }

    pub fn risk(&self) -> &RiskAssessmentEngine {
        &self.risk
    }

    pub fn risk_mut(&mut self) -> &mut RiskAssessmentEngine {
        &mut self.risk
    }

    pub fn set_memory(&mut self, memory: Box<dyn MemoryRecall>) {
        self.memory = memory;
    }

    pub fn set_emotion_source(&mut self, emotion: Box<dyn EmotionSource>) {
        self.emotion = emotion;
    }

    pub fn register_predicate(&mut self, predicate: Box<dyn ValidationPredicate>) {
        info!(
            "Registered {} validation predicate '{}'",
            predicate.kind(),
            predicate.name()
        );
        self.predicates.push(predicate);
    }

    // ── Pipeline stages ──

    pub fn analyze_situation(
        &mut self,
        situation: &Situation,
        context: &DecisionContext,
    ) -> Result<Analysis> {
        situation.validate()?;
        context.validate()?;

        let memories = self.memory.recall_similar(situation);
        let emotion = self.emotion.snapshot();
        let (influences, predicted_style) = if self.influence.profile().is_some() {
            (
                self.influence.calculate_personality_influences(context)?,
                self.influence.predict_decision_style(context).ok(),
            )
        } else {
            debug!("No personality profile; analysing without influences");
            (Vec::new(), None)
        };

        let analysis = analysis::build(analysis::AnalysisInputs {
            situation,
            context,
            emotion,
            memories,
            influences,
            profile: self.influence.profile(),
            predicted_style,
        });
        debug!(
            "Analysis {}: {} reasoning, {} memories, {} patterns, confidence {:.2}",
            analysis.id,
            analysis.reasoning_type,
            analysis.memories.len(),
            analysis.patterns.len(),
            analysis.confidence
        );
        Ok(analysis)
    }

    pub fn generate_thoughts(&self, analysis: &Analysis) -> Vec<Thought> {
        analysis::generate_thoughts(analysis, self.influence.profile())
    }

    /// Archetypal options for the situation, reshaped by personality and annotated.
    pub fn generate_options(
        &mut self,
        analysis: &Analysis,
        thoughts: &[Thought],
    ) -> Result<Vec<DecisionOption>> {
        let mut generated = options::generate(&analysis.situation);
        if self.influence.profile().is_some() {
            generated = self
                .influence
                .modify_decision_options(generated, &analysis.context)?;
        }
        let profile = self.influence.profile();
        for option in generated.iter_mut() {
            options::annotate(option, thoughts, profile, &analysis.situation, &analysis.context);
        }
        Ok(generated)
    }

    /// Score options against the risk model and rank them best first.
    pub fn evaluate_options(
        &self,
        candidates: Vec<DecisionOption>,
        context: &DecisionContext,
    ) -> Result<Vec<DecisionOption>> {
        let report = self.risk.evaluate_decision_risk(&candidates, context)?;
        Ok(options::evaluate(candidates, Some(&report)))
    }

    pub fn make_decision(
        &mut self,
        analysis: Analysis,
        thoughts: Vec<Thought>,
        candidates: Vec<DecisionOption>,
    ) -> Result<Decision> {
        if candidates.is_empty() {
            return Err(ValidationError::empty("options").into());
        }
        for option in &candidates {
            option.validate()?;
        }

        // First option wins ties
        let mut selected = 0;
        for (i, option) in candidates.iter().enumerate().skip(1) {
            if option.selection_score() > candidates[selected].selection_score() {
                selected = i;
            }
        }
        let chosen = &candidates[selected];

        let strong_support = thoughts
            .iter()
            .filter(|t| chosen.supporting_thoughts.contains(&t.id) && t.confidence > STRONG_THOUGHT)
            .count();
        let bonus = (STRONG_THOUGHT_BONUS * strong_support as f64).min(MAX_THOUGHT_BONUS);
        let confidence = clamp01((chosen.confidence + analysis.confidence) / 2.0 + bonus);

        let reasoning = narrate(&analysis, &thoughts, chosen);
        let risk_assessment =
            self.risk
                .summarize_decision_risk(&candidates, selected, &analysis.context);
        if risk_assessment.degraded {
            warn!("Decision risk summary degraded for option '{}'", chosen.id);
        }

        let decision = Decision {
            id: new_id(),
            timestamp: Utc::now(),
            situation: analysis.situation.clone(),
            selected_option_id: chosen.id.clone(),
            analysis,
            thoughts,
            options: candidates,
            selected_index: selected,
            reasoning,
            confidence,
            risk_assessment,
            outcome: None,
        };
        info!(
            "Decision {}: selected '{}' (confidence {:.2}, risk {:.2})",
            decision.id,
            decision.selected_option_id,
            decision.confidence,
            decision.risk_assessment.risk_score
        );

        self.history.push_back(decision.clone());
        if self.history.len() > self.config.decision_history_cap {
            // A trim target at or above the cap trims to the cap
            let keep = self
                .config
                .decision_history_trim_to
                .min(self.config.decision_history_cap);
            let excess = self.history.len().saturating_sub(keep);
            self.history.drain(..excess);
            debug!("Decision history trimmed to {}", self.history.len());
        }
        Ok(decision)
    }

    /// Run the whole pipeline for one situation.
    pub fn decide(&mut self, situation: &Situation, context: &DecisionContext) -> Result<Decision> {
        let analysis = self.analyze_situation(situation, context)?;
        let thoughts = self.generate_thoughts(&analysis);
        let generated = self.generate_options(&analysis, &thoughts)?;
        let ranked = self.evaluate_options(generated, &analysis.context)?;
        self.make_decision(analysis, thoughts, ranked)
    }

    // ── Validation ──

    pub fn validate_decision(&self, decision: &Decision) -> ValidationReport {
        validate::validate_decision(decision, &self.predicates)
    }

    pub fn validate_decision_json(&self, value: &serde_json::Value) -> ValidationReport {
        validate::validate_decision_json(value, &self.predicates)
    }

    // ── History ──

    /// Most recent decisions, newest last.
    pub fn decision_history(&self, limit: Option<usize>) -> Vec<&Decision> {
        let start = limit
            .map(|n| self.history.len().saturating_sub(n))
            .unwrap_or(0);
        self.history.iter().skip(start).collect()
    }

    pub fn get_decision(&self, id: &str) -> Option<&Decision> {
        self.history.iter().find(|d| d.id == id)
    }

    pub fn decision_statistics(&self) -> DecisionStatistics {
        if self.history.is_empty() {
            return DecisionStatistics::default();
        }
        let mut stats = DecisionStatistics {
            total: self.history.len(),
            ..DecisionStatistics::default()
        };
        let mut confidence_sum = 0.0;
        let mut successes = 0usize;
        for d in &self.history {
            confidence_sum += d.confidence;
            *stats
                .by_reasoning_type
                .entry(d.analysis.reasoning_type.to_string())
                .or_insert(0) += 1;
            if let Some(option) = d.selected_option() {
                *stats
                    .by_character
                    .entry(option.character.as_str().to_string())
                    .or_insert(0) += 1;
            }
            if let Some(outcome) = &d.outcome {
                stats.outcomes_recorded += 1;
                if outcome.success {
                    successes += 1;
                }
            }
        }
        stats.average_confidence = confidence_sum / stats.total as f64;
        if stats.outcomes_recorded > 0 {
            stats.success_rate = Some(successes as f64 / stats.outcomes_recorded as f64);
        }
        stats
    }

    /// Attach an outcome to a past decision and learn from it.
    pub fn record_outcome(
        &mut self,
        decision_id: &str,
        outcome: ExperienceOutcome,
    ) -> Result<TraitAdjustments> {
        let index = self
            .history
            .iter()
            .position(|d| d.id == decision_id)
            .ok_or_else(|| ConsistencyError::UnknownDecision {
                id: decision_id.to_string(),
            })?;
        let adjustments = self.influence.update_personality_from_experience(&outcome)?;
        self.history[index].outcome = Some(outcome);
        Ok(adjustments)
    }
}

/// Human-readable trace from analysis, chosen option and its best thoughts.
fn narrate(analysis: &Analysis, thoughts: &[Thought], chosen: &DecisionOption) -> String {
    let mut parts = vec![
        format!(
            "Situation: {} '{}'.",
            analysis.situation.situation_type, analysis.situation.description
        ),
        format!(
            "Approached with {} reasoning (analysis confidence {:.2}).",
            analysis.reasoning_type, analysis.confidence
        ),
    ];
    if !analysis.key_factors.is_empty() {
        parts.push(format!("Key factors: {}.", analysis.key_factors.join("; ")));
    }
    parts.push(format!(
        "Selected '{}' ({}): confidence {:.2}, personality fit {:.2}, {} risk.",
        chosen.name,
        chosen.character.as_str(),
        chosen.confidence,
        chosen.personality_fit,
        chosen.risk_level.as_str()
    ));

    let mut support: Vec<&Thought> = thoughts
        .iter()
        .filter(|t| chosen.supporting_thoughts.contains(&t.id))
        .collect();
    support.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if !support.is_empty() {
        let lines: Vec<&str> = support
            .iter()
            .take(NARRATED_THOUGHTS)
            .map(|t| t.content.as_str())
            .collect();
        parts.push(format!("Supporting thoughts: {}.", lines.join("; ")));
    }
    if !chosen.pros.is_empty() {
        parts.push(format!("Pros: {}.", chosen.pros.join(", ")));
    }
    if !chosen.cons.is_empty() {
        parts.push(format!("Trade-offs: {}.", chosen.cons.join(", ")));
    }
    parts.join(" ")
}

#[cfg(test)]
pub(crate) fn test_option(
    id: &str,
    confidence: f64,
    personality_fit: f64,
    risk_level: crate::types::OptionRiskLevel,
) -> DecisionOption {
    DecisionOption {
        id: id.to_string(),
        name: format!("Option {}", id),
        description: String::new(),
        character: OptionCharacter::Balanced,
        actions: vec![format!("carry out {}", id)],
        pros: vec![],
        cons: vec![],
        risk_level,
        confidence,
        personality_fit,
        effectiveness: 0.5,
        efficiency: 0.5,
        attributes: OptionAttributes::default(),
        resources: ResourceRequirements::default(),
        risk_score: None,
        evaluation_score: None,
        supporting_thoughts: vec![],
    }
}

#[cfg(test)]
pub(crate) fn test_decision() -> Decision {
    let mut engine = ReasoningEngine::with_defaults(&EngineConfig::default());
    engine
        .influence_mut()
        .set_personality_profile(crate::profile::PersonalityProfile::default())
        .unwrap();
    let situation = Situation::new(crate::types::SituationType::Task, "deploy the search service")
        .with_goal("zero downtime");
    engine.decide(&situation, &DecisionContext::default()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::memory::MemoryStream;
    use crate::profile::PersonalityProfile;
    use crate::risk::{NewRisk, RiskCategory};
    use crate::types::{EmotionTag, OptionRiskLevel, ReasoningType, SituationType};

    fn engine() -> ReasoningEngine {
        let mut e = ReasoningEngine::with_defaults(&EngineConfig::default());
        let mut p = PersonalityProfile::default();
        p.conscientiousness = 0.8;
        e.influence_mut().set_personality_profile(p).unwrap();
        e
    }

    #[test]
    fn test_weighted_selection_example() {
        let mut e = engine();
        let situation = Situation::new(SituationType::Decision, "choose a plan");
        let analysis = e
            .analyze_situation(&situation, &DecisionContext::default())
            .unwrap();
        let a = test_option("a", 0.8, 0.7, OptionRiskLevel::Low);
        let b = test_option("b", 0.9, 0.5, OptionRiskLevel::High);
        assert!((a.selection_score() - 0.77).abs() < 1e-9);
        assert!((b.selection_score() - 0.57).abs() < 1e-9);

        let d = e.make_decision(analysis, vec![], vec![a.clone(), b]).unwrap();
        assert_eq!(d.selected_option_id, "a");
        assert_eq!(d.selected_option(), Some(&a));
    }

    #[test]
    fn test_tie_keeps_first() {
        let mut e = engine();
        let analysis = e
            .analyze_situation(&Situation::new(SituationType::General, "x"), &DecisionContext::default())
            .unwrap();
        let a = test_option("first", 0.6, 0.6, OptionRiskLevel::Medium);
        let b = test_option("second", 0.6, 0.6, OptionRiskLevel::Medium);
        let d = e.make_decision(analysis, vec![], vec![a, b]).unwrap();
        assert_eq!(d.selected_index, 0);
    }

    #[test]
    fn test_make_decision_rejects_empty_and_invalid() {
        let mut e = engine();
        let situation = Situation::new(SituationType::Task, "x");
        let analysis = e
            .analyze_situation(&situation, &DecisionContext::default())
            .unwrap();
        assert!(matches!(
            e.make_decision(analysis.clone(), vec![], vec![]).unwrap_err(),
            EngineError::Validation(ValidationError::EmptyTargetSet { .. })
        ));
        let bad = test_option("bad", 1.5, 0.5, OptionRiskLevel::Low);
        assert!(e.make_decision(analysis, vec![], vec![bad]).is_err());
        assert!(e.decision_history(None).is_empty());
    }

    #[test]
    fn test_decide_full_pipeline() {
        let mut e = engine();
        let situation = Situation::new(SituationType::Problem, "search latency spikes")
            .with_complexity(0.8)
            .with_goal("p99 under 200ms");
        let d = e.decide(&situation, &DecisionContext::default()).unwrap();

        assert_eq!(d.options.len(), 2);
        let selected = d.selected_option().unwrap();
        assert_eq!(selected.id, d.selected_option_id);
        assert!(d.options.iter().all(|o| o.evaluation_score.is_some()));
        assert!(d.options[0].evaluation_score >= d.options[1].evaluation_score);
        assert_eq!(d.analysis.reasoning_type, ReasoningType::Analytical);
        assert!(d.reasoning.contains(&selected.name));
        assert!((0.0..=1.0).contains(&d.confidence));
        assert!(!d.risk_assessment.degraded);
        assert!(!d.risk_assessment.recommendations.is_empty());
        assert!(e.validate_decision(&d).valid);
        assert_eq!(e.get_decision(&d.id).map(|x| x.id.clone()), Some(d.id.clone()));
    }

    #[test]
    fn test_decide_without_profile_is_neutral() {
        let mut e = ReasoningEngine::with_defaults(&EngineConfig::default());
        let d = e
            .decide(&Situation::new(SituationType::General, "x"), &DecisionContext::default())
            .unwrap();
        assert!(d.analysis.influences.is_empty());
        assert!(d.options.iter().all(|o| o.personality_fit == 0.5));
    }

    #[test]
    fn test_negative_mood_reasoning() {
        let mut e = engine();
        e.set_emotion_source(Box::new(EmotionSnapshot::new(-0.7, EmotionTag::Anxious)));
        let d = e
            .decide(&Situation::new(SituationType::Task, "x"), &DecisionContext::default())
            .unwrap();
        assert_eq!(d.analysis.reasoning_type, ReasoningType::Emotional);
        assert!(d.analysis.risks.iter().any(|r| r.contains("mood")));
    }

    #[test]
    fn test_memories_raise_analysis_confidence() {
        let mut e = engine();
        let situation = Situation::new(SituationType::Task, "deploy the billing service");
        let bare = e
            .analyze_situation(&situation, &DecisionContext::default())
            .unwrap();

        let mut stream = MemoryStream::default();
        stream.add("task", "deployed the billing service with a canary", 8, Some(true));
        stream.add("task", "deploy of search service rolled back", 6, Some(false));
        e.set_memory(Box::new(stream));
        let informed = e
            .analyze_situation(&situation, &DecisionContext::default())
            .unwrap();
        assert_eq!(informed.patterns.len(), 2);
        assert!(informed.confidence > bare.confidence);
    }

    #[test]
    fn test_open_registry_risk_flows_into_summary() {
        let mut e = engine();
        e.risk_mut()
            .add_risk(NewRisk::new("vendor lock-in", RiskCategory::Strategic, 0.9, 0.9))
            .unwrap();
        let d = e
            .decide(&Situation::new(SituationType::Decision, "pick a vendor"), &DecisionContext::default())
            .unwrap();
        assert_eq!(d.risk_assessment.open_high_risks, 1);
    }

    #[test]
    fn test_history_trimmed() {
        let config = EngineConfig {
            decision_history_cap: 4,
            decision_history_trim_to: 2,
            ..EngineConfig::default()
        };
        let mut e = ReasoningEngine::with_defaults(&config);
        let situation = Situation::new(SituationType::General, "x");
        for _ in 0..5 {
            e.decide(&situation, &DecisionContext::default()).unwrap();
        }
        assert_eq!(e.decision_history(None).len(), 2);
        assert_eq!(e.decision_statistics().total, 2);
    }

    #[test]
    fn test_history_trim_target_above_cap_clamps() {
        let config = EngineConfig {
            decision_history_cap: 4,
            decision_history_trim_to: 10,
            ..EngineConfig::default()
        };
        let mut e = ReasoningEngine::with_defaults(&config);
        let situation = Situation::new(SituationType::General, "x");
        for _ in 0..6 {
            e.decide(&situation, &DecisionContext::default()).unwrap();
        }
        assert_eq!(e.decision_history(None).len(), 4);
    }

    #[test]
    fn test_record_outcome_learns() {
        let mut e = engine();
        let d = e
            .decide(&Situation::new(SituationType::Task, "x"), &DecisionContext::default())
            .unwrap();
        let before = e.influence().profile().unwrap().risk_tolerance;
        e.record_outcome(
            &d.id,
            ExperienceOutcome {
                success: true,
                satisfaction: 1.0,
                risk_taken: 0.8,
                social_involvement: 0.0,
                learning_rate: 0.1,
            },
        )
        .unwrap();
        assert!(e.influence().profile().unwrap().risk_tolerance > before);
        let stats = e.decision_statistics();
        assert_eq!(stats.outcomes_recorded, 1);
        assert_eq!(stats.success_rate, Some(1.0));

        assert!(matches!(
            e.record_outcome(
                "missing",
                ExperienceOutcome {
                    success: false,
                    satisfaction: 0.0,
                    risk_taken: 0.0,
                    social_involvement: 0.0,
                    learning_rate: 0.05,
                },
            )
            .unwrap_err(),
            EngineError::Consistency(ConsistencyError::UnknownDecision { .. })
        ));
    }

    #[test]
    fn test_invalid_situation_rejected() {
        let mut e = engine();
        let s = Situation::new(SituationType::Task, "x").with_urgency(2.0);
        assert!(matches!(
            e.decide(&s, &DecisionContext::default()).unwrap_err(),
            EngineError::Validation(_)
        ));
    }
}
