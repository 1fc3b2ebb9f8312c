//! Candidate options — archetype generation per situation kind, annotation
//! (confidence, personality fit, risk bucket) and multi-criteria evaluation.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_unit, ValidationError};
use crate::profile::{DecisionContext, PersonalityProfile};
use crate::reasoning::analysis::{Situation, Thought, ThoughtSource};
use crate::risk::DecisionRiskReport;
use crate::types::{clamp01, OptionRiskLevel, ReasoningType, SituationType};

/// Pressure above which an option's risk bucket is bumped one step.
const URGENCY_BUMP_THRESHOLD: f64 = 0.7;
const BASE_CONFIDENCE: f64 = 0.5;
const SUPPORT_BONUS: f64 = 0.05;
const MAX_SUPPORT_BONUS: f64 = 0.25;
const BASE_FIT: f64 = 0.5;

// ── Attributes ──

/// Numeric option fields the personality influences can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    RiskFactor,
    ExpectedReturn,
    Complexity,
    SocialImpact,
    Novelty,
    CollaborationPotential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionAttributes {
    pub risk_factor: f64,
    pub expected_return: f64,
    pub complexity: f64,
    pub social_impact: f64,
    pub novelty: f64,
    pub collaboration_potential: f64,
    #[serde(default)]
    pub resource_intensive: bool,
    #[serde(default)]
    pub time_sensitive: bool,
}

impl Default for OptionAttributes {
    fn default() -> Self {
        Self {
            risk_factor: 0.5,
            expected_return: 0.5,
            complexity: 0.5,
            social_impact: 0.5,
            novelty: 0.5,
            collaboration_potential: 0.5,
            resource_intensive: false,
            time_sensitive: false,
        }
    }
}

impl OptionAttributes {
    pub fn field(&self, field: OptionField) -> f64 {
        match field {
            OptionField::RiskFactor => self.risk_factor,
            OptionField::ExpectedReturn => self.expected_return,
            OptionField::Complexity => self.complexity,
            OptionField::SocialImpact => self.social_impact,
            OptionField::Novelty => self.novelty,
            OptionField::CollaborationPotential => self.collaboration_potential,
        }
    }

    pub fn field_mut(&mut self, field: OptionField) -> &mut f64 {
        match field {
            OptionField::RiskFactor => &mut self.risk_factor,
            OptionField::ExpectedReturn => &mut self.expected_return,
            OptionField::Complexity => &mut self.complexity,
            OptionField::SocialImpact => &mut self.social_impact,
            OptionField::Novelty => &mut self.novelty,
            OptionField::CollaborationPotential => &mut self.collaboration_potential,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_unit("option.risk_factor", self.risk_factor)?;
        ensure_unit("option.expected_return", self.expected_return)?;
        ensure_unit("option.complexity", self.complexity)?;
        ensure_unit("option.social_impact", self.social_impact)?;
        ensure_unit("option.novelty", self.novelty)?;
        ensure_unit("option.collaboration_potential", self.collaboration_potential)?;
        Ok(())
    }
}

/// Fixed trade-off profile of an archetypal option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptionCharacter {
    Conservative,
    Ambitious,
    Analytical,
    Creative,
    Direct,
    Consultative,
    #[default]
    Balanced,
    Exploratory,
}

impl OptionCharacter {
    /// Thought sources that argue for this kind of option.
    fn supported_by(&self) -> &'static [ThoughtSource] {
        use ThoughtSource::*;
        match self {
            OptionCharacter::Conservative => &[Risk, Constraint],
            OptionCharacter::Ambitious => &[Opportunity],
            OptionCharacter::Analytical => &[Factor, Pattern],
            OptionCharacter::Creative => &[Opportunity, Pattern],
            OptionCharacter::Direct => &[Factor, Constraint],
            OptionCharacter::Consultative => &[Opportunity, Constraint],
            OptionCharacter::Balanced => &[Factor, Risk],
            OptionCharacter::Exploratory => &[Opportunity, Pattern],
        }
    }

    /// Reasoning modes whose every thought leans toward this option.
    fn suits(&self, reasoning: ReasoningType) -> bool {
        use ReasoningType::*;
        matches!(
            (self, reasoning),
            (OptionCharacter::Analytical, Analytical)
                | (OptionCharacter::Conservative, Cautious)
                | (OptionCharacter::Creative, Creative)
                | (OptionCharacter::Exploratory, Creative)
                | (OptionCharacter::Direct, Intuitive)
                | (OptionCharacter::Ambitious, Intuitive)
                | (OptionCharacter::Consultative, Collaborative)
                | (OptionCharacter::Balanced, Emotional)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionCharacter::Conservative => "conservative",
            OptionCharacter::Ambitious => "ambitious",
            OptionCharacter::Analytical => "analytical",
            OptionCharacter::Creative => "creative",
            OptionCharacter::Direct => "direct",
            OptionCharacter::Consultative => "consultative",
            OptionCharacter::Balanced => "balanced",
            OptionCharacter::Exploratory => "exploratory",
        }
    }
}

/// Relative demand on each resource, 0 (none) .. 1 (all available).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub time: f64,
    pub effort: f64,
    pub cost: f64,
    #[serde(default)]
    pub people: u32,
    #[serde(default)]
    pub tools: Vec<String>,
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            time: 0.5,
            effort: 0.5,
            cost: 0.5,
            people: 1,
            tools: Vec::new(),
        }
    }
}

impl ResourceRequirements {
    pub fn load(&self) -> f64 {
        clamp01((self.time + self.effort + self.cost) / 3.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub character: OptionCharacter,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    pub risk_level: OptionRiskLevel,
    pub confidence: f64,
    pub personality_fit: f64,
    #[serde(default = "default_half")]
    pub effectiveness: f64,
    #[serde(default = "default_half")]
    pub efficiency: f64,
    #[serde(default)]
    pub attributes: OptionAttributes,
    #[serde(default)]
    pub resources: ResourceRequirements,
    /// Filled in by evaluation
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default)]
    pub evaluation_score: Option<f64>,
    /// Ids of thoughts that argue for this option
    #[serde(default)]
    pub supporting_thoughts: Vec<String>,
}

fn default_half() -> f64 {
    0.5
}

impl DecisionOption {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::missing("option.id"));
        }
        ensure_unit("option.confidence", self.confidence)?;
        ensure_unit("option.personality_fit", self.personality_fit)?;
        ensure_unit("option.effectiveness", self.effectiveness)?;
        ensure_unit("option.efficiency", self.efficiency)?;
        self.attributes.validate()
    }

    /// Score used to pick the final option.
    pub fn selection_score(&self) -> f64 {
        0.4 * self.confidence + 0.3 * self.personality_fit + 0.3 * (1.0 - self.risk_level.score())
    }
}

// ── Generation ──

struct Archetype {
    key: &'static str,
    name: &'static str,
    character: OptionCharacter,
    actions: &'static [&'static str],
    pros: &'static [&'static str],
    cons: &'static [&'static str],
    risk: OptionRiskLevel,
    effectiveness: f64,
    efficiency: f64,
    attributes: OptionAttributes,
    resources: (f64, f64, f64),
}

fn archetypes(kind: SituationType) -> [Archetype; 2] {
    let base = OptionAttributes::default();
    match kind {
        SituationType::Task => [
            Archetype {
                key: "standard",
                name: "Standard approach",
                character: OptionCharacter::Conservative,
                actions: &["Follow the established procedure", "Verify the result against the goals"],
                pros: &["Predictable outcome", "Low coordination overhead"],
                cons: &["Leaves improvements on the table"],
                risk: OptionRiskLevel::Low,
                effectiveness: 0.7,
                efficiency: 0.6,
                attributes: OptionAttributes {
                    risk_factor: 0.2,
                    expected_return: 0.5,
                    complexity: 0.3,
                    social_impact: 0.3,
                    novelty: 0.1,
                    collaboration_potential: 0.3,
                    ..base.clone()
                },
                resources: (0.5, 0.4, 0.3),
            },
            Archetype {
                key: "optimized",
                name: "Optimized approach",
                character: OptionCharacter::Ambitious,
                actions: &[
                    "Identify the slowest step",
                    "Redesign the workflow around it",
                    "Measure the gain",
                ],
                pros: &["Higher payoff", "Improves future runs"],
                cons: &["Needs more effort up front", "New steps can fail"],
                risk: OptionRiskLevel::Medium,
                effectiveness: 0.85,
                efficiency: 0.8,
                attributes: OptionAttributes {
                    risk_factor: 0.45,
                    expected_return: 0.8,
                    complexity: 0.6,
                    social_impact: 0.3,
                    novelty: 0.5,
                    collaboration_potential: 0.3,
                    resource_intensive: true,
                    ..base.clone()
                },
                resources: (0.4, 0.7, 0.5),
            },
        ],
        SituationType::Problem => [
            Archetype {
                key: "analytical",
                name: "Analytical solution",
                character: OptionCharacter::Analytical,
                actions: &[
                    "Isolate the root cause",
                    "Compare candidate fixes on evidence",
                    "Apply the best-supported fix",
                ],
                pros: &["Grounded in evidence", "Easy to explain"],
                cons: &["Slower to first result"],
                risk: OptionRiskLevel::Low,
                effectiveness: 0.8,
                efficiency: 0.5,
                attributes: OptionAttributes {
                    risk_factor: 0.25,
                    expected_return: 0.6,
                    complexity: 0.6,
                    novelty: 0.2,
                    ..base.clone()
                },
                resources: (0.7, 0.6, 0.3),
            },
            Archetype {
                key: "creative",
                name: "Creative solution",
                character: OptionCharacter::Creative,
                actions: &[
                    "Reframe the problem",
                    "Prototype an unconventional fix",
                    "Keep what works",
                ],
                pros: &["Can unlock a step change", "Avoids known dead ends"],
                cons: &["Unproven", "Harder to predict"],
                risk: OptionRiskLevel::Medium,
                effectiveness: 0.75,
                efficiency: 0.6,
                attributes: OptionAttributes {
                    risk_factor: 0.5,
                    expected_return: 0.75,
                    complexity: 0.5,
                    novelty: 0.8,
                    ..base.clone()
                },
                resources: (0.5, 0.6, 0.4),
            },
        ],
        SituationType::Decision => [
            Archetype {
                key: "careful_deliberation",
                name: "Careful deliberation",
                character: OptionCharacter::Conservative,
                actions: &[
                    "List the alternatives and their consequences",
                    "Gather the missing information",
                    "Decide against explicit criteria",
                ],
                pros: &["Fewer surprises", "Defensible outcome"],
                cons: &["Takes time", "May miss a window"],
                risk: OptionRiskLevel::Low,
                effectiveness: 0.75,
                efficiency: 0.4,
                attributes: OptionAttributes {
                    risk_factor: 0.2,
                    expected_return: 0.55,
                    complexity: 0.5,
                    novelty: 0.2,
                    ..base.clone()
                },
                resources: (0.8, 0.6, 0.3),
            },
            Archetype {
                key: "decisive_action",
                name: "Decisive action",
                character: OptionCharacter::Direct,
                actions: &["Commit to the leading alternative", "Review after the first result"],
                pros: &["Fast", "Keeps momentum"],
                cons: &["Acts on partial information"],
                risk: OptionRiskLevel::High,
                effectiveness: 0.7,
                efficiency: 0.9,
                attributes: OptionAttributes {
                    risk_factor: 0.55,
                    expected_return: 0.65,
                    complexity: 0.3,
                    novelty: 0.3,
                    time_sensitive: true,
                    ..base.clone()
                },
                resources: (0.2, 0.4, 0.3),
            },
        ],
        SituationType::Communication => [
            Archetype {
                key: "direct_message",
                name: "Direct message",
                character: OptionCharacter::Direct,
                actions: &["State the point plainly", "Ask for a specific response"],
                pros: &["Clear", "Quick"],
                cons: &["Can read as abrupt"],
                risk: OptionRiskLevel::Low,
                effectiveness: 0.65,
                efficiency: 0.85,
                attributes: OptionAttributes {
                    risk_factor: 0.25,
                    expected_return: 0.5,
                    complexity: 0.2,
                    social_impact: 0.4,
                    novelty: 0.1,
                    collaboration_potential: 0.3,
                    ..base.clone()
                },
                resources: (0.2, 0.2, 0.1),
            },
            Archetype {
                key: "collaborative_dialogue",
                name: "Collaborative dialogue",
                character: OptionCharacter::Consultative,
                actions: &[
                    "Invite the stakeholders' views",
                    "Summarise the common ground",
                    "Agree next steps together",
                ],
                pros: &["Builds buy-in", "Surfaces concerns early"],
                cons: &["Slower", "Needs everyone's time"],
                risk: OptionRiskLevel::VeryLow,
                effectiveness: 0.8,
                efficiency: 0.5,
                attributes: OptionAttributes {
                    risk_factor: 0.15,
                    expected_return: 0.6,
                    complexity: 0.4,
                    social_impact: 0.8,
                    novelty: 0.2,
                    collaboration_potential: 0.9,
                    ..base.clone()
                },
                resources: (0.6, 0.5, 0.2),
            },
        ],
        SituationType::General => [
            Archetype {
                key: "balanced",
                name: "Balanced approach",
                character: OptionCharacter::Balanced,
                actions: &["Take the well-understood path", "Adjust as feedback arrives"],
                pros: &["Reasonable on every axis"],
                cons: &["Excels at nothing"],
                risk: OptionRiskLevel::Low,
                effectiveness: 0.65,
                efficiency: 0.65,
                attributes: OptionAttributes {
                    risk_factor: 0.3,
                    novelty: 0.3,
                    ..base.clone()
                },
                resources: (0.5, 0.5, 0.4),
            },
            Archetype {
                key: "exploratory",
                name: "Exploratory approach",
                character: OptionCharacter::Exploratory,
                actions: &["Try a small experiment first", "Scale up what the experiment shows"],
                pros: &["Learns quickly", "Cheap to abandon"],
                cons: &["Outcome is uncertain"],
                risk: OptionRiskLevel::Medium,
                effectiveness: 0.7,
                efficiency: 0.55,
                attributes: OptionAttributes {
                    risk_factor: 0.45,
                    expected_return: 0.65,
                    novelty: 0.7,
                    ..base
                },
                resources: (0.4, 0.5, 0.3),
            },
        ],
    }
}

/// Two archetypal options for the situation kind, before annotation.
pub fn generate(situation: &Situation) -> Vec<DecisionOption> {
    archetypes(situation.situation_type)
        .into_iter()
        .map(|a| {
            let mut actions: Vec<String> = a.actions.iter().map(|s| s.to_string()).collect();
            actions.extend(situation.goals.iter().map(|g| format!("Deliver: {}", g)));
            let mut cons: Vec<String> = a.cons.iter().map(|s| s.to_string()).collect();
            if a.risk >= OptionRiskLevel::Medium {
                cons.extend(
                    situation
                        .constraints
                        .iter()
                        .map(|c| format!("Must still respect: {}", c)),
                );
            }
            DecisionOption {
                id: a.key.to_string(),
                name: a.name.to_string(),
                description: format!("{} for '{}'", a.name, situation.description),
                character: a.character,
                actions,
                pros: a.pros.iter().map(|s| s.to_string()).collect(),
                cons,
                risk_level: a.risk,
                confidence: BASE_CONFIDENCE,
                personality_fit: BASE_FIT,
                effectiveness: a.effectiveness,
                efficiency: a.efficiency,
                attributes: a.attributes,
                resources: ResourceRequirements {
                    time: a.resources.0,
                    effort: a.resources.1,
                    cost: a.resources.2,
                    people: if a.character == OptionCharacter::Consultative {
                        situation.stakeholders.len().max(1) as u32
                    } else {
                        1
                    },
                    tools: situation.resources.clone(),
                },
                risk_score: None,
                evaluation_score: None,
                supporting_thoughts: Vec::new(),
            }
        })
        .collect()
}

// ── Annotation ──

/// Set supporting thoughts, confidence, personality fit and the final risk bucket.
pub fn annotate(
    option: &mut DecisionOption,
    thoughts: &[Thought],
    profile: Option<&PersonalityProfile>,
    situation: &Situation,
    context: &DecisionContext,
) {
    option.supporting_thoughts = thoughts
        .iter()
        .filter(|t| {
            option.character.supported_by().contains(&t.source) || option.character.suits(t.reasoning_type)
        })
        .map(|t| t.id.clone())
        .collect();

    if situation.urgency.max(context.time_pressure) > URGENCY_BUMP_THRESHOLD {
        option.risk_level = option.risk_level.bumped();
    }

    let support = (SUPPORT_BONUS * option.supporting_thoughts.len() as f64).min(MAX_SUPPORT_BONUS);
    option.confidence = clamp01((BASE_CONFIDENCE + support) * option.risk_level.confidence_multiplier());
    option.personality_fit = profile.map_or(BASE_FIT, |p| personality_fit(option.character, p));
}

/// Trait-threshold bonuses for how well the option's character suits the profile.
pub fn personality_fit(character: OptionCharacter, p: &PersonalityProfile) -> f64 {
    let mut fit = BASE_FIT;
    let mut bonus = |cond: bool, delta: f64| {
        if cond {
            fit += delta;
        }
    };
    match character {
        OptionCharacter::Conservative => {
            bonus(p.conscientiousness > 0.6, 0.2);
            bonus(p.neuroticism > 0.6, 0.1);
            bonus(p.risk_tolerance < 0.4, 0.1);
            bonus(p.openness > 0.7, -0.1);
        }
        OptionCharacter::Ambitious => {
            bonus(p.risk_tolerance > 0.6, 0.2);
            bonus(p.openness > 0.6, 0.1);
            bonus(p.extraversion > 0.6, 0.1);
            bonus(p.neuroticism > 0.6, -0.1);
        }
        OptionCharacter::Analytical => {
            bonus(p.conscientiousness > 0.6, 0.2);
            bonus(p.openness > 0.5, 0.1);
            bonus(p.neuroticism < 0.4, 0.05);
        }
        OptionCharacter::Creative => {
            bonus(p.openness > 0.6, 0.25);
            bonus(p.risk_tolerance > 0.5, 0.1);
            bonus(p.conscientiousness > 0.7, -0.1);
        }
        OptionCharacter::Direct => {
            bonus(p.extraversion > 0.6, 0.15);
            bonus(p.conscientiousness > 0.5, 0.1);
            bonus(p.agreeableness > 0.7, -0.1);
        }
        OptionCharacter::Consultative => {
            bonus(p.agreeableness > 0.6, 0.2);
            bonus(p.extraversion > 0.5, 0.1);
        }
        OptionCharacter::Balanced => {
            let extreme = [
                p.openness,
                p.conscientiousness,
                p.extraversion,
                p.agreeableness,
                p.neuroticism,
            ]
            .iter()
            .any(|v| *v > 0.7 || *v < 0.3);
            bonus(!extreme, 0.1);
        }
        OptionCharacter::Exploratory => {
            bonus(p.openness > 0.6, 0.2);
            bonus(p.risk_tolerance > 0.5, 0.1);
            bonus(p.neuroticism < 0.4, 0.05);
        }
    }
    clamp01(fit)
}

// ── Evaluation ──

/// 0.3·effectiveness + 0.2·efficiency + 0.2·(1 − risk) + 0.2·fit + 0.1·resource efficiency
pub fn evaluation_score(option: &DecisionOption, risk_score: f64) -> f64 {
    0.3 * option.effectiveness
        + 0.2 * option.efficiency
        + 0.2 * (1.0 - risk_score)
        + 0.2 * option.personality_fit
        + 0.1 * (1.0 - option.resources.load())
}

/// Score every option and rank them best first. Options missing from the
/// report fall back to their bucket score.
pub fn evaluate(mut options: Vec<DecisionOption>, report: Option<&DecisionRiskReport>) -> Vec<DecisionOption> {
    for option in options.iter_mut() {
        let risk = report
            .and_then(|r| r.score_for(&option.id))
            .unwrap_or_else(|| option.risk_level.score());
        option.risk_score = Some(risk);
        option.evaluation_score = Some(evaluation_score(option, risk));
    }
    options.sort_by(|a, b| {
        b.evaluation_score
            .partial_cmp(&a.evaluation_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::test_option;
    use crate::types::EmotionalTone;

    fn thought(id: &str, source: ThoughtSource, reasoning: ReasoningType) -> Thought {
        Thought {
            id: id.into(),
            content: "x".into(),
            reasoning_type: reasoning,
            source,
            confidence: 0.8,
            emotional_tone: EmotionalTone::Neutral,
            personality_factors: vec![],
        }
    }

    #[test]
    fn test_two_archetypes_per_kind() {
        for (kind, ids) in [
            (SituationType::Task, ["standard", "optimized"]),
            (SituationType::Problem, ["analytical", "creative"]),
            (SituationType::Decision, ["careful_deliberation", "decisive_action"]),
            (SituationType::Communication, ["direct_message", "collaborative_dialogue"]),
            (SituationType::General, ["balanced", "exploratory"]),
        ] {
            let options = generate(&Situation::new(kind, "something"));
            let got: Vec<&str> = options.iter().map(|o| o.id.as_str()).collect();
            assert_eq!(got, ids);
            for o in &options {
                assert!(o.validate().is_ok());
                assert!(!o.actions.is_empty());
            }
        }
    }

    #[test]
    fn test_goals_become_actions() {
        let mut s = Situation::new(SituationType::Task, "ship");
        s.goals.push("release 1.2".into());
        let options = generate(&s);
        assert!(options[0].actions.iter().any(|a| a.contains("release 1.2")));
    }

    #[test]
    fn test_annotate_support_and_multiplier() {
        let s = Situation::new(SituationType::Task, "ship");
        let mut option = generate(&s).remove(0); // conservative, low
        let thoughts = vec![
            thought("t1", ThoughtSource::Risk, ReasoningType::Analytical),
            thought("t2", ThoughtSource::Constraint, ReasoningType::Analytical),
            thought("t3", ThoughtSource::Opportunity, ReasoningType::Analytical),
        ];
        annotate(&mut option, &thoughts, None, &s, &DecisionContext::default());
        assert_eq!(option.supporting_thoughts, vec!["t1".to_string(), "t2".to_string()]);
        // (0.5 + 0.1) × 1.05
        assert!((option.confidence - 0.63).abs() < 1e-9);
        assert_eq!(option.personality_fit, 0.5);
    }

    #[test]
    fn test_support_bonus_capped() {
        let s = Situation::new(SituationType::Task, "ship");
        let mut option = generate(&s).remove(0);
        let thoughts: Vec<Thought> = (0..10)
            .map(|i| thought(&format!("t{}", i), ThoughtSource::Risk, ReasoningType::Cautious))
            .collect();
        annotate(&mut option, &thoughts, None, &s, &DecisionContext::default());
        assert!((option.confidence - 0.75 * 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_urgency_bumps_risk_bucket() {
        let mut s = Situation::new(SituationType::Task, "ship");
        s.urgency = 0.9;
        let mut option = generate(&s).remove(0);
        assert_eq!(option.risk_level, OptionRiskLevel::Low);
        annotate(&mut option, &[], None, &s, &DecisionContext::default());
        assert_eq!(option.risk_level, OptionRiskLevel::Medium);

        let s = Situation::new(SituationType::Task, "ship");
        let mut option = generate(&s).remove(0);
        let ctx = DecisionContext::default().with_time_pressure(0.8);
        annotate(&mut option, &[], None, &s, &ctx);
        assert_eq!(option.risk_level, OptionRiskLevel::Medium);
    }

    #[test]
    fn test_fit_follows_traits() {
        let mut careful = PersonalityProfile::default();
        careful.conscientiousness = 0.9;
        careful.risk_tolerance = 0.2;
        let mut bold = PersonalityProfile::default();
        bold.openness = 0.9;
        bold.risk_tolerance = 0.9;
        assert!(
            personality_fit(OptionCharacter::Conservative, &careful)
                > personality_fit(OptionCharacter::Conservative, &bold)
        );
        assert!(
            personality_fit(OptionCharacter::Creative, &bold)
                > personality_fit(OptionCharacter::Creative, &careful)
        );
        let balanced = personality_fit(OptionCharacter::Balanced, &PersonalityProfile::default());
        assert!((balanced - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_evaluate_ranks_descending() {
        let mut good = test_option("good", 0.7, 0.9, OptionRiskLevel::VeryLow);
        good.effectiveness = 0.9;
        let poor = test_option("poor", 0.7, 0.2, OptionRiskLevel::VeryHigh);
        let ranked = evaluate(vec![poor, good], None);
        assert_eq!(ranked[0].id, "good");
        assert_eq!(ranked[0].risk_score, Some(0.1));
        assert!(ranked[0].evaluation_score > ranked[1].evaluation_score);
    }

    #[test]
    fn test_evaluation_weights() {
        let o = test_option("a", 0.5, 0.5, OptionRiskLevel::Medium);
        // 0.15 + 0.1 + 0.1 + 0.1 + 0.05
        assert!((evaluation_score(&o, 0.5) - 0.5).abs() < 1e-12);
    }
}
