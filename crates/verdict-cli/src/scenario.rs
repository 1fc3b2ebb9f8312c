//! Scenario files: one YAML document describing who decides, what they face,
//! and the risks already on the register.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use verdict_core::emotion::EmotionSnapshot;
use verdict_core::memory::{MemoryRecord, MemoryStream};
use verdict_core::profile::{DecisionContext, PersonalityProfile};
use verdict_core::risk::NewRisk;
use verdict_core::{EngineConfig, ReasoningEngine, Situation};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Explicit trait values. Takes precedence over `seed`.
    #[serde(default)]
    pub profile: Option<PersonalityProfile>,
    /// Derive a profile deterministically from this string
    #[serde(default)]
    pub seed: Option<String>,
    pub situation: Situation,
    #[serde(default)]
    pub context: DecisionContext,
    #[serde(default)]
    pub emotion: EmotionSnapshot,
    #[serde(default)]
    pub memories: Vec<MemoryRecord>,
    #[serde(default)]
    pub risks: Vec<NewRisk>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_yaml::from_str(content).context("Failed to parse scenario")?;
        scenario.situation.validate()?;
        scenario.context.validate()?;
        Ok(scenario)
    }

    pub fn profile(&self) -> PersonalityProfile {
        match (&self.profile, &self.seed) {
            (Some(profile), _) => profile.clone(),
            (None, Some(seed)) => PersonalityProfile::from_seed(seed.as_bytes()),
            (None, None) => PersonalityProfile::default(),
        }
    }

    /// Build a reasoning engine wired to this scenario's profile, memories and mood.
    /// Risks are registered separately so they can travel through the agent.
    pub fn engine(&self, config: &EngineConfig) -> Result<ReasoningEngine> {
        let mut engine = ReasoningEngine::with_defaults(config);
        engine
            .influence_mut()
            .set_personality_profile(self.profile())
            .context("Invalid personality profile")?;
        engine.set_memory(Box::new(MemoryStream::from_records(self.memories.clone())));
        engine.set_emotion_source(Box::new(self.emotion));
        Ok(engine)
    }
}
