//! Configuration — YAML config + env var overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Env vars that override the file (name, field)
const ENV_SIMULATION_TRIALS: &str = "VERDICT_SIMULATION_TRIALS";
const ENV_SIMULATION_SEED: &str = "VERDICT_SIMULATION_SEED";
const ENV_SIMULATION_TIMEOUT_MS: &str = "VERDICT_SIMULATION_TIMEOUT_MS";
const ENV_CACHE_TTL_SECS: &str = "VERDICT_INFLUENCE_CACHE_TTL_SECS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Decisions kept before the history is trimmed
    #[serde(default = "default_decision_history_cap")]
    pub decision_history_cap: usize,

    /// Length the decision history is trimmed back to on overflow
    #[serde(default = "default_decision_history_trim_to")]
    pub decision_history_trim_to: usize,

    /// Risk assessments kept in memory
    #[serde(default = "default_assessment_history_cap")]
    pub assessment_history_cap: usize,

    /// Registry size above which closed risks are evicted
    #[serde(default = "default_risk_registry_soft_cap")]
    pub risk_registry_soft_cap: usize,

    /// Distinct context shapes held in the influence cache
    #[serde(default = "default_influence_cache_capacity")]
    pub influence_cache_capacity: usize,

    /// Seconds before a cached influence set is recomputed
    #[serde(default = "default_influence_cache_ttl_secs")]
    pub influence_cache_ttl_secs: u64,

    /// Temporal decay applied to cached influences per reuse
    #[serde(default = "default_influence_decay")]
    pub influence_decay: f64,

    /// Monte Carlo trials when the caller does not ask for a count
    #[serde(default = "default_simulation_trials")]
    pub default_simulation_trials: usize,

    /// Hard cap on trials per simulation request
    #[serde(default = "default_max_simulation_trials")]
    pub max_simulation_trials: usize,

    /// Wall-clock budget for the parallel simulation path
    #[serde(default = "default_simulation_timeout_ms")]
    pub simulation_timeout_ms: u64,

    /// Worker tasks for the parallel simulation path (0 = available cores)
    #[serde(default)]
    pub simulation_workers: usize,

    /// Fixed RNG seed for reproducible simulations
    #[serde(default)]
    pub simulation_seed: Option<u64>,

    /// Dependency edges emitted per assessment
    #[serde(default = "default_max_dependency_edges")]
    pub max_dependency_edges: usize,
}

fn default_decision_history_cap() -> usize {
    1000
}
fn default_decision_history_trim_to() -> usize {
    500
}
fn default_assessment_history_cap() -> usize {
    1000
}
fn default_risk_registry_soft_cap() -> usize {
    10_000
}
fn default_influence_cache_capacity() -> usize {
    256
}
fn default_influence_cache_ttl_secs() -> u64 {
    300
}
fn default_influence_decay() -> f64 {
    0.99
}
fn default_simulation_trials() -> usize {
    1000
}
fn default_max_simulation_trials() -> usize {
    1_000_000
}
fn default_simulation_timeout_ms() -> u64 {
    30_000
}
fn default_max_dependency_edges() -> usize {
    5000
}

impl EngineConfig {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: EngineConfig =
            serde_yaml::from_str(&content).context("Failed to parse engine config")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load `verdict.yaml` from a directory, falling back to defaults when absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join("verdict.yaml");
        if path.is_file() {
            Self::load(&path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            Ok(config)
        }
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_SIMULATION_TRIALS) {
            self.default_simulation_trials = v
                .parse()
                .with_context(|| format!("{} must be an integer", ENV_SIMULATION_TRIALS))?;
        }
        if let Ok(v) = std::env::var(ENV_SIMULATION_SEED) {
            self.simulation_seed = Some(
                v.parse()
                    .with_context(|| format!("{} must be an integer", ENV_SIMULATION_SEED))?,
            );
        }
        if let Ok(v) = std::env::var(ENV_SIMULATION_TIMEOUT_MS) {
            self.simulation_timeout_ms = v
                .parse()
                .with_context(|| format!("{} must be an integer", ENV_SIMULATION_TIMEOUT_MS))?;
        }
        if let Ok(v) = std::env::var(ENV_CACHE_TTL_SECS) {
            self.influence_cache_ttl_secs = v
                .parse()
                .with_context(|| format!("{} must be an integer", ENV_CACHE_TTL_SECS))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.decision_history_cap == 0 || self.assessment_history_cap == 0 {
            anyhow::bail!("History caps must be greater than zero");
        }
        if self.decision_history_trim_to >= self.decision_history_cap {
            anyhow::bail!(
                "decision_history_trim_to ({}) must be below decision_history_cap ({})",
                self.decision_history_trim_to,
                self.decision_history_cap
            );
        }
        if self.influence_cache_capacity == 0 {
            anyhow::bail!("influence_cache_capacity must be greater than zero");
        }
        if !(self.influence_decay > 0.0 && self.influence_decay <= 1.0) {
            anyhow::bail!("influence_decay must be in (0, 1], got {}", self.influence_decay);
        }
        if self.default_simulation_trials == 0 {
            anyhow::bail!("default_simulation_trials must be greater than zero");
        }
        if self.default_simulation_trials > self.max_simulation_trials {
            anyhow::bail!(
                "default_simulation_trials ({}) exceeds max_simulation_trials ({})",
                self.default_simulation_trials,
                self.max_simulation_trials
            );
        }
        Ok(())
    }

    pub fn influence_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.influence_cache_ttl_secs)
    }

    pub fn simulation_timeout(&self) -> Duration {
        Duration::from_millis(self.simulation_timeout_ms)
    }

    /// Worker count for parallel simulation, resolving 0 to the machine's parallelism.
    pub fn resolved_simulation_workers(&self) -> usize {
        if self.simulation_workers > 0 {
            self.simulation_workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_history_cap: default_decision_history_cap(),
            decision_history_trim_to: default_decision_history_trim_to(),
            assessment_history_cap: default_assessment_history_cap(),
            risk_registry_soft_cap: default_risk_registry_soft_cap(),
            influence_cache_capacity: default_influence_cache_capacity(),
            influence_cache_ttl_secs: default_influence_cache_ttl_secs(),
            influence_decay: default_influence_decay(),
            default_simulation_trials: default_simulation_trials(),
            max_simulation_trials: default_max_simulation_trials(),
            simulation_timeout_ms: default_simulation_timeout_ms(),
            simulation_workers: 0,
            simulation_seed: None,
            max_dependency_edges: default_max_dependency_edges(),
        }
    }
}
