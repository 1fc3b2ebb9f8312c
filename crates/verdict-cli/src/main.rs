mod scenario;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};
use verdict_core::risk::RiskSelection;
use verdict_core::{Agent, AgentHandle, EngineConfig, ReasoningEngine};

use scenario::Scenario;

#[derive(Parser)]
#[command(name = "verdict", version, about = "Personality-weighted decision and risk engine")]
struct Cli {
    /// Engine config file. Defaults to ./verdict.yaml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full decision cycle for a scenario.
    Decide {
        /// Scenario YAML file.
        scenario: PathBuf,
    },

    /// Register the scenario's risks and assess them against its context.
    Assess {
        scenario: PathBuf,
    },

    /// Monte Carlo simulation over the scenario's risks.
    Simulate {
        scenario: PathBuf,

        /// Number of trials (defaults to the configured count).
        #[arg(long)]
        trials: Option<usize>,

        /// Fix the RNG seed for a reproducible run.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Check a stored decision record (JSON) for structural problems.
    Validate {
        /// Decision JSON file.
        decision: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    let output = match cli.command {
        Commands::Decide { scenario } => decide(&config, &Scenario::load(&scenario)?).await?,
        Commands::Assess { scenario } => assess(&config, &Scenario::load(&scenario)?).await?,
        Commands::Simulate {
            scenario,
            trials,
            seed,
        } => {
            if seed.is_some() {
                config.simulation_seed = seed;
            }
            simulate(&config, &Scenario::load(&scenario)?, trials).await?
        }
        Commands::Validate { decision } => validate(&config, &decision)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load(path),
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
            EngineConfig::load_from_dir(&cwd)
        }
    }
}

/// Spawn an agent for the scenario and register its risks through the mailbox.
async fn start(config: &EngineConfig, scenario: &Scenario) -> Result<AgentHandle> {
    let handle = Agent::new(scenario.engine(config)?).spawn();

    let mut events = handle.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(event = %event.to_json(), "agent event");
        }
    });

    for risk in &scenario.risks {
        let id = handle
            .add_risk(risk.clone())
            .await
            .with_context(|| format!("Failed to register risk '{}'", risk.name))?;
        debug!("Registered risk {} ({})", risk.name, id);
    }
    Ok(handle)
}

async fn decide(config: &EngineConfig, scenario: &Scenario) -> Result<serde_json::Value> {
    let handle = start(config, scenario).await?;
    let decision = handle
        .decide(scenario.situation.clone(), scenario.context.clone())
        .await
        .context("Decision cycle failed")?;
    let engine = handle.stop().await?;

    let report = engine.validate_decision(&decision);
    info!(
        "Selected '{}' with confidence {:.2}",
        decision.selected_option_id, decision.confidence
    );
    Ok(json!({
        "decision": decision,
        "validation": report,
    }))
}

async fn assess(config: &EngineConfig, scenario: &Scenario) -> Result<serde_json::Value> {
    let handle = start(config, scenario).await?;
    let assessment = handle
        .assess_risks(scenario.context.clone(), RiskSelection::All)
        .await
        .context("Risk assessment failed")?;
    let dashboard = handle.dashboard().await?;
    handle.stop().await?;

    Ok(json!({
        "assessment": assessment,
        "dashboard": dashboard,
    }))
}

async fn simulate(
    config: &EngineConfig,
    scenario: &Scenario,
    trials: Option<usize>,
) -> Result<serde_json::Value> {
    let handle = start(config, scenario).await?;
    let result = handle
        .simulate(RiskSelection::All, trials)
        .await
        .context("Simulation failed")?;
    handle.stop().await?;
    Ok(serde_json::to_value(result)?)
}

fn validate(config: &EngineConfig, path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read decision: {}", path.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).context("Decision file is not JSON")?;
    let engine = ReasoningEngine::with_defaults(config);
    Ok(serde_json::to_value(engine.validate_decision_json(&value))?)
}
