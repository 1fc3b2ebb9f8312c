//! verdict-core — decision and risk-assessment engine, no I/O.
//!
//! This crate turns a situation plus a decision context into a chosen option,
//! weighted by a simulated personality and a quantified risk model. Memory
//! and mood come from collaborators behind small traits; frontends subscribe
//! to decision events via tokio::broadcast.

pub mod agent;
pub mod config;
pub mod emotion;
pub mod error;
pub mod events;
pub mod influence;
pub mod memory;
pub mod profile;
pub mod reasoning;
pub mod risk;
pub mod types;

pub use agent::{Agent, AgentHandle};
pub use config::EngineConfig;
pub use error::{ConsistencyError, EngineError, OperationalError, ValidationError};
pub use influence::PersonalityInfluenceEngine;
pub use reasoning::{Decision, ReasoningEngine, Situation};
pub use risk::RiskAssessmentEngine;
