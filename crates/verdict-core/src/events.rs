//! DecisionEvent enum — broadcast from the Agent to subscribers via tokio::broadcast.

use serde::{Deserialize, Serialize};

use crate::reasoning::Decision;
use crate::risk::{AssessmentSummary, RiskSummary, SimulationResult};
use crate::types::ReasoningType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Deciding,
    Assessing,
    Simulating,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusData {
    pub state: AgentState,
    pub decisions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionData {
    pub id: String,
    pub selected_option_id: String,
    pub reasoning_type: ReasoningType,
    pub confidence: f64,
    pub risk_score: f64,
}

impl From<&Decision> for DecisionData {
    fn from(d: &Decision) -> Self {
        Self {
            id: d.id.clone(),
            selected_option_id: d.selected_option_id.clone(),
            reasoning_type: d.analysis.reasoning_type,
            confidence: d.confidence,
            risk_score: d.risk_assessment.risk_score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationData {
    pub id: String,
    pub trials: usize,
    pub expected_value: f64,
    pub confidence_interval_95: (f64, f64),
}

impl From<&SimulationResult> for SimulationData {
    fn from(r: &SimulationResult) -> Self {
        Self {
            id: r.id.clone(),
            trials: r.trials,
            expected_value: r.expected_value,
            confidence_interval_95: r.confidence_interval_95,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedData {
    /// Pipeline stage that fell back to a default result
    pub stage: String,
    pub message: String,
}

/// Events broadcast from an Agent task to all subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum DecisionEvent {
    #[serde(rename = "decision")]
    Decision(DecisionData),

    #[serde(rename = "risk_registered")]
    RiskRegistered(RiskSummary),

    #[serde(rename = "assessment")]
    Assessment(AssessmentSummary),

    #[serde(rename = "simulation")]
    Simulation(SimulationData),

    /// A result came back in degraded form
    #[serde(rename = "degraded")]
    Degraded(DegradedData),

    /// Agent state changed
    #[serde(rename = "status")]
    Status(StatusData),
}

impl DecisionEvent {
    /// `{"event": "...", "data": {...}}`
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
