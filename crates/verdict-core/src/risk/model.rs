//! Risk records — risks, factors, assessments, mitigation plans and the
//! read-only reports built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ensure_unit, ValidationError};
use crate::profile::DecisionContext;
use crate::types::{clamp01, new_id, RiskLevel, Trend};

/// severity = likelihood × impact × (1 − mitigation), clamped to [0, 1].
pub fn severity(likelihood: f64, impact: f64, mitigation: f64) -> f64 {
    clamp01(likelihood * impact * (1.0 - mitigation))
}

// ── Risk ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    #[default]
    Operational,
    Financial,
    Technical,
    Security,
    Compliance,
    Strategic,
    Reputational,
    Social,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[default]
    Identified,
    Monitoring,
    Mitigating,
    Mitigated,
    Accepted,
    Closed,
}

impl RiskStatus {
    pub fn is_active(&self) -> bool {
        !matches!(self, RiskStatus::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    #[serde(default = "default_factor_weight")]
    pub weight: f64,
    pub value: f64,
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: f64,
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f64,
    #[serde(default)]
    pub trend: Trend,
}

fn default_factor_weight() -> f64 {
    1.0
}
fn default_warning_threshold() -> f64 {
    0.6
}
fn default_critical_threshold() -> f64 {
    0.8
}

impl RiskFactor {
    pub fn new(name: &str, value: f64, trend: Trend) -> Self {
        Self {
            name: name.to_string(),
            weight: default_factor_weight(),
            value,
            warning_threshold: default_warning_threshold(),
            critical_threshold: default_critical_threshold(),
            trend,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::missing("factor.name"));
        }
        ensure_unit("factor.weight", self.weight)?;
        ensure_unit("factor.value", self.value)?;
        ensure_unit("factor.warning_threshold", self.warning_threshold)?;
        ensure_unit("factor.critical_threshold", self.critical_threshold)?;
        if self.warning_threshold > self.critical_threshold {
            return Err(ValidationError::invalid(
                "factor.warning_threshold",
                "must not exceed critical_threshold",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: RiskCategory,
    pub risk_type: String,
    pub likelihood: f64,
    pub impact: f64,
    pub severity: f64,
    pub level: RiskLevel,
    pub mitigation_effectiveness: f64,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
    pub status: RiskStatus,
    #[serde(default)]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Risk {
    /// Refresh severity and level from likelihood, impact and mitigation.
    pub fn recompute(&mut self) {
        self.severity = severity(self.likelihood, self.impact, self.mitigation_effectiveness);
        self.level = RiskLevel::from_severity(self.severity);
    }

    /// Impact that survives mitigation when the risk occurs.
    pub fn residual_impact(&self) -> f64 {
        clamp01(self.impact * (1.0 - self.mitigation_effectiveness))
    }
}

/// Input for registering a risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRisk {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: RiskCategory,
    #[serde(default = "default_risk_type")]
    pub risk_type: String,
    pub likelihood: f64,
    pub impact: f64,
    #[serde(default)]
    pub mitigation_effectiveness: f64,
    #[serde(default)]
    pub factors: Vec<RiskFactor>,
    #[serde(default)]
    pub owner: Option<String>,
}

fn default_risk_type() -> String {
    "general".into()
}

impl NewRisk {
    pub fn new(name: &str, category: RiskCategory, likelihood: f64, impact: f64) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            category,
            risk_type: default_risk_type(),
            likelihood,
            impact,
            mitigation_effectiveness: 0.0,
            factors: Vec::new(),
            owner: None,
        }
    }

    pub fn with_type(mut self, risk_type: &str) -> Self {
        self.risk_type = risk_type.to_string();
        self
    }

    pub fn with_mitigation(mut self, effectiveness: f64) -> Self {
        self.mitigation_effectiveness = effectiveness;
        self
    }

    pub fn with_factor(mut self, factor: RiskFactor) -> Self {
        self.factors.push(factor);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::missing("risk.name"));
        }
        if self.risk_type.trim().is_empty() {
            return Err(ValidationError::missing("risk.risk_type"));
        }
        ensure_unit("risk.likelihood", self.likelihood)?;
        ensure_unit("risk.impact", self.impact)?;
        ensure_unit("risk.mitigation_effectiveness", self.mitigation_effectiveness)?;
        for f in &self.factors {
            f.validate()?;
        }
        Ok(())
    }
}

/// Partial update; `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub risk_type: Option<String>,
    pub likelihood: Option<f64>,
    pub impact: Option<f64>,
    pub mitigation_effectiveness: Option<f64>,
    pub factors: Option<Vec<RiskFactor>>,
    pub status: Option<RiskStatus>,
    pub owner: Option<String>,
}

impl RiskUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ValidationError::missing("risk.name"));
            }
        }
        if let Some(t) = &self.risk_type {
            if t.trim().is_empty() {
                return Err(ValidationError::missing("risk.risk_type"));
            }
        }
        if let Some(v) = self.likelihood {
            ensure_unit("risk.likelihood", v)?;
        }
        if let Some(v) = self.impact {
            ensure_unit("risk.impact", v)?;
        }
        if let Some(v) = self.mitigation_effectiveness {
            ensure_unit("risk.mitigation_effectiveness", v)?;
        }
        if let Some(factors) = &self.factors {
            for f in factors {
                f.validate()?;
            }
        }
        Ok(())
    }
}

/// Which risks an operation covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSelection {
    /// Every risk that is not closed
    All,
    Ids(Vec<String>),
}

// ── Assessment ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    pub none: usize,
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl LevelCounts {
    pub fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::None => self.none += 1,
            RiskLevel::Low => self.low += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Critical => self.critical += 1,
        }
    }

    pub fn get(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::None => self.none,
            RiskLevel::Low => self.low,
            RiskLevel::Medium => self.medium,
            RiskLevel::High => self.high,
            RiskLevel::Critical => self.critical,
        }
    }

    pub fn total(&self) -> usize {
        self.none + self.low + self.medium + self.high + self.critical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyRelation {
    SharedCategory,
    SharedType,
    SharedCategoryAndType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDependency {
    pub from: String,
    pub to: String,
    pub relation: DependencyRelation,
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub context: DecisionContext,
    pub assessed_risk_ids: Vec<String>,
    /// Risks dropped because they could not be scored
    #[serde(default)]
    pub skipped_risk_ids: Vec<String>,
    pub counts: LevelCounts,
    pub risk_score: f64,
    pub overall_level: RiskLevel,
    pub trend: Trend,
    pub dependencies: Vec<RiskDependency>,
    pub recommendations: Vec<String>,
    pub mitigation_plan: Vec<RiskMitigationPlan>,
}

// ── Mitigation ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MitigationStrategy {
    Avoid,
    #[default]
    Reduce,
    Transfer,
    Accept,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Proposed,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMitigationPlan {
    pub id: String,
    pub target_risk_ids: Vec<String>,
    pub strategy: MitigationStrategy,
    pub actions: Vec<String>,
    pub expected_effectiveness: f64,
    pub current_effectiveness: f64,
    pub status: PlanStatus,
    #[serde(default)]
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RiskMitigationPlan {
    /// Unregistered plan proposal for a single risk.
    pub fn skeleton(risk: &Risk) -> Self {
        let (strategy, expected) = match risk.level {
            RiskLevel::Critical => (MitigationStrategy::Avoid, 0.8),
            _ => (MitigationStrategy::Reduce, 0.6),
        };
        let mut actions = vec![format!("Assign an owner to '{}'", risk.name)];
        actions.push(match strategy {
            MitigationStrategy::Avoid => {
                format!("Remove or redesign the activity that exposes '{}'", risk.name)
            }
            _ => format!("Reduce the likelihood or impact of '{}'", risk.name),
        });
        for f in risk
            .factors
            .iter()
            .filter(|f| f.value >= f.warning_threshold)
        {
            actions.push(format!("Bring factor '{}' below {:.2}", f.name, f.warning_threshold));
        }
        let now = Utc::now();
        Self {
            id: new_id(),
            target_risk_ids: vec![risk.id.clone()],
            strategy,
            actions,
            expected_effectiveness: expected,
            current_effectiveness: risk.mitigation_effectiveness,
            status: PlanStatus::Proposed,
            owner: risk.owner.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for registering a mitigation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMitigationPlan {
    pub target_risk_ids: Vec<String>,
    #[serde(default)]
    pub strategy: MitigationStrategy,
    #[serde(default)]
    pub actions: Vec<String>,
    pub expected_effectiveness: f64,
    #[serde(default)]
    pub current_effectiveness: f64,
    #[serde(default)]
    pub owner: Option<String>,
}

// ── Decision-option risk ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRiskBreakdown {
    pub option_id: String,
    pub option_name: String,
    pub base_risk: f64,
    pub complexity_multiplier: f64,
    pub novelty_multiplier: f64,
    pub resource_multiplier: f64,
    pub time_multiplier: f64,
    pub risk_score: f64,
    pub level: RiskLevel,
    /// Set when the option could not be scored and a zero-risk default was used
    #[serde(default)]
    pub degraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComparison {
    pub lowest_risk_option: String,
    pub highest_risk_option: String,
    /// option id → 1 − risk score
    pub relative_safety: BTreeMap<String, f64>,
    pub spread: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRiskReport {
    pub options: Vec<OptionRiskBreakdown>,
    pub comparison: RiskComparison,
    pub recommended_option: String,
}

impl DecisionRiskReport {
    pub fn score_for(&self, option_id: &str) -> Option<f64> {
        self.options
            .iter()
            .find(|o| o.option_id == option_id)
            .map(|o| o.risk_score)
    }
}

/// Risk view of the option a decision settled on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DecisionRiskSummary {
    pub selected_option: String,
    pub risk_score: f64,
    pub level: Option<RiskLevel>,
    pub recommendations: Vec<String>,
    pub lower_risk_alternatives: Vec<String>,
    /// Active registry risks at high or critical level when the decision was made
    pub open_high_risks: usize,
    #[serde(default)]
    pub degraded: bool,
}

// ── Simulation ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_ids: Vec<String>,
    pub trials: usize,
    pub expected_value: f64,
    pub std_dev: f64,
    pub worst_case: f64,
    pub best_case: f64,
    pub confidence_interval_95: (f64, f64),
    /// Share of trials with any exposure at all
    pub probability_of_loss: f64,
    /// risk id → fraction of trials it occurred in
    pub occurrence_rates: BTreeMap<String, f64>,
    pub workers: usize,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl SimulationResult {
    /// All-zero result for an empty or failed run.
    pub fn zeroed(risk_ids: Vec<String>, trials: usize, error: Option<String>) -> Self {
        Self {
            id: new_id(),
            timestamp: Utc::now(),
            risk_ids,
            trials,
            expected_value: 0.0,
            std_dev: 0.0,
            worst_case: 0.0,
            best_case: 0.0,
            confidence_interval_95: (0.0, 0.0),
            probability_of_loss: 0.0,
            occurrence_rates: BTreeMap::new(),
            workers: 0,
            degraded: error.is_some(),
            error,
        }
    }
}

// ── Dashboards ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub id: String,
    pub name: String,
    pub severity: f64,
    pub level: RiskLevel,
    pub mitigation_effectiveness: f64,
    pub status: RiskStatus,
}

impl From<&Risk> for RiskSummary {
    fn from(r: &Risk) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            severity: r.severity,
            level: r.level,
            mitigation_effectiveness: r.mitigation_effectiveness,
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorAlert {
    pub risk_id: String,
    pub factor: String,
    pub value: f64,
    pub threshold: f64,
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_score: f64,
    pub overall_level: RiskLevel,
    pub trend: Trend,
}

impl From<&RiskAssessment> for AssessmentSummary {
    fn from(a: &RiskAssessment) -> Self {
        Self {
            id: a.id.clone(),
            timestamp: a.timestamp,
            risk_score: a.risk_score,
            overall_level: a.overall_level,
            trend: a.trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDashboard {
    pub generated_at: DateTime<Utc>,
    pub total_risks: usize,
    pub active_risks: usize,
    pub by_level: LevelCounts,
    pub by_category: BTreeMap<RiskCategory, usize>,
    pub by_status: BTreeMap<RiskStatus, usize>,
    pub top_risks: Vec<RiskSummary>,
    pub factor_alerts: Vec<FactorAlert>,
    pub active_plans: usize,
    pub average_mitigation: f64,
    pub latest_assessment: Option<AssessmentSummary>,
    /// Risks whose stored numbers are inconsistent
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskStatistics {
    pub assessments: usize,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub level_distribution: BTreeMap<RiskLevel, usize>,
    pub score_trend: Trend,
    pub total_plans: usize,
    pub completed_plans: usize,
}
