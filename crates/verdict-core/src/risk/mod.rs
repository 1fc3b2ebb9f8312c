//! Risk assessment — a registry of quantified risks with population-level
//! assessments, decision-option scoring, mitigation plans and Monte Carlo
//! exposure simulation.

pub mod model;
pub mod simulation;

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::error::{ensure_unit, ConsistencyError, OperationalError, Result, ValidationError};
use crate::profile::DecisionContext;
use crate::reasoning::DecisionOption;
use crate::types::{new_id, RiskLevel, Trend};

pub use model::*;
use simulation::{rng_for, run_parallel, run_trials, summarize, RiskParams};

/// Multipliers in the decision-option risk product.
const COMPLEXITY_WEIGHT: f64 = 0.3;
const NOVELTY_WEIGHT: f64 = 0.25;
const RESOURCE_INTENSIVE_MULTIPLIER: f64 = 0.2;
const TIME_SENSITIVE_MULTIPLIER: f64 = 0.15;

/// Trend direction needs this many times more factors than the other way.
const TREND_RATIO: f64 = 1.5;

/// Mitigation below this on a medium+ risk is flagged for review.
const WEAK_MITIGATION: f64 = 0.3;

const TOP_RISKS: usize = 5;

pub struct RiskAssessmentEngine {
    risks: HashMap<String, Risk>,
    /// Registration order, oldest first
    order: Vec<String>,
    by_type: HashMap<String, BTreeSet<String>>,
    by_level: HashMap<RiskLevel, BTreeSet<String>>,
    plans: HashMap<String, RiskMitigationPlan>,
    plan_order: Vec<String>,
    history: VecDeque<RiskAssessment>,
    config: EngineConfig,
}

impl RiskAssessmentEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            risks: HashMap::new(),
            order: Vec::new(),
            by_type: HashMap::new(),
            by_level: HashMap::new(),
            plans: HashMap::new(),
            plan_order: Vec::new(),
            history: VecDeque::new(),
            config: config.clone(),
        }
    }

    // ── Registry ──

    pub fn add_risk(&mut self, new: NewRisk) -> Result<String> {
        new.validate()?;
        if self.risks.len() >= self.config.risk_registry_soft_cap {
            self.evict_closed_risk();
        }

        let now = Utc::now();
        let mut risk = Risk {
            id: new_id(),
            name: new.name,
            description: new.description,
            category: new.category,
            risk_type: new.risk_type,
            likelihood: new.likelihood,
            impact: new.impact,
            severity: 0.0,
            level: RiskLevel::None,
            mitigation_effectiveness: new.mitigation_effectiveness,
            factors: new.factors,
            status: RiskStatus::Identified,
            owner: new.owner,
            created_at: now,
            updated_at: now,
        };
        risk.recompute();
        info!(
            "Risk {} '{}' registered: severity={:.3} level={}",
            risk.id, risk.name, risk.severity, risk.level
        );

        let id = risk.id.clone();
        self.index(&risk);
        self.order.push(id.clone());
        self.risks.insert(id.clone(), risk);
        Ok(id)
    }

    pub fn update_risk(&mut self, id: &str, update: RiskUpdate) -> Result<&Risk> {
        update.validate()?;
        let mut risk = self.take_for_update(id)?;

        if let Some(v) = update.name {
            risk.name = v;
        }
        if let Some(v) = update.description {
            risk.description = v;
        }
        if let Some(v) = update.risk_type {
            risk.risk_type = v;
        }
        if let Some(v) = update.likelihood {
            risk.likelihood = v;
        }
        if let Some(v) = update.impact {
            risk.impact = v;
        }
        if let Some(v) = update.mitigation_effectiveness {
            risk.mitigation_effectiveness = v;
        }
        if let Some(v) = update.factors {
            risk.factors = v;
        }
        if let Some(v) = update.status {
            risk.status = v;
        }
        if let Some(v) = update.owner {
            risk.owner = Some(v);
        }
        risk.recompute();
        risk.updated_at = Utc::now();
        info!("Risk {} updated: severity={:.3} level={}", risk.id, risk.severity, risk.level);
        Ok(self.put_back(risk))
    }

    /// Set or insert one factor's value and trend.
    pub fn update_risk_factor(
        &mut self,
        id: &str,
        factor_name: &str,
        value: f64,
        trend: Trend,
    ) -> Result<&Risk> {
        ensure_unit("factor.value", value)?;
        if factor_name.trim().is_empty() {
            return Err(ValidationError::missing("factor.name").into());
        }
        let risk = self
            .risks
            .get_mut(id)
            .ok_or_else(|| ConsistencyError::UnknownRisk { id: id.to_string() })?;
        match risk.factors.iter_mut().find(|f| f.name == factor_name) {
            Some(f) => {
                f.value = value;
                f.trend = trend;
            }
            None => risk.factors.push(RiskFactor::new(factor_name, value, trend)),
        }
        risk.updated_at = Utc::now();
        Ok(&*risk)
    }

    pub fn set_risk_status(&mut self, id: &str, status: RiskStatus) -> Result<&Risk> {
        let risk = self
            .risks
            .get_mut(id)
            .ok_or_else(|| ConsistencyError::UnknownRisk { id: id.to_string() })?;
        risk.status = status;
        risk.updated_at = Utc::now();
        info!("Risk {} status -> {:?}", id, status);
        Ok(&*risk)
    }

    /// Flag a risk closed. Closed risks stay in the registry.
    pub fn close_risk(&mut self, id: &str) -> Result<&Risk> {
        self.set_risk_status(id, RiskStatus::Closed)
    }

    pub fn get_risk(&self, id: &str) -> Option<&Risk> {
        self.risks.get(id)
    }

    /// All risks in registration order.
    pub fn risks(&self) -> impl Iterator<Item = &Risk> {
        self.order.iter().filter_map(|id| self.risks.get(id))
    }

    pub fn risks_by_type(&self, risk_type: &str) -> Vec<&Risk> {
        self.by_type
            .get(risk_type)
            .map(|ids| ids.iter().filter_map(|id| self.risks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn risks_by_level(&self, level: RiskLevel) -> Vec<&Risk> {
        self.by_level
            .get(&level)
            .map(|ids| ids.iter().filter_map(|id| self.risks.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.risks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.risks.is_empty()
    }

    fn index(&mut self, risk: &Risk) {
        self.by_type
            .entry(risk.risk_type.clone())
            .or_default()
            .insert(risk.id.clone());
        self.by_level
            .entry(risk.level)
            .or_default()
            .insert(risk.id.clone());
    }

    fn unindex(&mut self, risk: &Risk) {
        if let Some(ids) = self.by_type.get_mut(&risk.risk_type) {
            ids.remove(&risk.id);
            if ids.is_empty() {
                self.by_type.remove(&risk.risk_type);
            }
        }
        if let Some(ids) = self.by_level.get_mut(&risk.level) {
            ids.remove(&risk.id);
        }
    }

    /// Remove a risk from the map and indices so it can be edited as a unit.
    fn take_for_update(&mut self, id: &str) -> Result<Risk> {
        let risk = self
            .risks
            .remove(id)
            .ok_or_else(|| ConsistencyError::UnknownRisk { id: id.to_string() })?;
        self.unindex(&risk);
        Ok(risk)
    }

    fn put_back(&mut self, risk: Risk) -> &Risk {
        self.index(&risk);
        let id = risk.id.clone();
        self.risks.insert(id.clone(), risk);
        &self.risks[&id]
    }

    /// Evict the oldest closed risk that no mitigation plan still targets.
    fn evict_closed_risk(&mut self) {
        let oldest_closed = {
            let planned: HashSet<&str> = self
                .plans
                .values()
                .flat_map(|p| p.target_risk_ids.iter().map(String::as_str))
                .collect();
            self.order.iter().position(|id| {
                !planned.contains(id.as_str())
                    && matches!(self.risks.get(id), Some(r) if !r.status.is_active())
            })
        };
        match oldest_closed {
            Some(pos) => {
                let id = self.order.remove(pos);
                if let Some(risk) = self.risks.remove(&id) {
                    self.unindex(&risk);
                    warn!("Risk registry at soft cap; evicted closed risk {}", id);
                }
            }
            None => warn!(
                "Risk registry above soft cap ({}) with no unplanned closed risks to evict",
                self.config.risk_registry_soft_cap
            ),
        }
    }

    /// Resolve a selection into distinct existing risk ids, in registration
    /// order for `All` and first-seen order for `Ids`.
    fn resolve_selection(&self, selection: &RiskSelection) -> Result<Vec<String>> {
        match selection {
            RiskSelection::All => Ok(self
                .risks()
                .filter(|r| r.status.is_active())
                .map(|r| r.id.clone())
                .collect()),
            RiskSelection::Ids(ids) => {
                if ids.is_empty() {
                    return Err(ValidationError::empty("risk_ids").into());
                }
                let mut seen = HashSet::with_capacity(ids.len());
                let mut resolved = Vec::with_capacity(ids.len());
                for id in ids {
                    if id.trim().is_empty() {
                        return Err(ValidationError::missing("risk_id").into());
                    }
                    if !self.risks.contains_key(id) {
                        return Err(ConsistencyError::UnknownRisk { id: id.clone() }.into());
                    }
                    if seen.insert(id.as_str()) {
                        resolved.push(id.clone());
                    }
                }
                if resolved.len() < ids.len() {
                    debug!(
                        "Dropped {} duplicate risk id(s) from selection",
                        ids.len() - resolved.len()
                    );
                }
                Ok(resolved)
            }
        }
    }

    // ── Population assessment ──

    pub fn assess_risks(
        &mut self,
        context: &DecisionContext,
        selection: &RiskSelection,
    ) -> Result<RiskAssessment> {
        context.validate()?;
        let ids = self.resolve_selection(selection)?;

        let mut counts = LevelCounts::default();
        let mut severities = Vec::with_capacity(ids.len());
        let mut assessed: Vec<&Risk> = Vec::with_capacity(ids.len());
        let mut skipped = Vec::new();
        for id in &ids {
            let Some(risk) = self.risks.get(id) else {
                continue;
            };
            match checked_severity(risk) {
                Ok(sev) => {
                    counts.add(RiskLevel::from_severity(sev));
                    severities.push(sev);
                    assessed.push(risk);
                }
                Err(e) => {
                    error!("Skipping risk {} in assessment: {}", id, e);
                    skipped.push(id.clone());
                }
            }
        }

        let risk_score = if severities.is_empty() {
            0.0
        } else {
            severities.iter().sum::<f64>() / severities.len() as f64
        };
        let overall_level = if counts.critical > 0 {
            RiskLevel::Critical
        } else if counts.high > 0 {
            RiskLevel::High
        } else {
            RiskLevel::from_severity(risk_score)
        };

        let dependencies = derive_dependencies(&assessed, self.config.max_dependency_edges);
        let trend = factor_trend(&assessed);
        let recommendations = recommend(&assessed, &counts, trend, dependencies.len());
        let mitigation_plan: Vec<RiskMitigationPlan> = assessed
            .iter()
            .filter(|r| r.level >= RiskLevel::High)
            .map(|r| RiskMitigationPlan::skeleton(r))
            .collect();

        let assessment = RiskAssessment {
            id: new_id(),
            timestamp: Utc::now(),
            context: context.clone(),
            assessed_risk_ids: assessed.iter().map(|r| r.id.clone()).collect(),
            skipped_risk_ids: skipped,
            counts,
            risk_score,
            overall_level,
            trend,
            dependencies,
            recommendations,
            mitigation_plan,
        };
        info!(
            "Assessment {}: {} risks, score={:.3}, level={}, trend={:?}",
            assessment.id,
            assessment.assessed_risk_ids.len(),
            assessment.risk_score,
            assessment.overall_level,
            assessment.trend
        );

        self.history.push_back(assessment.clone());
        while self.history.len() > self.config.assessment_history_cap {
            self.history.pop_front();
        }
        Ok(assessment)
    }

    /// Most recent assessments, newest last.
    pub fn assessment_history(&self, limit: Option<usize>) -> Vec<&RiskAssessment> {
        let start = limit
            .map(|n| self.history.len().saturating_sub(n))
            .unwrap_or(0);
        self.history.iter().skip(start).collect()
    }

    // ── Decision options ──

    pub fn evaluate_decision_risk(
        &self,
        options: &[DecisionOption],
        context: &DecisionContext,
    ) -> Result<DecisionRiskReport> {
        context.validate()?;
        if options.is_empty() {
            return Err(ValidationError::empty("options").into());
        }
        for option in options {
            if option.id.trim().is_empty() {
                return Err(ValidationError::missing("option.id").into());
            }
            option.attributes.validate()?;
        }

        let breakdowns: Vec<OptionRiskBreakdown> = options
            .iter()
            .map(|option| match option_risk(option) {
                Ok(b) => b,
                Err(e) => {
                    error!("Risk scoring degraded for option {}: {}", option.id, e);
                    OptionRiskBreakdown {
                        option_id: option.id.clone(),
                        option_name: option.name.clone(),
                        base_risk: 0.0,
                        complexity_multiplier: 0.0,
                        novelty_multiplier: 0.0,
                        resource_multiplier: 0.0,
                        time_multiplier: 0.0,
                        risk_score: 0.0,
                        level: RiskLevel::None,
                        degraded: true,
                    }
                }
            })
            .collect();

        // First option wins ties so the result is stable
        let mut lowest = &breakdowns[0];
        let mut highest = &breakdowns[0];
        for b in &breakdowns[1..] {
            if b.risk_score < lowest.risk_score {
                lowest = b;
            }
            if b.risk_score > highest.risk_score {
                highest = b;
            }
        }
        let comparison = RiskComparison {
            lowest_risk_option: lowest.option_id.clone(),
            highest_risk_option: highest.option_id.clone(),
            relative_safety: breakdowns
                .iter()
                .map(|b| (b.option_id.clone(), 1.0 - b.risk_score))
                .collect::<BTreeMap<_, _>>(),
            spread: highest.risk_score - lowest.risk_score,
        };
        let recommended_option = lowest.option_id.clone();

        Ok(DecisionRiskReport {
            options: breakdowns,
            comparison,
            recommended_option,
        })
    }

    /// Risk summary for the option a decision picked. Degrades instead of failing.
    pub fn summarize_decision_risk(
        &self,
        options: &[DecisionOption],
        selected: usize,
        context: &DecisionContext,
    ) -> DecisionRiskSummary {
        let Some(chosen) = options.get(selected) else {
            error!("Risk summary requested for missing option index {}", selected);
            return DecisionRiskSummary {
                degraded: true,
                ..DecisionRiskSummary::default()
            };
        };
        let report = match self.evaluate_decision_risk(options, context) {
            Ok(r) => r,
            Err(e) => {
                error!("Decision risk summary degraded: {}", e);
                return DecisionRiskSummary {
                    selected_option: chosen.id.clone(),
                    degraded: true,
                    ..DecisionRiskSummary::default()
                };
            }
        };
        let Some(mine) = report.options.get(selected) else {
            return DecisionRiskSummary {
                selected_option: chosen.id.clone(),
                degraded: true,
                ..DecisionRiskSummary::default()
            };
        };

        let lower: Vec<&OptionRiskBreakdown> = report
            .options
            .iter()
            .filter(|b| b.option_id != mine.option_id && b.risk_score + 0.2 < mine.risk_score)
            .collect();
        let open_high_risks = self
            .risks()
            .filter(|r| r.status.is_active() && r.level >= RiskLevel::High)
            .count();

        let mut recommendations = Vec::new();
        if mine.level >= RiskLevel::High {
            recommendations.push(format!(
                "Break '{}' into smaller, reversible steps",
                chosen.name
            ));
        }
        if chosen.attributes.time_sensitive {
            recommendations.push("Set explicit checkpoints against the deadline".to_string());
        }
        if chosen.attributes.resource_intensive {
            recommendations.push("Confirm resource availability before committing".to_string());
        }
        if chosen.attributes.novelty > 0.6 {
            recommendations.push(format!("Pilot '{}' on a small scope first", chosen.name));
        }
        for alt in &lower {
            recommendations.push(format!(
                "Keep '{}' as a lower-risk fallback (score {:.2})",
                alt.option_name, alt.risk_score
            ));
        }
        if open_high_risks > 0 {
            recommendations.push(format!(
                "{} open high-severity risk(s) in the registry may compound this decision",
                open_high_risks
            ));
        }
        if recommendations.is_empty() {
            recommendations.push("Risk is within tolerance; proceed with routine monitoring".to_string());
        }

        DecisionRiskSummary {
            selected_option: chosen.id.clone(),
            risk_score: mine.risk_score,
            level: Some(mine.level),
            recommendations,
            lower_risk_alternatives: lower.iter().map(|b| b.option_id.clone()).collect(),
            open_high_risks,
            degraded: mine.degraded,
        }
    }

    // ── Simulation ──

    fn simulation_inputs(
        &self,
        selection: &RiskSelection,
        trials: Option<usize>,
    ) -> Result<(Vec<RiskParams>, usize)> {
        let trials = match trials {
            Some(0) => {
                return Err(ValidationError::out_of_range(
                    "trials",
                    1.0,
                    self.config.max_simulation_trials as f64,
                    0.0,
                )
                .into())
            }
            Some(n) if n > self.config.max_simulation_trials => {
                warn!(
                    "Requested {} trials, capping at {}",
                    n, self.config.max_simulation_trials
                );
                self.config.max_simulation_trials
            }
            Some(n) => n,
            None => self.config.default_simulation_trials,
        };
        let ids = self.resolve_selection(selection)?;
        let params = ids
            .iter()
            .filter_map(|id| self.risks.get(id))
            .map(|r| RiskParams {
                id: r.id.clone(),
                likelihood: r.likelihood,
                exposure: r.residual_impact(),
            })
            .collect();
        Ok((params, trials))
    }

    /// Run the simulation on the calling thread.
    pub fn simulate_risk_scenarios(
        &self,
        selection: &RiskSelection,
        trials: Option<usize>,
    ) -> Result<SimulationResult> {
        let (params, trials) = self.simulation_inputs(selection, trials)?;
        if params.is_empty() {
            return Ok(SimulationResult::zeroed(Vec::new(), trials, None));
        }
        let mut rng = rng_for(self.config.simulation_seed, 0);
        let batch = run_trials(&params, trials, &mut rng, None);
        Ok(self.finish_simulation(&params, trials, summarize(&params, batch, 1)))
    }

    /// Run the simulation across blocking worker tasks, bounded by the configured timeout.
    pub async fn simulate_risk_scenarios_parallel(
        &self,
        selection: &RiskSelection,
        trials: Option<usize>,
    ) -> Result<SimulationResult> {
        let (params, trials) = self.simulation_inputs(selection, trials)?;
        if params.is_empty() {
            return Ok(SimulationResult::zeroed(Vec::new(), trials, None));
        }
        let workers = self.config.resolved_simulation_workers();
        let params = Arc::new(params);
        let outcome = run_parallel(
            Arc::clone(&params),
            trials,
            workers,
            self.config.simulation_seed,
            self.config.simulation_timeout(),
        )
        .await
        .and_then(|batch| summarize(&params, batch, workers));
        Ok(self.finish_simulation(&params, trials, outcome))
    }

    fn finish_simulation(
        &self,
        params: &[RiskParams],
        trials: usize,
        outcome: std::result::Result<SimulationResult, OperationalError>,
    ) -> SimulationResult {
        match outcome {
            Ok(result) => {
                info!(
                    "Simulation {}: {} risks x {} trials, E={:.3}, 95% [{:.3}, {:.3}]",
                    result.id,
                    params.len(),
                    result.trials,
                    result.expected_value,
                    result.confidence_interval_95.0,
                    result.confidence_interval_95.1
                );
                result
            }
            Err(e) => {
                error!("Simulation degraded: {}", e);
                SimulationResult::zeroed(
                    params.iter().map(|p| p.id.clone()).collect(),
                    trials,
                    Some(e.to_string()),
                )
            }
        }
    }

    // ── Mitigation ──

    pub fn create_mitigation_plan(&mut self, new: NewMitigationPlan) -> Result<RiskMitigationPlan> {
        if new.target_risk_ids.is_empty() {
            return Err(ValidationError::empty("target_risk_ids").into());
        }
        ensure_unit("plan.expected_effectiveness", new.expected_effectiveness)?;
        ensure_unit("plan.current_effectiveness", new.current_effectiveness)?;
        // Check every target before touching any of them
        for id in &new.target_risk_ids {
            if !self.risks.contains_key(id) {
                return Err(ConsistencyError::UnknownRisk { id: id.clone() }.into());
            }
        }

        let now = Utc::now();
        let mut plan = RiskMitigationPlan {
            id: new_id(),
            target_risk_ids: new.target_risk_ids,
            strategy: new.strategy,
            actions: new.actions,
            expected_effectiveness: new.expected_effectiveness,
            current_effectiveness: new.current_effectiveness,
            status: PlanStatus::Active,
            owner: new.owner,
            created_at: now,
            updated_at: now,
        };
        self.apply_plan(&mut plan)?;
        info!(
            "Mitigation plan {} ({:?}) covers {} risk(s), effectiveness {:.2}/{:.2}",
            plan.id,
            plan.strategy,
            plan.target_risk_ids.len(),
            plan.current_effectiveness,
            plan.expected_effectiveness
        );
        self.plan_order.push(plan.id.clone());
        self.plans.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    pub fn update_mitigation_progress(
        &mut self,
        plan_id: &str,
        current_effectiveness: f64,
    ) -> Result<RiskMitigationPlan> {
        ensure_unit("plan.current_effectiveness", current_effectiveness)?;
        let mut plan = self
            .plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| ConsistencyError::UnknownPlan {
                id: plan_id.to_string(),
            })?;
        for id in &plan.target_risk_ids {
            if !self.risks.contains_key(id) {
                return Err(ConsistencyError::UnknownRisk { id: id.clone() }.into());
            }
        }
        plan.current_effectiveness = current_effectiveness;
        plan.updated_at = Utc::now();
        self.apply_plan(&mut plan)?;
        self.plans.insert(plan.id.clone(), plan.clone());
        Ok(plan)
    }

    pub fn get_plan(&self, plan_id: &str) -> Option<&RiskMitigationPlan> {
        self.plans.get(plan_id)
    }

    pub fn plans(&self) -> impl Iterator<Item = &RiskMitigationPlan> {
        self.plan_order.iter().filter_map(|id| self.plans.get(id))
    }

    /// Write the plan's current effectiveness into every target and refresh its status.
    fn apply_plan(&mut self, plan: &mut RiskMitigationPlan) -> Result<()> {
        let reached = plan.expected_effectiveness > 0.0
            && plan.current_effectiveness >= plan.expected_effectiveness;
        for id in &plan.target_risk_ids {
            let mut risk = self.take_for_update(id)?;
            risk.mitigation_effectiveness = plan.current_effectiveness;
            if risk.status.is_active() {
                risk.status = if reached {
                    RiskStatus::Mitigated
                } else {
                    RiskStatus::Mitigating
                };
            }
            risk.recompute();
            risk.updated_at = Utc::now();
            self.put_back(risk);
        }
        plan.status = if reached {
            PlanStatus::Completed
        } else {
            PlanStatus::Active
        };
        Ok(())
    }

    // ── Read-only views ──

    pub fn risk_dashboard(&self) -> RiskDashboard {
        let mut by_level = LevelCounts::default();
        let mut by_category = BTreeMap::new();
        let mut by_status = BTreeMap::new();
        let mut factor_alerts = Vec::new();
        let mut errors = Vec::new();
        let mut active: Vec<&Risk> = Vec::new();

        for risk in self.risks() {
            *by_status.entry(risk.status).or_insert(0) += 1;
            let expected = severity(risk.likelihood, risk.impact, risk.mitigation_effectiveness);
            if !risk.severity.is_finite() || (risk.severity - expected).abs() > 1e-9 {
                errors.push(format!(
                    "risk {} has inconsistent severity {} (expected {})",
                    risk.id, risk.severity, expected
                ));
            }
            if !risk.status.is_active() {
                continue;
            }
            active.push(risk);
            by_level.add(risk.level);
            *by_category.entry(risk.category).or_insert(0) += 1;
            for f in &risk.factors {
                if f.value >= f.warning_threshold {
                    let critical = f.value >= f.critical_threshold;
                    factor_alerts.push(FactorAlert {
                        risk_id: risk.id.clone(),
                        factor: f.name.clone(),
                        value: f.value,
                        threshold: if critical {
                            f.critical_threshold
                        } else {
                            f.warning_threshold
                        },
                        critical,
                    });
                }
            }
        }

        let average_mitigation = if active.is_empty() {
            0.0
        } else {
            active.iter().map(|r| r.mitigation_effectiveness).sum::<f64>() / active.len() as f64
        };
        let mut top = active.clone();
        top.sort_by(|a, b| {
            b.severity
                .partial_cmp(&a.severity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        RiskDashboard {
            generated_at: Utc::now(),
            total_risks: self.risks.len(),
            active_risks: active.len(),
            by_level,
            by_category,
            by_status,
            top_risks: top.into_iter().take(TOP_RISKS).map(RiskSummary::from).collect(),
            factor_alerts,
            active_plans: self
                .plans()
                .filter(|p| p.status != PlanStatus::Completed)
                .count(),
            average_mitigation,
            latest_assessment: self.history.back().map(AssessmentSummary::from),
            errors,
        }
    }

    pub fn risk_statistics(&self) -> RiskStatistics {
        let scores: Vec<f64> = self.history.iter().map(|a| a.risk_score).collect();
        let mut level_distribution = BTreeMap::new();
        for a in &self.history {
            *level_distribution.entry(a.overall_level).or_insert(0) += 1;
        }
        let (mean, min, max) = if scores.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                scores.iter().sum::<f64>() / scores.len() as f64,
                scores.iter().cloned().fold(f64::INFINITY, f64::min),
                scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            )
        };
        RiskStatistics {
            assessments: scores.len(),
            mean_score: mean,
            min_score: min,
            max_score: max,
            level_distribution,
            score_trend: score_trend(&scores),
            total_plans: self.plans.len(),
            completed_plans: self
                .plans
                .values()
                .filter(|p| p.status == PlanStatus::Completed)
                .count(),
        }
    }
}

fn checked_severity(risk: &Risk) -> std::result::Result<f64, OperationalError> {
    let raw = risk.likelihood * risk.impact * (1.0 - risk.mitigation_effectiveness);
    if !raw.is_finite() {
        return Err(OperationalError::NonFinite {
            stage: "risk severity",
        });
    }
    Ok(severity(risk.likelihood, risk.impact, risk.mitigation_effectiveness))
}

fn option_risk(option: &DecisionOption) -> std::result::Result<OptionRiskBreakdown, OperationalError> {
    let a = &option.attributes;
    let complexity = a.complexity * COMPLEXITY_WEIGHT;
    let novelty = a.novelty * NOVELTY_WEIGHT;
    let resource = if a.resource_intensive {
        RESOURCE_INTENSIVE_MULTIPLIER
    } else {
        0.0
    };
    let time = if a.time_sensitive {
        TIME_SENSITIVE_MULTIPLIER
    } else {
        0.0
    };
    let raw = a.risk_factor * (1.0 + complexity) * (1.0 + novelty) * (1.0 + resource) * (1.0 + time);
    if !raw.is_finite() {
        return Err(OperationalError::NonFinite {
            stage: "option risk",
        });
    }
    let risk_score = raw.min(1.0);
    Ok(OptionRiskBreakdown {
        option_id: option.id.clone(),
        option_name: option.name.clone(),
        base_risk: a.risk_factor,
        complexity_multiplier: complexity,
        novelty_multiplier: novelty,
        resource_multiplier: resource,
        time_multiplier: time,
        risk_score,
        level: RiskLevel::from_severity(risk_score),
        degraded: false,
    })
}

/// Pairwise edges between risks sharing a category or a type.
fn derive_dependencies(risks: &[&Risk], max_edges: usize) -> Vec<RiskDependency> {
    let mut edges = Vec::new();
    'outer: for (i, a) in risks.iter().enumerate() {
        for b in &risks[i + 1..] {
            let same_category = a.category == b.category;
            let same_type = a.risk_type == b.risk_type;
            let (relation, strength) = match (same_category, same_type) {
                (true, true) => (DependencyRelation::SharedCategoryAndType, 0.8),
                (true, false) => (DependencyRelation::SharedCategory, 0.5),
                (false, true) => (DependencyRelation::SharedType, 0.6),
                (false, false) => continue,
            };
            if edges.len() >= max_edges {
                warn!("Dependency edges capped at {}", max_edges);
                break 'outer;
            }
            edges.push(RiskDependency {
                from: a.id.clone(),
                to: b.id.clone(),
                relation,
                strength,
            });
        }
    }
    edges
}

/// Direction wins when its factor count is at least 1.5× the opposite count.
fn factor_trend(risks: &[&Risk]) -> Trend {
    let (mut up, mut down) = (0usize, 0usize);
    for f in risks.iter().flat_map(|r| r.factors.iter()) {
        match f.trend {
            Trend::Increasing => up += 1,
            Trend::Decreasing => down += 1,
            Trend::Stable => {}
        }
    }
    if up > 0 && up as f64 >= TREND_RATIO * down as f64 {
        Trend::Increasing
    } else if down > 0 && down as f64 >= TREND_RATIO * up as f64 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn recommend(
    risks: &[&Risk],
    counts: &LevelCounts,
    trend: Trend,
    dependency_count: usize,
) -> Vec<String> {
    let mut out = Vec::new();
    if counts.critical > 0 {
        out.push(format!(
            "Mitigate {} critical risk(s) immediately",
            counts.critical
        ));
    }
    if counts.high > 0 {
        out.push(format!("Prioritise mitigation for {} high risk(s)", counts.high));
    }
    for r in risks
        .iter()
        .filter(|r| r.level >= RiskLevel::Medium && r.mitigation_effectiveness < WEAK_MITIGATION)
    {
        out.push(format!(
            "Review mitigation for '{}' (effectiveness {:.0}%)",
            r.name,
            r.mitigation_effectiveness * 100.0
        ));
    }
    if trend == Trend::Increasing {
        out.push("Risk factors are trending upward; increase monitoring frequency".to_string());
    }
    if dependency_count > 0 && counts.high + counts.critical > 0 {
        out.push(format!(
            "Check {} related risk pair(s) for cascading effects",
            dependency_count
        ));
    }
    if out.is_empty() {
        out.push("No significant risks; continue routine monitoring".to_string());
    }
    out
}

/// Compare the mean of the later half of scores with the earlier half.
fn score_trend(scores: &[f64]) -> Trend {
    if scores.len() < 2 {
        return Trend::Stable;
    }
    let mid = scores.len() / 2;
    let early = scores[..mid].iter().sum::<f64>() / mid as f64;
    let late = scores[mid..].iter().sum::<f64>() / (scores.len() - mid) as f64;
    if late - early > 0.05 {
        Trend::Increasing
    } else if early - late > 0.05 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::reasoning::test_option;
    use crate::types::OptionRiskLevel;

    fn engine() -> RiskAssessmentEngine {
        RiskAssessmentEngine::new(&EngineConfig {
            simulation_seed: Some(11),
            ..EngineConfig::default()
        })
    }

    fn ctx() -> DecisionContext {
        DecisionContext::default()
    }

    #[test]
    fn test_add_risk_computes_severity_and_level() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("outage", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        let r = e.get_risk(&id).unwrap();
        assert!((r.severity - 0.4).abs() < 1e-9);
        assert_eq!(r.level, RiskLevel::Medium);
        assert_eq!(e.risks_by_level(RiskLevel::Medium).len(), 1);
        assert_eq!(e.risks_by_type("general").len(), 1);
    }

    #[test]
    fn test_add_risk_rejects_bad_input() {
        let mut e = engine();
        let err = e
            .add_risk(NewRisk::new("bad", RiskCategory::Technical, 1.5, 0.8))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert!(e.is_empty());
    }

    #[test]
    fn test_update_risk_reindexes() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("outage", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        let updated = e
            .update_risk(
                &id,
                RiskUpdate {
                    likelihood: Some(1.0),
                    impact: Some(0.9),
                    risk_type: Some("infra".into()),
                    ..RiskUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.level, RiskLevel::Critical);
        assert!(e.risks_by_level(RiskLevel::Medium).is_empty());
        assert_eq!(e.risks_by_level(RiskLevel::Critical).len(), 1);
        assert!(e.risks_by_type("general").is_empty());
        assert_eq!(e.risks_by_type("infra").len(), 1);
    }

    #[test]
    fn test_update_unknown_risk() {
        let mut e = engine();
        let err = e.update_risk("nope", RiskUpdate::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::Consistency(ConsistencyError::UnknownRisk { .. })
        ));
    }

    #[test]
    fn test_assess_empty_ids_is_validation_error() {
        let mut e = engine();
        let err = e
            .assess_risks(&ctx(), &RiskSelection::Ids(vec![]))
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::EmptyTargetSet { .. })
        ));
    }

    #[test]
    fn test_assess_all_on_empty_registry_is_zeroed() {
        let mut e = engine();
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert_eq!(a.risk_score, 0.0);
        assert_eq!(a.overall_level, RiskLevel::None);
        assert_eq!(a.counts.total(), 0);
    }

    #[test]
    fn test_assess_levels_and_score() {
        let mut e = engine();
        e.add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.8))
            .unwrap(); // 0.40 medium
        e.add_risk(NewRisk::new("b", RiskCategory::Financial, 0.2, 0.5))
            .unwrap(); // 0.10 none
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert!((a.risk_score - 0.25).abs() < 1e-9);
        assert_eq!(a.overall_level, RiskLevel::Low);
        assert_eq!(a.counts.medium, 1);
        assert_eq!(a.counts.none, 1);
        assert!(a.mitigation_plan.is_empty());
    }

    #[test]
    fn test_duplicate_ids_counted_once() {
        let mut e = engine();
        let a = e
            .add_risk(NewRisk::new("a", RiskCategory::Technical, 0.9, 0.95))
            .unwrap(); // 0.855 critical
        let b = e
            .add_risk(NewRisk::new("b", RiskCategory::Technical, 0.1, 0.1))
            .unwrap(); // 0.01 none
        let sel = RiskSelection::Ids(vec![a.clone(), a.clone(), b.clone()]);
        let r = e.assess_risks(&ctx(), &sel).unwrap();
        assert_eq!(r.assessed_risk_ids, vec![a.clone(), b]);
        assert!((r.risk_score - 0.4325).abs() < 1e-9);
        assert_eq!(r.counts.critical, 1);
        assert_eq!(r.counts.total(), 2);
        assert!(r.dependencies.iter().all(|d| d.from != d.to));

        let sim = e
            .simulate_risk_scenarios(&RiskSelection::Ids(vec![a.clone(), a.clone()]), Some(20_000))
            .unwrap();
        assert_eq!(sim.risk_ids, vec![a]);
        assert!(sim.worst_case <= 1.0);
        assert!((sim.expected_value - 0.855).abs() < 0.02);
    }

    #[test]
    fn test_any_critical_forces_critical() {
        let mut e = engine();
        e.add_risk(NewRisk::new("breach", RiskCategory::Security, 0.95, 0.95))
            .unwrap();
        for i in 0..5 {
            e.add_risk(NewRisk::new(&format!("minor{}", i), RiskCategory::Social, 0.1, 0.1))
                .unwrap();
        }
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert_eq!(a.overall_level, RiskLevel::Critical);
        assert_eq!(a.mitigation_plan.len(), 1);
        assert_eq!(a.mitigation_plan[0].strategy, MitigationStrategy::Avoid);
        assert!(a.recommendations[0].contains("critical"));
    }

    #[test]
    fn test_closed_risks_excluded_from_all() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("old", RiskCategory::Technical, 0.9, 0.9))
            .unwrap();
        e.close_risk(&id).unwrap();
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert!(a.assessed_risk_ids.is_empty());
        assert!(e.get_risk(&id).is_some());
    }

    #[test]
    fn test_dependencies_share_category_or_type() {
        let mut e = engine();
        let a = e
            .add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5).with_type("db"))
            .unwrap();
        let b = e
            .add_risk(NewRisk::new("b", RiskCategory::Technical, 0.5, 0.5).with_type("net"))
            .unwrap();
        let c = e
            .add_risk(NewRisk::new("c", RiskCategory::Financial, 0.5, 0.5).with_type("db"))
            .unwrap();
        e.add_risk(NewRisk::new("d", RiskCategory::Social, 0.5, 0.5).with_type("people"))
            .unwrap();
        let assessment = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        let deps = &assessment.dependencies;
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.from == a
            && d.to == b
            && d.relation == DependencyRelation::SharedCategory));
        assert!(deps
            .iter()
            .any(|d| d.from == a && d.to == c && d.relation == DependencyRelation::SharedType));
    }

    #[test]
    fn test_factor_trend_ratio() {
        let mut e = engine();
        let r = NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5)
            .with_factor(RiskFactor::new("f1", 0.5, Trend::Increasing))
            .with_factor(RiskFactor::new("f2", 0.5, Trend::Increasing))
            .with_factor(RiskFactor::new("f3", 0.5, Trend::Increasing))
            .with_factor(RiskFactor::new("f4", 0.5, Trend::Decreasing))
            .with_factor(RiskFactor::new("f5", 0.5, Trend::Decreasing));
        let id = e.add_risk(r).unwrap();
        // 3 up vs 2 down: 3 >= 1.5 * 2
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert_eq!(a.trend, Trend::Increasing);

        e.update_risk_factor(&id, "f3", 0.5, Trend::Stable).unwrap();
        // 2 up vs 2 down
        let a = e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        assert_eq!(a.trend, Trend::Stable);
    }

    #[test]
    fn test_assessment_history_capped() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            assessment_history_cap: 3,
            ..EngineConfig::default()
        });
        for _ in 0..5 {
            e.assess_risks(&ctx(), &RiskSelection::All).unwrap();
        }
        assert_eq!(e.assessment_history(None).len(), 3);
        assert_eq!(e.assessment_history(Some(1)).len(), 1);
        assert_eq!(e.risk_statistics().assessments, 3);
    }

    #[test]
    fn test_mitigation_plan_writes_back() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("outage", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        let plan = e
            .create_mitigation_plan(NewMitigationPlan {
                target_risk_ids: vec![id.clone()],
                strategy: MitigationStrategy::Reduce,
                actions: vec!["add replica".into()],
                expected_effectiveness: 0.8,
                current_effectiveness: 0.5,
                owner: None,
            })
            .unwrap();
        assert_eq!(plan.status, PlanStatus::Active);
        let r = e.get_risk(&id).unwrap();
        assert!((r.severity - 0.2).abs() < 1e-9);
        assert_eq!(r.level, RiskLevel::Low);
        assert_eq!(r.status, RiskStatus::Mitigating);

        let plan = e.update_mitigation_progress(&plan.id, 0.8).unwrap();
        assert_eq!(plan.status, PlanStatus::Completed);
        let r = e.get_risk(&id).unwrap();
        assert!((r.severity - 0.08).abs() < 1e-9);
        assert_eq!(r.status, RiskStatus::Mitigated);
        assert_eq!(e.risks_by_level(RiskLevel::None).len(), 1);
    }

    #[test]
    fn test_mitigation_plan_unknown_target_is_atomic() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("outage", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        let err = e
            .create_mitigation_plan(NewMitigationPlan {
                target_risk_ids: vec![id.clone(), "ghost".into()],
                strategy: MitigationStrategy::Reduce,
                actions: vec![],
                expected_effectiveness: 0.8,
                current_effectiveness: 0.5,
                owner: None,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Consistency(ConsistencyError::UnknownRisk { .. })
        ));
        assert_eq!(e.get_risk(&id).unwrap().mitigation_effectiveness, 0.0);
        assert_eq!(e.plans().count(), 0);
    }

    #[test]
    fn test_mitigation_plan_rejects_bad_effectiveness() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("outage", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        let err = e
            .create_mitigation_plan(NewMitigationPlan {
                target_risk_ids: vec![id],
                strategy: MitigationStrategy::Transfer,
                actions: vec![],
                expected_effectiveness: 1.4,
                current_effectiveness: 0.0,
                owner: None,
            })
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_decision_risk_formula_and_recommendation() {
        let e = engine();
        let mut safe = test_option("safe", 0.7, 0.6, OptionRiskLevel::Low);
        safe.attributes.risk_factor = 0.2;
        safe.attributes.complexity = 0.0;
        safe.attributes.novelty = 0.0;
        let mut bold = test_option("bold", 0.7, 0.6, OptionRiskLevel::High);
        bold.attributes.risk_factor = 0.4;
        bold.attributes.complexity = 1.0;
        bold.attributes.novelty = 1.0;
        bold.attributes.resource_intensive = true;
        bold.attributes.time_sensitive = true;

        let report = e.evaluate_decision_risk(&[safe, bold], &ctx()).unwrap();
        assert!((report.options[0].risk_score - 0.2).abs() < 1e-12);
        let expected = 0.4 * 1.3 * 1.25 * 1.2 * 1.15;
        assert!((report.options[1].risk_score - expected).abs() < 1e-12);
        assert_eq!(report.recommended_option, "safe");
        assert_eq!(report.comparison.highest_risk_option, "bold");
        assert!((report.comparison.relative_safety["safe"] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_decision_risk_caps_at_one() {
        let e = engine();
        let mut o = test_option("x", 0.5, 0.5, OptionRiskLevel::VeryHigh);
        o.attributes.risk_factor = 1.0;
        o.attributes.complexity = 1.0;
        let report = e.evaluate_decision_risk(&[o], &ctx()).unwrap();
        assert_eq!(report.options[0].risk_score, 1.0);
        assert_eq!(report.options[0].level, RiskLevel::Critical);
    }

    #[test]
    fn test_decision_risk_empty_options() {
        let e = engine();
        assert!(matches!(
            e.evaluate_decision_risk(&[], &ctx()).unwrap_err(),
            EngineError::Validation(ValidationError::EmptyTargetSet { .. })
        ));
    }

    #[test]
    fn test_summary_suggests_fallback() {
        let e = engine();
        let mut safe = test_option("safe", 0.7, 0.6, OptionRiskLevel::Low);
        safe.attributes.risk_factor = 0.1;
        let mut bold = test_option("bold", 0.7, 0.6, OptionRiskLevel::High);
        bold.attributes.risk_factor = 0.9;
        let options = vec![safe, bold];
        let summary = e.summarize_decision_risk(&options, 1, &ctx());
        assert!(!summary.degraded);
        assert_eq!(summary.lower_risk_alternatives, vec!["safe".to_string()]);
        assert!(!summary.recommendations.is_empty());
    }

    #[test]
    fn test_summary_out_of_range_degrades() {
        let e = engine();
        let options = vec![test_option("a", 0.5, 0.5, OptionRiskLevel::Low)];
        let summary = e.summarize_decision_risk(&options, 4, &ctx());
        assert!(summary.degraded);
        assert!(summary.recommendations.is_empty());
    }

    #[test]
    fn test_simulation_validation() {
        let mut e = engine();
        let id = e
            .add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        let sel = RiskSelection::Ids(vec![id]);
        assert!(e.simulate_risk_scenarios(&sel, Some(0)).is_err());
        assert!(e
            .simulate_risk_scenarios(&RiskSelection::Ids(vec!["ghost".into()]), None)
            .is_err());
        let r = e.simulate_risk_scenarios(&sel, None).unwrap();
        assert_eq!(r.trials, 1000);
    }

    #[test]
    fn test_simulation_caps_trials() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            max_simulation_trials: 2000,
            ..EngineConfig::default()
        });
        e.add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        let r = e
            .simulate_risk_scenarios(&RiskSelection::All, Some(50_000))
            .unwrap();
        assert_eq!(r.trials, 2000);
    }

    #[test]
    fn test_simulation_all_on_empty_registry() {
        let e = engine();
        let r = e.simulate_risk_scenarios(&RiskSelection::All, None).unwrap();
        assert_eq!(r.expected_value, 0.0);
        assert!(!r.degraded);
    }

    #[tokio::test]
    async fn test_parallel_simulation_timeout_degrades() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            simulation_timeout_ms: 0,
            simulation_workers: 2,
            ..EngineConfig::default()
        });
        for i in 0..50 {
            e.add_risk(NewRisk::new(&format!("r{}", i), RiskCategory::Technical, 0.5, 0.5))
                .unwrap();
        }
        let r = e
            .simulate_risk_scenarios_parallel(&RiskSelection::All, Some(1_000_000))
            .await
            .unwrap();
        assert!(r.degraded);
        assert_eq!(r.expected_value, 0.0);
        assert!(r.error.unwrap().contains("budget"));
    }

    #[tokio::test]
    async fn test_parallel_simulation_matches_expectation() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            simulation_workers: 3,
            simulation_seed: Some(5),
            ..EngineConfig::default()
        });
        e.add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.8))
            .unwrap();
        e.add_risk(
            NewRisk::new("b", RiskCategory::Financial, 0.3, 0.6).with_mitigation(0.5),
        )
        .unwrap();
        let r = e
            .simulate_risk_scenarios_parallel(&RiskSelection::All, Some(30_000))
            .await
            .unwrap();
        let expected = 0.5 * 0.8 + 0.3 * 0.6 * 0.5;
        assert!((r.expected_value - expected).abs() < 0.02);
        assert_eq!(r.workers, 3);
    }

    #[test]
    fn test_dashboard_and_alerts() {
        let mut e = engine();
        let mut hot = RiskFactor::new("load", 0.9, Trend::Increasing);
        hot.critical_threshold = 0.85;
        e.add_risk(NewRisk::new("a", RiskCategory::Technical, 0.9, 0.9).with_factor(hot))
            .unwrap();
        let id = e
            .add_risk(NewRisk::new("b", RiskCategory::Financial, 0.2, 0.2))
            .unwrap();
        e.close_risk(&id).unwrap();
        e.assess_risks(&ctx(), &RiskSelection::All).unwrap();

        let d = e.risk_dashboard();
        assert_eq!(d.total_risks, 2);
        assert_eq!(d.active_risks, 1);
        assert_eq!(d.by_level.critical, 1);
        assert_eq!(d.factor_alerts.len(), 1);
        assert!(d.factor_alerts[0].critical);
        assert!(d.latest_assessment.is_some());
        assert!(d.errors.is_empty());
        assert_eq!(d.by_status[&RiskStatus::Closed], 1);
    }

    #[test]
    fn test_soft_cap_evicts_closed() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            risk_registry_soft_cap: 2,
            ..EngineConfig::default()
        });
        let first = e
            .add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        e.add_risk(NewRisk::new("b", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        e.close_risk(&first).unwrap();
        e.add_risk(NewRisk::new("c", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        assert_eq!(e.len(), 2);
        assert!(e.get_risk(&first).is_none());

        // Nothing closed: accepted past the cap
        e.add_risk(NewRisk::new("d", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        assert_eq!(e.len(), 3);
    }

    #[test]
    fn test_soft_cap_keeps_planned_closed_risk() {
        let mut e = RiskAssessmentEngine::new(&EngineConfig {
            risk_registry_soft_cap: 2,
            ..EngineConfig::default()
        });
        let a = e
            .add_risk(NewRisk::new("a", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        let b = e
            .add_risk(NewRisk::new("b", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();
        let plan = e
            .create_mitigation_plan(NewMitigationPlan {
                target_risk_ids: vec![a.clone(), b.clone()],
                strategy: MitigationStrategy::Reduce,
                actions: vec![],
                expected_effectiveness: 0.9,
                current_effectiveness: 0.2,
                owner: None,
            })
            .unwrap();
        e.close_risk(&a).unwrap();
        e.add_risk(NewRisk::new("c", RiskCategory::Technical, 0.5, 0.5))
            .unwrap();

        assert_eq!(e.len(), 3);
        assert_eq!(e.get_risk(&a).unwrap().status, RiskStatus::Closed);
        let plan = e.update_mitigation_progress(&plan.id, 0.5).unwrap();
        assert_eq!(plan.status, PlanStatus::Active);
        assert!((e.get_risk(&b).unwrap().mitigation_effectiveness - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_score_trend() {
        assert_eq!(score_trend(&[0.1, 0.1, 0.5, 0.5]), Trend::Increasing);
        assert_eq!(score_trend(&[0.5, 0.5, 0.1]), Trend::Decreasing);
        assert_eq!(score_trend(&[0.3]), Trend::Stable);
    }
}
