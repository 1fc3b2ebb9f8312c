//! Decision validation. Always produces a report; malformed input is an
//! invalid report, never an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reasoning::{Decision, DecisionOption};
use crate::types::RiskLevel;

const LOW_CONFIDENCE: f64 = 0.3;
const REQUIRED_FIELDS: &[&str] = &[
    "id",
    "situation",
    "options",
    "selected_option_id",
    "reasoning",
    "confidence",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Resource,
    Permission,
}

impl std::fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredicateKind::Resource => write!(f, "resource"),
            PredicateKind::Permission => write!(f, "permission"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredicateOutcome {
    Pass,
    Warn(String),
    Fail(String),
}

/// Collaborator check run against the selected option.
pub trait ValidationPredicate: Send + Sync {
    fn kind(&self) -> PredicateKind;
    fn name(&self) -> &str;
    fn check(&self, option: &DecisionOption) -> PredicateOutcome;
}

pub fn validate_decision(
    decision: &Decision,
    predicates: &[Box<dyn ValidationPredicate>],
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if decision.id.trim().is_empty() {
        report.errors.push("decision id is empty".into());
    }
    if decision.options.is_empty() {
        report.errors.push("decision has no options".into());
    }
    if decision.reasoning.trim().is_empty() {
        report.errors.push("reasoning is empty".into());
        report
            .suggestions
            .push("Explain why the selected option was chosen".into());
    }
    if !decision.confidence.is_finite() || !(0.0..=1.0).contains(&decision.confidence) {
        report
            .errors
            .push(format!("confidence {} is outside [0, 1]", decision.confidence));
    } else if decision.confidence < LOW_CONFIDENCE {
        report
            .warnings
            .push(format!("low decision confidence ({:.2})", decision.confidence));
        report
            .suggestions
            .push("Gather more information before acting".into());
    }

    let Some(selected) = decision.selected_option() else {
        report.errors.push(format!(
            "selected option '{}' is not among the options",
            decision.selected_option_id
        ));
        return report.finish();
    };
    if selected.id != decision.selected_option_id {
        report.errors.push(format!(
            "selected index points at '{}' but selected id is '{}'",
            selected.id, decision.selected_option_id
        ));
    }
    if selected.actions.is_empty() {
        report.errors.push("selected option has no actions".into());
        report
            .suggestions
            .push("Add at least one concrete action".into());
    }

    let risk = &decision.risk_assessment;
    if risk.degraded {
        report
            .warnings
            .push("risk summary is degraded; treat the decision with care".into());
    }
    if matches!(risk.level, Some(l) if l >= RiskLevel::High) {
        report
            .warnings
            .push(format!("selected option carries {} risk", risk.level.map_or("unknown", |l| l.as_str())));
        for alt in &risk.lower_risk_alternatives {
            report
                .suggestions
                .push(format!("Consider lower-risk alternative '{}'", alt));
        }
    }

    for predicate in predicates {
        match predicate.check(selected) {
            PredicateOutcome::Pass => {}
            PredicateOutcome::Warn(msg) => report.warnings.push(format!(
                "{} check '{}': {}",
                predicate.kind(),
                predicate.name(),
                msg
            )),
            PredicateOutcome::Fail(msg) => report.errors.push(format!(
                "{} check '{}' failed: {}",
                predicate.kind(),
                predicate.name(),
                msg
            )),
        }
    }

    report.finish()
}

/// Validate an untyped decision record, e.g. one read back from storage.
pub fn validate_decision_json(
    value: &Value,
    predicates: &[Box<dyn ValidationPredicate>],
) -> ValidationReport {
    let Some(object) = value.as_object() else {
        return ValidationReport {
            errors: vec!["decision must be a JSON object".into()],
            ..ValidationReport::default()
        }
        .finish();
    };

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| !object.contains_key(*f))
        .collect();
    if !missing.is_empty() {
        return ValidationReport {
            errors: missing
                .iter()
                .map(|f| format!("missing required field '{}'", f))
                .collect(),
            ..ValidationReport::default()
        }
        .finish();
    }

    match serde_json::from_value::<Decision>(value.clone()) {
        Ok(decision) => validate_decision(&decision, predicates),
        Err(e) => ValidationReport {
            errors: vec![format!("malformed decision: {}", e)],
            ..ValidationReport::default()
        }
        .finish(),
    }
}
