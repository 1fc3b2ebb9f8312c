//! Error taxonomy for the decision core.
//!
//! Validation and consistency failures are returned to the caller and abort
//! the single call that raised them. Operational failures never leave an
//! engine: they are logged and converted into a degraded-but-valid result.

use thiserror::Error;

/// Bad input: out-of-range numbers, missing identifiers, empty target sets.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("field '{field}' must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("field '{field}' must be a finite number")]
    NonFinite { field: String },

    #[error("missing required identifier '{field}'")]
    MissingIdentifier { field: String },

    #[error("target set '{what}' is empty")]
    EmptyTargetSet { what: String },

    #[error("field '{field}' is invalid: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, value: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            value,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        ValidationError::MissingIdentifier {
            field: field.into(),
        }
    }

    pub fn empty(what: impl Into<String>) -> Self {
        ValidationError::EmptyTargetSet { what: what.into() }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A precondition the operation depends on does not hold.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConsistencyError {
    #[error("no personality profile has been set")]
    NoPersonalityProfile,

    #[error("unknown risk '{id}'")]
    UnknownRisk { id: String },

    #[error("unknown mitigation plan '{id}'")]
    UnknownPlan { id: String },

    #[error("unknown decision '{id}'")]
    UnknownDecision { id: String },
}

/// Internal failure while scoring or simulating. Caught inside the engines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperationalError {
    #[error("non-finite intermediate value in {stage}")]
    NonFinite { stage: &'static str },

    #[error("simulation exceeded its {timeout_ms} ms budget")]
    SimulationTimedOut { timeout_ms: u64 },

    #[error("simulation worker failed: {0}")]
    TaskFailed(String),

    #[error("cannot summarise an empty distribution")]
    EmptyDistribution,
}

/// Errors surfaced by the public engine APIs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Check that `value` is finite and inside `[0, 1]`.
pub fn ensure_unit(field: &str, value: f64) -> std::result::Result<f64, ValidationError> {
    ensure_range(field, value, 0.0, 1.0)
}

/// Check that `value` is finite and inside `[min, max]`.
pub fn ensure_range(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<f64, ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite {
            field: field.to_string(),
        });
    }
    if value < min || value > max {
        return Err(ValidationError::out_of_range(field, min, max, value));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_unit_accepts_bounds() {
        assert_eq!(ensure_unit("x", 0.0), Ok(0.0));
        assert_eq!(ensure_unit("x", 1.0), Ok(1.0));
    }

    #[test]
    fn test_ensure_unit_rejects_out_of_range_and_nan() {
        assert!(matches!(
            ensure_unit("likelihood", 1.2),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            ensure_unit("likelihood", f64::NAN),
            Err(ValidationError::NonFinite { .. })
        ));
    }

    #[test]
    fn test_engine_error_wraps_and_displays() {
        let err: EngineError = ConsistencyError::UnknownRisk { id: "r1".into() }.into();
        assert_eq!(err.to_string(), "unknown risk 'r1'");
        let err: EngineError = ValidationError::empty("risk_ids").into();
        assert!(err.to_string().contains("risk_ids"));
    }
}
