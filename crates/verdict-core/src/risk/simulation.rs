//! Monte Carlo exposure simulation.
//!
//! Each trial draws one uniform number per risk; a risk occurs when the draw
//! falls below its likelihood and then contributes its residual impact
//! (`impact × (1 − mitigation)`) to the trial's total exposure. Trials are
//! independent, so the parallel path splits them across blocking workers with
//! their own RNG streams and merges the totals.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::OperationalError;
use crate::risk::model::SimulationResult;
use crate::types::new_id;

/// How often a worker checks whether the run was abandoned.
const CANCEL_CHECK_INTERVAL: usize = 1024;

/// The read-only slice of a risk a trial needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskParams {
    pub id: String,
    pub likelihood: f64,
    pub exposure: f64,
}

/// Raw trial output: one total per trial, one occurrence count per risk.
#[derive(Debug, Clone, Default)]
pub struct TrialBatch {
    pub totals: Vec<f64>,
    pub occurrences: Vec<u64>,
}

impl TrialBatch {
    fn merge(&mut self, other: TrialBatch) {
        self.totals.extend(other.totals);
        if self.occurrences.is_empty() {
            self.occurrences = other.occurrences;
        } else {
            for (a, b) in self.occurrences.iter_mut().zip(other.occurrences) {
                *a += b;
            }
        }
    }
}

pub fn rng_for(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        // Distinct, well-separated streams per worker
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
        None => StdRng::from_entropy(),
    }
}

pub fn run_trials<R: Rng>(
    params: &[RiskParams],
    trials: usize,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> TrialBatch {
    let mut totals = Vec::with_capacity(trials);
    let mut occurrences = vec![0u64; params.len()];
    for trial in 0..trials {
        if trial % CANCEL_CHECK_INTERVAL == 0 {
            if let Some(flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
            }
        }
        let mut total = 0.0;
        for (i, p) in params.iter().enumerate() {
            let draw: f64 = rng.gen();
            if draw < p.likelihood {
                total += p.exposure;
                occurrences[i] += 1;
            }
        }
        totals.push(total);
    }
    TrialBatch {
        totals,
        occurrences,
    }
}

/// Linear-interpolated percentile of an ascending slice, `p` in [0, 1].
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = p.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

pub fn summarize(
    params: &[RiskParams],
    batch: TrialBatch,
    workers: usize,
) -> Result<SimulationResult, OperationalError> {
    let TrialBatch {
        mut totals,
        occurrences,
    } = batch;
    if totals.is_empty() {
        return Err(OperationalError::EmptyDistribution);
    }
    if totals.iter().any(|t| !t.is_finite()) {
        return Err(OperationalError::NonFinite {
            stage: "simulation totals",
        });
    }

    let n = totals.len() as f64;
    let mean = totals.iter().sum::<f64>() / n;
    let variance = totals.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;
    let loss_trials = totals.iter().filter(|t| **t > 0.0).count() as f64;

    totals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let occurrence_rates: BTreeMap<String, f64> = params
        .iter()
        .zip(&occurrences)
        .map(|(p, count)| (p.id.clone(), *count as f64 / n))
        .collect();

    Ok(SimulationResult {
        id: new_id(),
        timestamp: chrono::Utc::now(),
        risk_ids: params.iter().map(|p| p.id.clone()).collect(),
        trials: totals.len(),
        expected_value: mean,
        std_dev: variance.sqrt(),
        worst_case: totals[totals.len() - 1],
        best_case: totals[0],
        confidence_interval_95: (percentile(&totals, 0.025), percentile(&totals, 0.975)),
        probability_of_loss: loss_trials / n,
        occurrence_rates,
        workers,
        degraded: false,
        error: None,
    })
}

/// Split `trials` across `workers` blocking tasks, bounded by `timeout`.
pub async fn run_parallel(
    params: Arc<Vec<RiskParams>>,
    trials: usize,
    workers: usize,
    seed: Option<u64>,
    timeout: Duration,
) -> Result<TrialBatch, OperationalError> {
    let workers = workers.clamp(1, trials.max(1));
    let cancel = Arc::new(AtomicBool::new(false));
    let per_worker = trials / workers;
    let remainder = trials % workers;

    let mut handles = Vec::with_capacity(workers);
    for w in 0..workers {
        let share = per_worker + usize::from(w < remainder);
        let params = Arc::clone(&params);
        let cancel = Arc::clone(&cancel);
        handles.push(tokio::task::spawn_blocking(move || {
            let mut rng = rng_for(seed, w as u64);
            run_trials(&params, share, &mut rng, Some(&cancel))
        }));
    }

    let gather = async {
        let mut merged = TrialBatch::default();
        for handle in handles {
            let batch = handle
                .await
                .map_err(|e| OperationalError::TaskFailed(e.to_string()))?;
            merged.merge(batch);
        }
        Ok(merged)
    };

    match tokio::time::timeout(timeout, gather).await {
        Ok(result) => result,
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            Err(OperationalError::SimulationTimedOut {
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }
}
