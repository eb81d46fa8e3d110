//! Throughput Statistics
//!
//! Descriptive statistics over one result's throughput samples. Sample
//! variance (n-1 denominator) throughout; the coefficient of variation is
//! additionally reported with the small-sample bias correction, which is what
//! downstream slowdown comparisons consume.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use batchbench_core::{ErrorTag, RawResult};

/// Errors from statistics computation.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Not enough samples: variance needs at least 2, got {0}")]
    NotEnoughSamples(usize),
}

/// Summary of one throughput sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThroughputStatistics {
    /// Number of samples summarized.
    pub measurements: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample variance.
    pub variance: f64,
    /// Sample standard deviation.
    pub std_dev: f64,
    /// Standard error of the mean.
    pub std_err: f64,
    /// Coefficient of variation.
    pub cv: f64,
    /// Bias-corrected coefficient of variation.
    pub cv_est: f64,
}

/// Summarize a sample sequence.
///
/// Fewer than two samples is a caller contract violation: variance is
/// undefined, and every in-contract result carries at least one sample per
/// repetition with at least two repetitions merged, or multiple executions.
pub fn summarize(samples: &[f64]) -> Result<ThroughputStatistics, StatsError> {
    if samples.len() < 2 {
        return Err(StatsError::NotEnoughSamples(samples.len()));
    }
    let n = samples.len();
    let mean = samples.iter().sum::<f64>() / n as f64;
    let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std_dev = variance.sqrt();
    let std_err = std_dev / (n as f64).sqrt();
    let cv = std_dev / mean;
    // Unbiased estimator for normally distributed data.
    let cv_est = (1.0 + 1.0 / (4.0 * n as f64)) * cv;

    Ok(ThroughputStatistics {
        measurements: n,
        mean,
        variance,
        std_dev,
        std_err,
        cv,
        cv_est,
    })
}

/// Statistics view over one raw result: a summary for sampled results, the
/// carried error tags for errored ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResultStatistics {
    /// Summarized throughput samples.
    Summary(ThroughputStatistics),
    /// Error tags passed through from the measurement.
    Errors(BTreeSet<ErrorTag>),
}

impl ResultStatistics {
    /// Compute the view for `result`.
    pub fn of(result: &RawResult) -> Result<ResultStatistics, StatsError> {
        match result {
            RawResult::Samples(samples) => Ok(ResultStatistics::Summary(summarize(samples)?)),
            RawResult::Errors(errors) => Ok(ResultStatistics::Errors(errors.clone())),
        }
    }

    /// The summary, if this result was sampled.
    pub fn summary(&self) -> Option<&ThroughputStatistics> {
        match self {
            ResultStatistics::Summary(summary) => Some(summary),
            ResultStatistics::Errors(_) => None,
        }
    }

    /// The error tags, if this result was errored.
    pub fn errors(&self) -> Option<&BTreeSet<ErrorTag>> {
        match self {
            ResultStatistics::Summary(_) => None,
            ResultStatistics::Errors(errors) => Some(errors),
        }
    }
}
