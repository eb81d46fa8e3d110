#![warn(missing_docs)]
//! BatchBench Statistics
//!
//! Descriptive statistics over campaign throughput results:
//! - `summarize`: mean, sample variance, stddev, stderr, and both plain and
//!   bias-corrected coefficients of variation
//! - `ResultStatistics`: the per-result view, carrying error tags through
//!   for results that produced no samples

mod summary;

pub use summary::{ResultStatistics, StatsError, ThroughputStatistics, summarize};
