//! Result Row Flattening
//!
//! Turns collected campaign data into flat export records, one per
//! (test, runner, batch[, repetition]) combination. Row order is the stable
//! export contract: batches ascending, tests in batch order, runners in
//! configured order, repetitions ascending.
//!
//! Statistics are computed per row with Rayon; rows are independent.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use batchbench_core::{ErrorTag, RawResult, TestCase};
use batchbench_engine::{CollectorError, DataCollector, ResultKey};
use batchbench_runners::{Approach, BenchmarkRunner};
use batchbench_stats::{ResultStatistics, StatsError, ThroughputStatistics};

/// Errors from flattening collected data into rows.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Collection failed: {0}")]
    Collect(#[from] CollectorError),

    #[error("No result for {test} under runner {config_name}")]
    MissingResult { test: String, config_name: String },

    #[error("Statistics for {test} under runner {config_name}: {source}")]
    Stats {
        test: String,
        config_name: String,
        #[source]
        source: StatsError,
    },
}

/// One flattened export record.
///
/// Exactly one of `errors` (non-empty) and `statistics` is populated; an
/// errored measurement has no statistics and a sampled one has no error tags.
#[derive(Debug, Clone, Serialize)]
pub struct ResultRow {
    /// Fully qualified test class name.
    pub class: String,
    /// Test method name.
    pub test: String,
    /// Runner configuration name.
    pub config_name: String,
    /// Runner approach.
    pub approach: Approach,
    /// Batch index.
    pub batch: usize,
    /// Repetition index; absent when repetitions were merged.
    pub repetition: Option<usize>,
    /// Error tags observed, empty for sampled results.
    pub errors: Vec<ErrorTag>,
    /// Throughput statistics, absent for errored results.
    pub statistics: Option<ThroughputStatistics>,
}

impl ResultRow {
    /// The stable error cell text: tags sorted and comma-joined, empty for
    /// sampled rows.
    pub fn error_text(&self) -> String {
        let labels: Vec<String> = self.errors.iter().map(|tag| tag.to_string()).collect();
        labels.join(",")
    }
}

struct RowSeed {
    test: TestCase,
    config_name: String,
    approach: Approach,
    batch: usize,
    repetition: Option<usize>,
    result: RawResult,
}

/// Build the export rows of one finished batch.
///
/// With `combine_repetitions` the batch's repetitions are merged per
/// (test, runner) before summarizing and the rows carry no repetition index;
/// without it every repetition is summarized on its own.
pub fn batch_rows<R: BenchmarkRunner>(
    collector: &DataCollector<R>,
    batch: usize,
    combine_repetitions: bool,
) -> Result<Vec<ResultRow>, ReportError> {
    let mut seeds = Vec::new();
    if combine_repetitions {
        let merged = collector.collect_batch_merged(batch)?;
        for test in &collector.batches()[batch].tests {
            for runner in collector.runners() {
                seeds.push(seed_for(test, runner, batch, None, &merged)?);
            }
        }
    } else {
        let per_repetition = collector.collect_batch(batch)?;
        for test in &collector.batches()[batch].tests {
            for runner in collector.runners() {
                for (repetition, results) in per_repetition.iter().enumerate() {
                    seeds.push(seed_for(test, runner, batch, Some(repetition), results)?);
                }
            }
        }
    }
    compute_rows(seeds)
}

fn seed_for<R: BenchmarkRunner>(
    test: &TestCase,
    runner: &R,
    batch: usize,
    repetition: Option<usize>,
    results: &BTreeMap<ResultKey, RawResult>,
) -> Result<RowSeed, ReportError> {
    let key = ResultKey {
        test: test.clone(),
        runner: runner.name().to_string(),
    };
    let result = results.get(&key).ok_or_else(|| ReportError::MissingResult {
        test: test.qualified_name(),
        config_name: runner.name().to_string(),
    })?;
    Ok(RowSeed {
        test: test.clone(),
        config_name: runner.name().to_string(),
        approach: runner.approach(),
        batch,
        repetition,
        result: result.clone(),
    })
}

fn compute_rows(seeds: Vec<RowSeed>) -> Result<Vec<ResultRow>, ReportError> {
    seeds
        .into_par_iter()
        .map(|seed| {
            let statistics =
                ResultStatistics::of(&seed.result).map_err(|source| ReportError::Stats {
                    test: seed.test.qualified_name(),
                    config_name: seed.config_name.clone(),
                    source,
                })?;
            let (errors, summary) = match statistics {
                ResultStatistics::Summary(summary) => (Vec::new(), Some(summary)),
                ResultStatistics::Errors(tags) => (tags.into_iter().collect(), None),
            };
            Ok(ResultRow {
                class: seed.test.class_name,
                test: seed.test.method_name,
                config_name: seed.config_name,
                approach: seed.approach,
                batch: seed.batch,
                repetition: seed.repetition,
                errors,
                statistics: summary,
            })
        })
        .collect()
}
