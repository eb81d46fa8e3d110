//! Campaign Data Collection
//!
//! The read side of a campaign directory. A collector is opened against the
//! same configuration the campaign ran with; the checkpoint is read once, and
//! only batches strictly below its batch counter are served. Artifacts of the
//! step currently in flight are never exposed, so everything a collector
//! returns came from a fully completed, checkpointed step.
//!
//! Results come back keyed by (test, runner name), either per repetition or
//! merged across all repetitions of a batch.

use std::collections::BTreeMap;

use thiserror::Error;

use batchbench_core::{CampaignLayout, ProgressError, ProgressStore, RawResult, TestBatch, TestCase};
use batchbench_runners::{BenchmarkRunner, CollectError};

/// Identifies one measured combination: a test under a named runner.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResultKey {
    /// The measured test.
    pub test: TestCase,
    /// Name of the runner configuration that produced the measurement.
    pub runner: String,
}

/// Errors from querying a campaign directory.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Batch index out of range; expected 0..{finished}, but was {requested}")]
    BatchOutOfRange { requested: usize, finished: usize },

    #[error("Repetition index out of range; expected 0..{repetitions}, but was {requested}")]
    RepetitionOutOfRange {
        requested: usize,
        repetitions: usize,
    },

    #[error("Cannot read campaign checkpoint: {0}")]
    Checkpoint(#[from] ProgressError),

    #[error("Runner {runner}: {source}")]
    Collect {
        runner: String,
        #[source]
        source: CollectError,
    },
}

/// Read-side view of one campaign output directory.
pub struct DataCollector<R: BenchmarkRunner> {
    layout: CampaignLayout,
    batches: Vec<TestBatch>,
    repetitions: usize,
    runners: Vec<R>,
    finished_batches: usize,
}

impl<R: BenchmarkRunner> DataCollector<R> {
    /// Open the campaign directory for reading.
    ///
    /// Reads the checkpoint once to pin the set of finished batches; a
    /// campaign advancing concurrently does not grow the view. The batches,
    /// repetition count and runners must be the ones the campaign ran with,
    /// artifact locations are derived from them.
    pub fn open(
        layout: CampaignLayout,
        batches: Vec<TestBatch>,
        repetitions: usize,
        runners: Vec<R>,
    ) -> Result<Self, CollectorError> {
        assert!(repetitions > 0, "a campaign has at least one repetition");
        let finished_batches = ProgressStore::new(&layout).peek()?.batch;
        Ok(Self {
            layout,
            batches,
            repetitions,
            runners,
            finished_batches,
        })
    }

    /// Number of batches whose every repetition is checkpointed as done.
    pub fn finished_batches(&self) -> usize {
        self.finished_batches
    }

    /// Repetitions per batch the campaign was configured with.
    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// The campaign's batch plan.
    pub fn batches(&self) -> &[TestBatch] {
        &self.batches
    }

    /// The runners, in configured order.
    pub fn runners(&self) -> &[R] {
        &self.runners
    }

    /// Results of one (batch, repetition) step, every test under every runner.
    pub fn collect_repetition(
        &self,
        batch: usize,
        repetition: usize,
    ) -> Result<BTreeMap<ResultKey, RawResult>, CollectorError> {
        if batch >= self.finished_batches {
            return Err(CollectorError::BatchOutOfRange {
                requested: batch,
                finished: self.finished_batches,
            });
        }
        if repetition >= self.repetitions {
            return Err(CollectorError::RepetitionOutOfRange {
                requested: repetition,
                repetitions: self.repetitions,
            });
        }

        let tests = &self.batches[batch].tests;
        let repetition_dir = self.layout.repetition_dir(batch, repetition);
        let mut results = BTreeMap::new();
        for runner in &self.runners {
            let runner_results = runner
                .collect_repetition(tests, &repetition_dir)
                .map_err(|source| CollectorError::Collect {
                    runner: runner.name().to_string(),
                    source,
                })?;
            for (test, result) in runner_results {
                results.insert(
                    ResultKey {
                        test,
                        runner: runner.name().to_string(),
                    },
                    result,
                );
            }
        }
        Ok(results)
    }

    /// Results of every repetition of one batch, indexed by repetition.
    pub fn collect_batch(
        &self,
        batch: usize,
    ) -> Result<Vec<BTreeMap<ResultKey, RawResult>>, CollectorError> {
        (0..self.repetitions)
            .map(|repetition| self.collect_repetition(batch, repetition))
            .collect()
    }

    /// Results of one batch with each key's repetitions merged into a single
    /// result, per [`RawResult::merge_repetitions`].
    pub fn collect_batch_merged(
        &self,
        batch: usize,
    ) -> Result<BTreeMap<ResultKey, RawResult>, CollectorError> {
        let per_repetition = self.collect_batch(batch)?;
        let mut gathered: BTreeMap<ResultKey, Vec<RawResult>> = BTreeMap::new();
        for repetition_results in per_repetition {
            for (key, result) in repetition_results {
                gathered.entry(key).or_default().push(result);
            }
        }
        Ok(gathered
            .into_iter()
            .map(|(key, results)| (key, RawResult::merge_repetitions(&results)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use fxhash::FxHashMap;
    use batchbench_core::{plan_batches, ErrorTag, Progress};
    use batchbench_runners::{Approach, RunnerError};

    /// Produces synthetic samples encoding (batch, repetition) without
    /// touching the filesystem; coordinates are recovered from the
    /// `b<n>/r<n>` directory it is pointed at.
    struct StubRunner {
        name: String,
        error_on: Option<(String, usize)>,
        broken: bool,
    }

    impl StubRunner {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                error_on: None,
                broken: false,
            }
        }

        fn erroring_on(name: &str, method: &str, repetition: usize) -> Self {
            Self {
                error_on: Some((method.to_string(), repetition)),
                ..Self::new(name)
            }
        }

        fn broken(name: &str) -> Self {
            Self {
                broken: true,
                ..Self::new(name)
            }
        }
    }

    fn step_coords(repetition_dir: &Path) -> (usize, usize) {
        let rep = repetition_dir.file_name().unwrap().to_string_lossy();
        let batch = repetition_dir
            .parent()
            .unwrap()
            .file_name()
            .unwrap()
            .to_string_lossy();
        (
            batch.trim_start_matches('b').parse().unwrap(),
            rep.trim_start_matches('r').parse().unwrap(),
        )
    }

    impl BenchmarkRunner for StubRunner {
        fn name(&self) -> &str {
            &self.name
        }

        fn approach(&self) -> Approach {
            Approach::GradleTest
        }

        fn run_batch(&self, _tests: &[TestCase], _dir: &Path) -> Result<(), RunnerError> {
            Ok(())
        }

        fn collect_repetition(
            &self,
            tests: &[TestCase],
            repetition_dir: &Path,
        ) -> Result<FxHashMap<TestCase, RawResult>, CollectError> {
            if self.broken {
                return Err(CollectError::ArtifactIo {
                    path: repetition_dir.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "injected"),
                });
            }
            let (batch, repetition) = step_coords(repetition_dir);
            let mut out = FxHashMap::default();
            for test in tests {
                let result = match &self.error_on {
                    Some((method, rep)) if *method == test.method_name && *rep == repetition => {
                        RawResult::from_error(ErrorTag::ExecutionFailed)
                    }
                    _ => RawResult::from_samples(vec![(batch * 100 + repetition) as f64]),
                };
                out.insert(test.clone(), result);
            }
            Ok(out)
        }
    }

    fn dummy_tests(n: usize) -> Vec<TestCase> {
        (0..n)
            .map(|i| TestCase::new("com.example.Suite", format!("test{i}")))
            .collect()
    }

    fn checkpointed_layout(dir: &Path, finished_batches: usize) -> CampaignLayout {
        let layout = CampaignLayout::new(dir);
        ProgressStore::new(&layout)
            .save(&Progress {
                batch: finished_batches,
                repetition: 0,
            })
            .unwrap();
        layout
    }

    #[test]
    fn test_open_without_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DataCollector::open(
            CampaignLayout::new(dir.path()),
            plan_batches(&dummy_tests(2), 2),
            2,
            vec![StubRunner::new("stub")],
        );
        assert!(matches!(result, Err(CollectorError::Checkpoint(_))));
    }

    #[test]
    fn test_out_of_range_queries_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        // Checkpoint mid-campaign: batch 1 is in flight, only batch 0 done.
        let layout = CampaignLayout::new(dir.path());
        ProgressStore::new(&layout)
            .save(&Progress { batch: 1, repetition: 1 })
            .unwrap();
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(4), 2),
            2,
            vec![StubRunner::new("stub")],
        )
        .unwrap();

        assert_eq!(collector.finished_batches(), 1);
        assert!(matches!(
            collector.collect_repetition(1, 0),
            Err(CollectorError::BatchOutOfRange { requested: 1, finished: 1 })
        ));
        assert!(matches!(
            collector.collect_repetition(0, 2),
            Err(CollectorError::RepetitionOutOfRange { requested: 2, repetitions: 2 })
        ));
        assert!(collector.collect_repetition(0, 1).is_ok());
    }

    #[test]
    fn test_repetition_results_cover_every_test_and_runner() {
        let dir = tempfile::tempdir().unwrap();
        let layout = checkpointed_layout(dir.path(), 2);
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(4), 2),
            2,
            vec![StubRunner::new("first"), StubRunner::new("second")],
        )
        .unwrap();

        let results = collector.collect_repetition(1, 1).unwrap();
        assert_eq!(results.len(), 2 * 2); // 2 tests in batch 1, 2 runners
        let key = ResultKey {
            test: TestCase::new("com.example.Suite", "test2"),
            runner: "second".to_string(),
        };
        assert_eq!(results[&key].samples(), Some(&[101.0][..]));
    }

    #[test]
    fn test_merged_batch_concatenates_repetitions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let layout = checkpointed_layout(dir.path(), 1);
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(2), 2),
            3,
            vec![StubRunner::new("stub")],
        )
        .unwrap();

        let merged = collector.collect_batch_merged(0).unwrap();
        assert_eq!(merged.len(), 2);
        for result in merged.values() {
            assert_eq!(result.samples(), Some(&[0.0, 1.0, 2.0][..]));
        }
    }

    #[test]
    fn test_merged_batch_short_circuits_on_any_errored_repetition() {
        let dir = tempfile::tempdir().unwrap();
        let layout = checkpointed_layout(dir.path(), 1);
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(2), 2),
            2,
            vec![StubRunner::erroring_on("stub", "test1", 1)],
        )
        .unwrap();

        let merged = collector.collect_batch_merged(0).unwrap();
        let errored = &merged[&ResultKey {
            test: TestCase::new("com.example.Suite", "test1"),
            runner: "stub".to_string(),
        }];
        assert!(errored.is_errored());
        let clean = &merged[&ResultKey {
            test: TestCase::new("com.example.Suite", "test0"),
            runner: "stub".to_string(),
        }];
        assert_eq!(clean.samples(), Some(&[0.0, 1.0][..]));
    }

    #[test]
    fn test_per_repetition_batch_keeps_repetitions_apart() {
        let dir = tempfile::tempdir().unwrap();
        let layout = checkpointed_layout(dir.path(), 1);
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(1), 1),
            2,
            vec![StubRunner::new("stub")],
        )
        .unwrap();

        let per_repetition = collector.collect_batch(0).unwrap();
        assert_eq!(per_repetition.len(), 2);
        let key = ResultKey {
            test: TestCase::new("com.example.Suite", "test0"),
            runner: "stub".to_string(),
        };
        assert_eq!(per_repetition[0][&key].samples(), Some(&[0.0][..]));
        assert_eq!(per_repetition[1][&key].samples(), Some(&[1.0][..]));
    }

    #[test]
    fn test_collect_failure_names_the_runner() {
        let dir = tempfile::tempdir().unwrap();
        let layout = checkpointed_layout(dir.path(), 1);
        let collector = DataCollector::open(
            layout,
            plan_batches(&dummy_tests(1), 1),
            1,
            vec![StubRunner::broken("unreadable")],
        )
        .unwrap();

        let err = collector.collect_repetition(0, 0).unwrap_err();
        match err {
            CollectorError::Collect { runner, .. } => assert_eq!(runner, "unreadable"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
