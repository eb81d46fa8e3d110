//! JSON Snapshot Output
//!
//! A machine-readable dump of everything a finished (or quiesced) campaign
//! has measured: campaign metadata plus one record per
//! (test, runner, batch, repetition) carrying the raw samples or error tags,
//! unsummarized. Consumers re-derive whatever statistics they need.

use chrono::{DateTime, Utc};
use serde::Serialize;

use batchbench_core::ErrorTag;
use batchbench_engine::{DataCollector, ResultKey};
use batchbench_runners::{Approach, BenchmarkRunner};

use crate::row::ReportError;

/// Version of the snapshot schema.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Complete campaign snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignSnapshot {
    /// Campaign-level metadata.
    pub meta: SnapshotMeta,
    /// One record per (test, runner, batch, repetition).
    pub records: Vec<SnapshotRecord>,
}

/// Snapshot metadata.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotMeta {
    /// Snapshot schema version.
    pub schema_version: u32,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Batches fully finished at snapshot time.
    pub finished_batches: usize,
    /// Configured repetitions per batch.
    pub repetitions: usize,
    /// Configured runners, in order.
    pub runners: Vec<SnapshotRunner>,
}

/// One configured runner as echoed into the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRunner {
    /// Runner configuration name.
    pub name: String,
    /// Runner approach.
    pub approach: Approach,
}

/// Raw measurement record of one (test, runner, batch, repetition).
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotRecord {
    /// Fully qualified test class name.
    pub class: String,
    /// Test method name.
    pub test: String,
    /// Runner configuration name.
    pub config_name: String,
    /// Batch index.
    pub batch: usize,
    /// Repetition index.
    pub repetition: usize,
    /// Raw throughput samples; absent for errored measurements.
    pub samples: Option<Vec<f64>>,
    /// Error tags; absent for sampled measurements.
    pub errors: Option<Vec<ErrorTag>>,
}

/// Walk every finished batch and build the full snapshot.
pub fn build_snapshot<R: BenchmarkRunner>(
    collector: &DataCollector<R>,
) -> Result<CampaignSnapshot, ReportError> {
    let mut records = Vec::new();
    for batch in 0..collector.finished_batches() {
        let per_repetition = collector.collect_batch(batch)?;
        for test in &collector.batches()[batch].tests {
            for runner in collector.runners() {
                for (repetition, results) in per_repetition.iter().enumerate() {
                    let key = ResultKey {
                        test: test.clone(),
                        runner: runner.name().to_string(),
                    };
                    let result =
                        results.get(&key).ok_or_else(|| ReportError::MissingResult {
                            test: test.qualified_name(),
                            config_name: runner.name().to_string(),
                        })?;
                    records.push(SnapshotRecord {
                        class: test.class_name.clone(),
                        test: test.method_name.clone(),
                        config_name: runner.name().to_string(),
                        batch,
                        repetition,
                        samples: result.samples().map(|s| s.to_vec()),
                        errors: result.errors().map(|tags| tags.iter().copied().collect()),
                    });
                }
            }
        }
    }

    Ok(CampaignSnapshot {
        meta: SnapshotMeta {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            timestamp: Utc::now(),
            finished_batches: collector.finished_batches(),
            repetitions: collector.repetitions(),
            runners: collector
                .runners()
                .iter()
                .map(|runner| SnapshotRunner {
                    name: runner.name().to_string(),
                    approach: runner.approach(),
                })
                .collect(),
        },
        records,
    })
}

/// Generate the prettified JSON snapshot.
pub fn generate_json_snapshot(snapshot: &CampaignSnapshot) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    use batchbench_core::{plan_batches, CampaignLayout, Progress, ProgressStore, TestCase};
    use batchbench_runners::{GradleSettings, GradleTestRunner};

    fn fixture(dir: &Path) -> DataCollector<GradleTestRunner> {
        let layout = CampaignLayout::new(dir);
        ProgressStore::new(&layout)
            .save(&Progress { batch: 1, repetition: 0 })
            .unwrap();

        let artifacts = [
            (0, r#"[{"class": "com.example.Suite", "test": "testA", "test_durations": ["0.5"]}]"#),
            (1, r#"[{"class": "com.example.Suite", "test": "testA", "test_durations": ["FAILED"]}]"#),
        ];
        for (repetition, body) in artifacts {
            let rep_dir = layout.repetition_dir(0, repetition);
            fs::create_dir_all(&rep_dir).unwrap();
            fs::write(rep_dir.join("gradle_output.json"), body).unwrap();
        }

        let runner = GradleTestRunner::new(
            "gradle".to_string(),
            GradleSettings {
                project_root: dir.join("unused-project"),
                executions: 1,
            },
        );
        let tests = vec![TestCase::new("com.example.Suite", "testA")];
        DataCollector::open(layout, plan_batches(&tests, 1), 2, vec![runner]).unwrap()
    }

    #[test]
    fn test_snapshot_carries_raw_samples_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = build_snapshot(&fixture(dir.path())).unwrap();

        assert_eq!(snapshot.meta.schema_version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(snapshot.meta.finished_batches, 1);
        assert_eq!(snapshot.meta.repetitions, 2);
        assert_eq!(snapshot.meta.runners.len(), 1);
        assert_eq!(snapshot.meta.runners[0].name, "gradle");

        assert_eq!(snapshot.records.len(), 2);
        let first = &snapshot.records[0];
        assert_eq!((first.batch, first.repetition), (0, 0));
        assert_eq!(first.samples.as_deref(), Some(&[2.0][..]));
        assert!(first.errors.is_none());

        let second = &snapshot.records[1];
        assert_eq!((second.batch, second.repetition), (0, 1));
        assert!(second.samples.is_none());
        assert_eq!(second.errors.as_deref(), Some(&[ErrorTag::ExecutionFailed][..]));
    }

    #[test]
    fn test_snapshot_serializes_with_stable_labels() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = build_snapshot(&fixture(dir.path())).unwrap();
        let json = generate_json_snapshot(&snapshot).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["meta"]["schema_version"], 1);
        assert_eq!(value["meta"]["runners"][0]["approach"], "gradle-test");
        assert_eq!(value["records"][1]["errors"][0], "FAILED");
        assert!(value["records"][1]["samples"].is_null());
        assert_eq!(value["records"][0]["samples"][0], 2.0);
    }
}
