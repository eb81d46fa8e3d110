//! Runner Seam
//!
//! `BenchmarkRunner` is the adapter contract between the campaign engine and
//! the external benchmarking tools. Each runner owns both directions for its
//! approach: executing a batch into a repetition directory, and reading that
//! directory's artifacts back into raw results.
//!
//! Tool-reported failures are data, not errors: they surface as `ErrorTag`s
//! inside `RawResult`. `RunnerError` is reserved for infrastructure failure
//! (the tool could not be launched, an artifact could not be written) and is
//! fatal for the step in flight; `CollectError` marks a campaign directory
//! whose layout does not match the configuration.

use std::path::{Path, PathBuf};

use fxhash::FxHashMap;
use thiserror::Error;

use batchbench_core::{RawResult, TestCase};

use crate::config::{Approach, ApproachSettings, RunnerConfig};
use crate::gradle::GradleTestRunner;
use crate::jmh::{JmhRunner, NamePattern};

/// Infrastructure failure while executing a batch.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to launch {command}: {source}")]
    LaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact I/O failed at {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Layout-level failure while reading a repetition's artifacts back.
///
/// These mark a directory that does not match the campaign configuration and
/// are distinct from per-test measurement errors, which are carried as data.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Runner artifact unreadable at {path}: {source}")]
    ArtifactIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed runner artifact {path}: {reason}")]
    MalformedArtifact { path: PathBuf, reason: String },

    #[error("No record for test {test} in {path}")]
    MissingRecord { test: String, path: PathBuf },
}

/// Adapter contract for one configured benchmark runner.
pub trait BenchmarkRunner {
    /// Campaign-unique runner name; namespaces this runner's artifacts inside
    /// every repetition directory.
    fn name(&self) -> &str;

    /// The execution approach this runner embodies.
    fn approach(&self) -> Approach;

    /// Execute one batch, writing all artifacts into `repetition_dir`.
    ///
    /// The engine hands every runner a freshly created directory; adapters
    /// may assume their artifact paths do not exist yet.
    fn run_batch(&self, tests: &[TestCase], repetition_dir: &Path) -> Result<(), RunnerError>;

    /// Read one repetition's artifacts back into per-test results.
    ///
    /// Returns a result for every test in `tests`; a test whose artifact
    /// records a tool failure yields an errored `RawResult`, not an `Err`.
    fn collect_repetition(
        &self,
        tests: &[TestCase],
        repetition_dir: &Path,
    ) -> Result<FxHashMap<TestCase, RawResult>, CollectError>;
}

/// The configured runner kinds, dispatched statically.
#[derive(Debug)]
pub enum Runner {
    /// Plain Gradle test execution.
    Gradle(GradleTestRunner),
    /// JMH execution, either wrapper flavor.
    Jmh(JmhRunner),
}

impl Runner {
    /// Build the runner described by `config`.
    pub fn from_config(config: &RunnerConfig) -> Runner {
        match &config.settings {
            ApproachSettings::GradleTest(settings) => {
                Runner::Gradle(GradleTestRunner::new(config.name.clone(), settings.clone()))
            }
            ApproachSettings::Ju2jmh(settings) => Runner::Jmh(JmhRunner::new(
                config.name.clone(),
                settings.clone(),
                NamePattern::Ju2Jmh,
            )),
            ApproachSettings::Ju4runner(settings) => Runner::Jmh(JmhRunner::new(
                config.name.clone(),
                settings.clone(),
                NamePattern::Ju4Runner,
            )),
        }
    }
}

impl BenchmarkRunner for Runner {
    fn name(&self) -> &str {
        match self {
            Runner::Gradle(r) => r.name(),
            Runner::Jmh(r) => r.name(),
        }
    }

    fn approach(&self) -> Approach {
        match self {
            Runner::Gradle(r) => r.approach(),
            Runner::Jmh(r) => r.approach(),
        }
    }

    fn run_batch(&self, tests: &[TestCase], repetition_dir: &Path) -> Result<(), RunnerError> {
        match self {
            Runner::Gradle(r) => r.run_batch(tests, repetition_dir),
            Runner::Jmh(r) => r.run_batch(tests, repetition_dir),
        }
    }

    fn collect_repetition(
        &self,
        tests: &[TestCase],
        repetition_dir: &Path,
    ) -> Result<FxHashMap<TestCase, RawResult>, CollectError> {
        match self {
            Runner::Gradle(r) => r.collect_repetition(tests, repetition_dir),
            Runner::Jmh(r) => r.collect_repetition(tests, repetition_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GradleSettings, JmhSettings};

    #[test]
    fn test_runner_construction_matches_approach() {
        let gradle = Runner::from_config(&RunnerConfig {
            name: "baseline".to_string(),
            settings: ApproachSettings::GradleTest(GradleSettings {
                project_root: "/work/project".into(),
                executions: 3,
            }),
        });
        assert_eq!(gradle.name(), "baseline");
        assert_eq!(gradle.approach(), Approach::GradleTest);

        let jmh = Runner::from_config(&RunnerConfig {
            name: "wrapped".to_string(),
            settings: ApproachSettings::Ju4runner(JmhSettings {
                jar: "bench.jar".into(),
                forks: 2,
                time_ms: 500,
            }),
        });
        assert_eq!(jmh.name(), "wrapped");
        assert_eq!(jmh.approach(), Approach::Ju4runner);
    }
}
