//! JMH Benchmark Runner
//!
//! Measures tests that have been wrapped into JMH benchmarks, one `java -jar`
//! invocation per test. The two wrapper flavors generate different benchmark
//! class names, so each flavor derives its own selection regex; everything
//! else (flags, artifact layout, report decoding) is shared.
//!
//! Artifacts live at `<name>/<class>/<test>/output.json` inside the
//! repetition directory, in JMH's JSON report format. The read side keeps the
//! per-fork sample arrays of `primaryMetric.rawData`, flattened in fork
//! order. JMH leaves an empty report behind when a run fails; an empty,
//! missing, or undecodable report is therefore a failed execution, not a
//! collection error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fxhash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use batchbench_core::{ErrorTag, RawResult, TestCase};

use crate::config::{Approach, JmhSettings};
use crate::runner::{BenchmarkRunner, CollectError, RunnerError};

/// How the wrapper generator names the benchmark for a given test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePattern {
    /// ju2jmh: `<class>._Benchmark.benchmark_<test>`, with an optional
    /// numeric suffix on the nested class when one source class produced
    /// several benchmark classes.
    Ju2Jmh,
    /// ju4runner: `<class>_JU4Benchmark.benchmark_<test>`.
    Ju4Runner,
}

impl NamePattern {
    /// Anchored regex selecting exactly the benchmark wrapping `test`.
    pub fn benchmark_pattern(&self, test: &TestCase) -> String {
        match self {
            NamePattern::Ju2Jmh => {
                let mut pattern = regex::escape(&test.class_name);
                pattern.push_str(&regex::escape("._Benchmark"));
                pattern.push_str(r"(?:_\d+)?");
                pattern.push_str(&regex::escape(".benchmark_"));
                pattern.push_str(&regex::escape(&test.method_name));
                format!("^{pattern}$")
            }
            NamePattern::Ju4Runner => {
                let name = format!(
                    "{}_JU4Benchmark.benchmark_{}",
                    test.class_name, test.method_name
                );
                format!("^{}$", regex::escape(&name))
            }
        }
    }

    fn approach(&self) -> Approach {
        match self {
            NamePattern::Ju2Jmh => Approach::Ju2jmh,
            NamePattern::Ju4Runner => Approach::Ju4runner,
        }
    }
}

/// Top-level entry of a JMH JSON report.
#[derive(Debug, Deserialize)]
struct JmhBenchmarkReport {
    #[serde(rename = "primaryMetric")]
    primary_metric: JmhPrimaryMetric,
}

#[derive(Debug, Deserialize)]
struct JmhPrimaryMetric {
    /// One inner array of samples per fork.
    #[serde(rename = "rawData")]
    raw_data: Vec<Vec<f64>>,
}

/// Runs wrapped benchmarks through a JMH jar, one invocation per test.
#[derive(Debug)]
pub struct JmhRunner {
    name: String,
    settings: JmhSettings,
    pattern: NamePattern,
}

impl JmhRunner {
    /// Runner named `name` executing the configured jar with the given
    /// wrapper flavor.
    pub fn new(name: String, settings: JmhSettings, pattern: NamePattern) -> Self {
        Self {
            name,
            settings,
            pattern,
        }
    }

    fn benchmark_output_file(&self, repetition_dir: &Path, test: &TestCase) -> PathBuf {
        repetition_dir
            .join(&self.name)
            .join(&test.class_name)
            .join(&test.method_name)
            .join("output.json")
    }

    /// Decode one benchmark's report into samples or a failure tag.
    fn collect_benchmark(&self, test: &TestCase, repetition_dir: &Path) -> RawResult {
        let output_file = self.benchmark_output_file(repetition_dir, test);
        let body = match fs::read_to_string(&output_file) {
            Ok(body) => body,
            Err(_) => return RawResult::from_error(ErrorTag::ExecutionFailed),
        };
        if body.trim().is_empty() {
            return RawResult::from_error(ErrorTag::ExecutionFailed);
        }
        let reports: Vec<JmhBenchmarkReport> = match serde_json::from_str(&body) {
            Ok(reports) => reports,
            Err(_) => return RawResult::from_error(ErrorTag::ExecutionFailed),
        };
        let samples: Vec<f64> = match reports.into_iter().next() {
            Some(report) => report.primary_metric.raw_data.into_iter().flatten().collect(),
            None => return RawResult::from_error(ErrorTag::ExecutionFailed),
        };
        if samples.is_empty() {
            return RawResult::from_error(ErrorTag::ExecutionFailed);
        }
        RawResult::from_samples(samples)
    }
}

impl BenchmarkRunner for JmhRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn approach(&self) -> Approach {
        self.pattern.approach()
    }

    fn run_batch(&self, tests: &[TestCase], repetition_dir: &Path) -> Result<(), RunnerError> {
        for (index, test) in tests.iter().enumerate() {
            debug!(
                "[{}] benchmark {}/{}: {}",
                self.name,
                index + 1,
                tests.len(),
                test
            );
            let output_file = self.benchmark_output_file(repetition_dir, test);
            if let Some(parent) = output_file.parent() {
                fs::create_dir_all(parent).map_err(|source| RunnerError::ArtifactIo {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            let args = benchmark_args(
                &self.settings,
                &output_file,
                &self.pattern.benchmark_pattern(test),
            );
            let status = Command::new("java")
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|source| RunnerError::LaunchFailed {
                    command: "java".to_string(),
                    source,
                })?;
            if !status.success() {
                // The report file stays empty on failure; collection turns
                // that into a FAILED result for this test.
                debug!("[{}] java exited with {}", self.name, status);
            }
        }
        Ok(())
    }

    fn collect_repetition(
        &self,
        tests: &[TestCase],
        repetition_dir: &Path,
    ) -> Result<FxHashMap<TestCase, RawResult>, CollectError> {
        let mut results = FxHashMap::default();
        for test in tests {
            results.insert(test.clone(), self.collect_benchmark(test, repetition_dir));
        }
        Ok(results)
    }
}

/// Argument list of one JMH invocation.
fn benchmark_args(settings: &JmhSettings, output_file: &Path, pattern: &str) -> Vec<String> {
    let time = format!("{}ms", settings.time_ms);
    vec![
        "-jar".to_string(),
        settings.jar.display().to_string(),
        "-f".to_string(),
        settings.forks.to_string(),
        "-w".to_string(),
        time.clone(),
        "-r".to_string(),
        time,
        "-foe".to_string(),
        "true".to_string(),
        "-rf".to_string(),
        "json".to_string(),
        "-rff".to_string(),
        output_file.display().to_string(),
        pattern.to_string(),
    ]
}
