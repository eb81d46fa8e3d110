//! Gradle Test Runner
//!
//! Measures tests by running them through the project's Gradle build and
//! reading the per-class XML test reports Gradle writes under
//! `build/test-results/test/`. One repetition runs the whole batch
//! `executions` times; each execution contributes one duration per test.
//!
//! The per-repetition artifact is `<name>_output.json`:
//!
//! ```text
//! [{"class": "...", "test": "...", "test_durations": ["0.012", "FAILED", ...]}]
//! ```
//!
//! Durations are kept verbatim as Gradle reported them; a failed, missing, or
//! unreadable report entry becomes the `FAILED` sentinel. The read side turns
//! duration strings into throughput samples (`1/duration`) or error tags.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use fxhash::FxHashMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::{Deserialize, Serialize};
use tracing::debug;

use batchbench_core::{ErrorTag, RawResult, TestCase};

use crate::config::{Approach, GradleSettings};
use crate::runner::{BenchmarkRunner, CollectError, RunnerError};

/// Sentinel recorded in place of a duration when an execution failed.
pub const FAILED_DURATION: &str = "FAILED";

/// One test's entry in a `<name>_output.json` artifact.
#[derive(Debug, Serialize, Deserialize)]
struct GradleTestRecord {
    #[serde(flatten)]
    case: TestCase,
    test_durations: Vec<String>,
}

/// Runs batches through `./gradlew test` and times them from the XML reports.
#[derive(Debug)]
pub struct GradleTestRunner {
    name: String,
    settings: GradleSettings,
}

impl GradleTestRunner {
    /// Runner named `name` operating on the configured Gradle project.
    pub fn new(name: String, settings: GradleSettings) -> Self {
        Self { name, settings }
    }

    fn gradlew_path(&self) -> PathBuf {
        let script = if cfg!(windows) { "gradlew.bat" } else { "gradlew" };
        self.settings.project_root.join(script)
    }

    fn test_results_dir(&self) -> PathBuf {
        self.settings
            .project_root
            .join("build")
            .join("test-results")
            .join("test")
    }

    fn build_tmp_dir(&self) -> PathBuf {
        self.settings.project_root.join("build").join("tmp").join("test")
    }

    fn output_file(&self, repetition_dir: &Path) -> PathBuf {
        repetition_dir.join(format!("{}_output.json", self.name))
    }

    /// Duration string for one test in the current XML reports, or the
    /// `FAILED` sentinel when the report is missing, unreadable, or marks the
    /// test as failed.
    fn read_test_duration(&self, test: &TestCase) -> String {
        let report = self
            .test_results_dir()
            .join(format!("TEST-{}.xml", test.class_name));
        match fs::read_to_string(&report) {
            Ok(content) => parse_testcase_time(&content, &test.method_name)
                .unwrap_or_else(|| FAILED_DURATION.to_string()),
            Err(_) => FAILED_DURATION.to_string(),
        }
    }
}

impl BenchmarkRunner for GradleTestRunner {
    fn name(&self) -> &str {
        &self.name
    }

    fn approach(&self) -> Approach {
        Approach::GradleTest
    }

    fn run_batch(&self, tests: &[TestCase], repetition_dir: &Path) -> Result<(), RunnerError> {
        let mut durations: Vec<Vec<String>> = vec![Vec::new(); tests.len()];
        let gradlew = self.gradlew_path();
        let args = test_task_args(tests);

        for execution in 0..self.settings.executions {
            debug!(
                "[{}] gradlew test, execution {}/{}",
                self.name,
                execution + 1,
                self.settings.executions
            );
            let status = Command::new(&gradlew)
                .args(&args)
                .current_dir(&self.settings.project_root)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .map_err(|source| RunnerError::LaunchFailed {
                    command: gradlew.display().to_string(),
                    source,
                })?;
            if !status.success() {
                // Failing tests fail the build; the per-test truth is in the
                // XML reports read next.
                debug!("[{}] gradlew exited with {}", self.name, status);
            }
            for (test, recorded) in tests.iter().zip(durations.iter_mut()) {
                recorded.push(self.read_test_duration(test));
            }
        }

        // build/tmp/test grows with every execution; clear it so a long
        // campaign does not fill the disk.
        let tmp_dir = self.build_tmp_dir();
        if tmp_dir.exists() {
            fs::remove_dir_all(&tmp_dir).map_err(|source| RunnerError::ArtifactIo {
                path: tmp_dir.clone(),
                source,
            })?;
        }

        let records: Vec<GradleTestRecord> = tests
            .iter()
            .zip(durations)
            .map(|(test, test_durations)| GradleTestRecord {
                case: test.clone(),
                test_durations,
            })
            .collect();
        let output_file = self.output_file(repetition_dir);
        let body =
            serde_json::to_string_pretty(&records).map_err(|source| RunnerError::ArtifactIo {
                path: output_file.clone(),
                source: source.into(),
            })?;
        fs::write(&output_file, body).map_err(|source| RunnerError::ArtifactIo {
            path: output_file.clone(),
            source,
        })?;
        Ok(())
    }

    fn collect_repetition(
        &self,
        tests: &[TestCase],
        repetition_dir: &Path,
    ) -> Result<FxHashMap<TestCase, RawResult>, CollectError> {
        let output_file = self.output_file(repetition_dir);
        let body = fs::read_to_string(&output_file).map_err(|source| CollectError::ArtifactIo {
            path: output_file.clone(),
            source,
        })?;
        let records: Vec<GradleTestRecord> =
            serde_json::from_str(&body).map_err(|source| CollectError::MalformedArtifact {
                path: output_file.clone(),
                reason: source.to_string(),
            })?;
        let durations: FxHashMap<TestCase, Vec<String>> = records
            .into_iter()
            .map(|record| (record.case, record.test_durations))
            .collect();

        let mut results = FxHashMap::default();
        for test in tests {
            let recorded = durations
                .get(test)
                .ok_or_else(|| CollectError::MissingRecord {
                    test: test.qualified_name(),
                    path: output_file.clone(),
                })?;
            results.insert(test.clone(), durations_to_result(recorded));
        }
        Ok(results)
    }
}

/// Arguments of the single `gradlew` invocation that runs a whole batch.
fn test_task_args(tests: &[TestCase]) -> Vec<String> {
    let mut args = vec!["test".to_string()];
    for test in tests {
        args.push("--tests".to_string());
        args.push(test.qualified_name());
    }
    args
}

/// Turn one test's recorded duration strings into a raw result.
///
/// Any `FAILED` sentinel fails the whole repetition for that test. Otherwise
/// durations are scanned in order: an unparseable entry fails, a zero entry
/// makes throughput undefined, and a clean scan yields `1/duration` samples.
fn durations_to_result(durations: &[String]) -> RawResult {
    if durations.iter().any(|d| d == FAILED_DURATION) {
        return RawResult::from_error(ErrorTag::ExecutionFailed);
    }
    let mut throughput = Vec::with_capacity(durations.len());
    for duration in durations {
        let seconds: f64 = match duration.parse() {
            Ok(value) => value,
            Err(_) => return RawResult::from_error(ErrorTag::ExecutionFailed),
        };
        if seconds == 0.0 {
            return RawResult::from_error(ErrorTag::ZeroDuration);
        }
        throughput.push(1.0 / seconds);
    }
    if throughput.is_empty() {
        // A record with no recorded executions means nothing ever ran.
        return RawResult::from_error(ErrorTag::ExecutionFailed);
    }
    RawResult::from_samples(throughput)
}

/// Extract the `time` attribute of the named `<testcase>` from a Gradle XML
/// test report. `None` when the testcase is absent, carries a `<failure>`
/// child, or the document cannot be parsed.
fn parse_testcase_time(xml: &str, method_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) if e.name().as_ref() == b"testcase" => {
                if attribute_value(&e, b"name").as_deref() == Some(method_name) {
                    // Self-closing testcase: no failure child possible.
                    return attribute_value(&e, b"time");
                }
            }
            Ok(Event::Start(e)) if e.name().as_ref() == b"testcase" => {
                if attribute_value(&e, b"name").as_deref() == Some(method_name) {
                    let time = attribute_value(&e, b"time");
                    return if testcase_body_is_clean(&mut reader) {
                        time
                    } else {
                        None
                    };
                }
            }
            Ok(Event::Eof) => return None,
            Err(_) => return None,
            _ => {}
        }
    }
}

/// Scan a `<testcase>` body up to its closing tag, reporting whether it is
/// free of `<failure>` children.
fn testcase_body_is_clean(reader: &mut Reader<&[u8]>) -> bool {
    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth == 0 && e.name().as_ref() == b"failure" {
                    return false;
                }
                depth += 1;
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 && e.name().as_ref() == b"failure" {
                    return false;
                }
            }
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return false,
            Err(_) => return false,
            _ => {}
        }
    }
}

fn attribute_value(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .try_get_attribute(key)
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}
