//! Runner Configuration
//!
//! Each configured runner pairs a unique name with one execution approach and
//! that approach's tool settings. The name doubles as the artifact namespace
//! inside every repetition directory, so it is validated for path safety at
//! campaign load.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Benchmark execution approach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Approach {
    /// Plain build-tool test execution, timed from Gradle's XML test reports.
    GradleTest,
    /// JMH benchmarks generated from JUnit tests by the ju2jmh converter.
    Ju2jmh,
    /// JMH benchmarks driving JUnit tests through a JUnit 4 runner wrapper.
    Ju4runner,
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Approach::GradleTest => "gradle-test",
            Approach::Ju2jmh => "ju2jmh",
            Approach::Ju4runner => "ju4runner",
        };
        f.write_str(label)
    }
}

/// One configured runner: a campaign-unique name plus approach settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Unique runner name; becomes an on-disk path component.
    pub name: String,
    /// The approach and its tool-specific settings.
    #[serde(flatten)]
    pub settings: ApproachSettings,
}

impl RunnerConfig {
    /// The approach this runner embodies.
    pub fn approach(&self) -> Approach {
        self.settings.approach()
    }
}

/// Approach-specific tool settings, tagged by the `approach` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "approach", rename_all = "kebab-case")]
pub enum ApproachSettings {
    /// `approach = "gradle-test"`
    GradleTest(GradleSettings),
    /// `approach = "ju2jmh"`
    Ju2jmh(JmhSettings),
    /// `approach = "ju4runner"`
    Ju4runner(JmhSettings),
}

impl ApproachSettings {
    /// The approach tag of these settings.
    pub fn approach(&self) -> Approach {
        match self {
            ApproachSettings::GradleTest(_) => Approach::GradleTest,
            ApproachSettings::Ju2jmh(_) => Approach::Ju2jmh,
            ApproachSettings::Ju4runner(_) => Approach::Ju4runner,
        }
    }
}

/// Settings for Gradle test execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradleSettings {
    /// Gradle project to run `./gradlew test` in.
    pub project_root: PathBuf,
    /// Times the batch's test suite is executed within one repetition; each
    /// execution contributes one duration per test.
    #[serde(default = "default_executions")]
    pub executions: usize,
}

fn default_executions() -> usize {
    1
}

/// Settings for JMH-based execution (both wrapper flavors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JmhSettings {
    /// Path to the self-contained benchmarks jar.
    pub jar: PathBuf,
    /// JMH fork count (`-f`).
    #[serde(default = "default_forks")]
    pub forks: usize,
    /// Warmup and measurement time per iteration in milliseconds (`-w`/`-r`).
    /// Older campaign configs name this field `time`.
    #[serde(default = "default_time_ms", alias = "time")]
    pub time_ms: u64,
}

fn default_forks() -> usize {
    1
}

fn default_time_ms() -> u64 {
    1000
}
