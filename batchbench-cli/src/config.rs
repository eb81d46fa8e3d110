//! Campaign configuration
//!
//! A campaign is described by a single config file naming the test list, the
//! batch geometry, the output directory, and the runners that measure each
//! batch. TOML is the native format; `.json` files are accepted for
//! compatibility with configs written for the earlier tooling, which also
//! used `configs` as the name of the runner list and `time` for the JMH
//! measurement window.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use batchbench_core::{parse_test_list, CampaignLayout, TestCase};
use batchbench_runners::{ApproachSettings, Runner, RunnerConfig};

/// Errors from loading or validating a campaign config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed config {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Malformed test list {path}: {source}")]
    MalformedTestList {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Test list {path} is empty")]
    EmptyTestList { path: PathBuf },

    #[error("batch_size must be at least 1")]
    ZeroBatchSize,

    #[error("repetitions must be at least 1")]
    ZeroRepetitions,

    #[error("A campaign needs at least one runner")]
    NoRunners,

    #[error("Runner name {name:?} is not usable as a path component")]
    UnsafeRunnerName { name: String },

    #[error("Duplicate runner name {name:?}")]
    DuplicateRunnerName { name: String },

    #[error("Runner {name:?}: executions must be at least 1")]
    ZeroExecutions { name: String },
}

/// One benchmark campaign: what to measure, how to split and repeat it, and
/// where the results go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// JSON file listing the tests to measure.
    pub test_list: PathBuf,
    /// Tests per batch; the last batch takes the remainder.
    pub batch_size: usize,
    /// Times each batch is repeated.
    pub repetitions: usize,
    /// Directory for the checkpoint and the per-step artifacts.
    pub output_dir: PathBuf,
    /// Runners in execution order.
    #[serde(alias = "configs")]
    pub runners: Vec<RunnerConfig>,
}

impl CampaignConfig {
    /// Load and validate a campaign config file. A `.json` extension selects
    /// JSON; anything else is parsed as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path.extension().and_then(|ext| ext.to_str()) == Some("json");
        let config: Self = if is_json {
            serde_json::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                reason: source.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|source| ConfigError::Malformed {
                path: path.to_path_buf(),
                reason: source.to_string(),
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine and the output tree depend on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.repetitions == 0 {
            return Err(ConfigError::ZeroRepetitions);
        }
        if self.runners.is_empty() {
            return Err(ConfigError::NoRunners);
        }
        let mut names = BTreeSet::new();
        for runner in &self.runners {
            if !path_safe(&runner.name) {
                return Err(ConfigError::UnsafeRunnerName {
                    name: runner.name.clone(),
                });
            }
            if !names.insert(runner.name.as_str()) {
                return Err(ConfigError::DuplicateRunnerName {
                    name: runner.name.clone(),
                });
            }
            if let ApproachSettings::GradleTest(settings) = &runner.settings {
                if settings.executions == 0 {
                    return Err(ConfigError::ZeroExecutions {
                        name: runner.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Read and parse the configured test list.
    pub fn load_tests(&self) -> Result<Vec<TestCase>, ConfigError> {
        let content =
            fs::read_to_string(&self.test_list).map_err(|source| ConfigError::Unreadable {
                path: self.test_list.clone(),
                source,
            })?;
        let tests = parse_test_list(&content).map_err(|source| ConfigError::MalformedTestList {
            path: self.test_list.clone(),
            source,
        })?;
        if tests.is_empty() {
            return Err(ConfigError::EmptyTestList {
                path: self.test_list.clone(),
            });
        }
        Ok(tests)
    }

    /// Layout of the campaign's output directory.
    pub fn layout(&self) -> CampaignLayout {
        CampaignLayout::new(&self.output_dir)
    }

    /// Instantiate the configured runners, in order.
    pub fn build_runners(&self) -> Vec<Runner> {
        self.runners.iter().map(Runner::from_config).collect()
    }
}

/// True when `name` can serve as a single path component.
fn path_safe(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}
