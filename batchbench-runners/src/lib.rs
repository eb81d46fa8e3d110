#![warn(missing_docs)]
//! BatchBench Runners - Benchmark Runner Adapters
//!
//! Thin adapters around the external benchmarking tools:
//! - `GradleTestRunner`: plain test execution timed from Gradle XML reports
//! - `JmhRunner`: JMH jars produced by the ju2jmh and ju4runner wrappers
//! - `BenchmarkRunner` trait + `Runner` union as the engine-facing seam
//!
//! Adapters own both directions for their approach: running a batch into a
//! repetition directory and reading those artifacts back as raw results.

mod config;
mod gradle;
mod jmh;
mod runner;

pub use config::{Approach, ApproachSettings, GradleSettings, JmhSettings, RunnerConfig};
pub use gradle::{FAILED_DURATION, GradleTestRunner};
pub use jmh::{JmhRunner, NamePattern};
pub use runner::{BenchmarkRunner, CollectError, Runner, RunnerError};
