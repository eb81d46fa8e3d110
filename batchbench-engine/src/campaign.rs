//! Campaign Execution
//!
//! The write-side state machine of a campaign. Work is a grid of
//! (batch, repetition) steps executed strictly in order, one at a time:
//!
//! ```text
//! load checkpoint ──▶ while batch remains:
//!                        recreate b<batch>/r<rep>/ empty
//!                        run every runner into it (config order)
//!                        advance (batch, rep)
//!                        checkpoint durably
//! ```
//!
//! The repetition directory is the unit of redo: a step interrupted anywhere
//! leaves its directory behind, and the rerun clears and repeats exactly that
//! step. The checkpoint is synced before the next step touches the disk, so
//! a finished step is never redone and an unfinished one never skipped.
//!
//! Execution is deliberately sequential; running benchmarks beside each other
//! would contaminate the measurements.

use std::fs;
use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::info;

use batchbench_core::{CampaignLayout, Progress, ProgressError, ProgressStore, TestBatch};
use batchbench_runners::{BenchmarkRunner, RunnerError};

/// Errors that abort a campaign.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Campaign directory I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint failed: {0}")]
    Checkpoint(#[from] ProgressError),

    #[error("Runner {runner} failed: {source}")]
    Runner {
        runner: String,
        #[source]
        source: RunnerError,
    },
}

/// Drives one campaign to completion, resuming from the last checkpoint.
pub struct ExperimentCampaign<R: BenchmarkRunner> {
    batches: Vec<TestBatch>,
    repetitions: usize,
    layout: CampaignLayout,
    store: ProgressStore,
    runners: Vec<R>,
}

impl<R: BenchmarkRunner> ExperimentCampaign<R> {
    /// Campaign over `batches`, repeated `repetitions` times per batch, with
    /// every runner executed per step. `repetitions` must be positive.
    pub fn new(
        layout: CampaignLayout,
        batches: Vec<TestBatch>,
        repetitions: usize,
        runners: Vec<R>,
    ) -> Self {
        assert!(repetitions > 0, "a campaign needs at least one repetition");
        let store = ProgressStore::new(&layout);
        Self {
            batches,
            repetitions,
            layout,
            store,
            runners,
        }
    }

    /// Run until every (batch, repetition) step is done, picking up after the
    /// last checkpoint. Returns the final position.
    pub fn run(&self) -> Result<Progress, EngineError> {
        fs::create_dir_all(self.layout.output_dir()).map_err(|source| EngineError::Io {
            path: self.layout.output_dir().to_path_buf(),
            source,
        })?;
        let mut progress = self.store.load_or_start()?;
        let total_steps = self.batches.len() * self.repetitions;

        let pb = ProgressBar::new(total_steps as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_position(progress.steps_done(self.repetitions) as u64);

        while !progress.is_complete(self.batches.len()) {
            self.run_step(&progress, &pb)?;
            progress.advance(self.repetitions);
            self.store.save(&progress)?;
            pb.inc(1);
        }

        pb.finish_with_message("Campaign complete");
        Ok(progress)
    }

    /// Execute the step at `progress`: clear its directory and run every
    /// runner into it.
    fn run_step(&self, progress: &Progress, pb: &ProgressBar) -> Result<(), EngineError> {
        let batch = &self.batches[progress.batch];
        let repetition_dir = self
            .layout
            .repetition_dir(progress.batch, progress.repetition);

        // A leftover directory is a step that was interrupted mid-flight;
        // redo it from scratch.
        if repetition_dir.exists() {
            fs::remove_dir_all(&repetition_dir).map_err(|source| EngineError::Io {
                path: repetition_dir.clone(),
                source,
            })?;
        }
        fs::create_dir_all(&repetition_dir).map_err(|source| EngineError::Io {
            path: repetition_dir.clone(),
            source,
        })?;

        for (index, runner) in self.runners.iter().enumerate() {
            pb.set_message(format!(
                "b{}/r{} {}",
                progress.batch,
                progress.repetition,
                runner.name()
            ));
            info!(
                "batch {}/{}, repetition {}/{}, runner {}/{} ({})",
                progress.batch + 1,
                self.batches.len(),
                progress.repetition + 1,
                self.repetitions,
                index + 1,
                self.runners.len(),
                runner.name()
            );
            runner
                .run_batch(&batch.tests, &repetition_dir)
                .map_err(|source| EngineError::Runner {
                    runner: runner.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }
}
