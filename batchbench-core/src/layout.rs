//! Campaign Output Layout
//!
//! Single authority for the on-disk shape of a campaign:
//!
//! ```text
//! output_dir/
//!   progress.json        current checkpoint
//!   progress.json.old    checkpoint backup, exists only mid-save
//!   b0/r0/ ... bN/rM/    one directory per (batch, repetition) step
//! ```
//!
//! The layout is stable: collection tooling locates artifacts purely from the
//! campaign configuration and these paths, with no side index.

use std::path::{Path, PathBuf};

/// Checkpoint file name inside the output directory.
pub const PROGRESS_FILE: &str = "progress.json";

/// Checkpoint backup file name; present only during a save or after a crash.
pub const PROGRESS_BACKUP_FILE: &str = "progress.json.old";

/// Maps campaign coordinates to paths under one output directory.
#[derive(Debug, Clone)]
pub struct CampaignLayout {
    output_dir: PathBuf,
}

impl CampaignLayout {
    /// Layout rooted at `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The campaign output root.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the current checkpoint file.
    pub fn progress_file(&self) -> PathBuf {
        self.output_dir.join(PROGRESS_FILE)
    }

    /// Path of the checkpoint backup file.
    pub fn progress_backup_file(&self) -> PathBuf {
        self.output_dir.join(PROGRESS_BACKUP_FILE)
    }

    /// Directory holding all repetitions of one batch.
    pub fn batch_dir(&self, batch: usize) -> PathBuf {
        self.output_dir.join(format!("b{batch}"))
    }

    /// Directory holding one repetition's runner artifacts.
    pub fn repetition_dir(&self, batch: usize, repetition: usize) -> PathBuf {
        self.batch_dir(batch).join(format!("r{repetition}"))
    }
}
