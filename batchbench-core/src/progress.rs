//! Durable Progress Checkpointing
//!
//! A campaign checkpoints its position after every completed step so that a
//! crash or kill loses at most the step in flight. The checkpoint is two
//! files and a rename protocol:
//!
//! ```text
//! save:  rename progress.json -> progress.json.old   (if present)
//!        write + flush + fsync new progress.json
//!        delete progress.json.old
//! ```
//!
//! At every instant at least one of the two files holds a complete checkpoint,
//! so recovery always lands on the pre- or post-save position, never a torn
//! one. The write side recovers by restoring a leftover backup over whatever
//! partial primary a crash left behind; the read side prefers the backup
//! without touching either file.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::CampaignLayout;

/// Errors from checkpoint persistence.
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Checkpoint I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed checkpoint {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No checkpoint found at {path}")]
    NoCheckpoint { path: PathBuf },
}

/// Position of a campaign: the next (batch, repetition) step to execute.
///
/// `batch` counts fully finished batches once it passes the last index, so a
/// campaign is complete exactly when `batch == total_batches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Index of the batch the next step belongs to.
    pub batch: usize,
    /// Repetition within that batch.
    pub repetition: usize,
}

impl Progress {
    /// Position of a fresh campaign.
    pub fn start() -> Self {
        Progress {
            batch: 0,
            repetition: 0,
        }
    }

    /// Move past the step just completed: next repetition, or the first
    /// repetition of the next batch.
    pub fn advance(&mut self, repetitions_per_batch: usize) {
        self.repetition += 1;
        if self.repetition >= repetitions_per_batch {
            self.repetition = 0;
            self.batch += 1;
        }
    }

    /// Whether every batch has finished.
    pub fn is_complete(&self, total_batches: usize) -> bool {
        self.batch >= total_batches
    }

    /// Number of (batch, repetition) steps already completed.
    pub fn steps_done(&self, repetitions_per_batch: usize) -> usize {
        self.batch * repetitions_per_batch + self.repetition
    }
}

/// Checkpoint storage for one campaign output directory.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    primary: PathBuf,
    backup: PathBuf,
}

impl ProgressStore {
    /// Store operating on the given layout's checkpoint paths.
    pub fn new(layout: &CampaignLayout) -> Self {
        Self {
            primary: layout.progress_file(),
            backup: layout.progress_backup_file(),
        }
    }

    /// Durably record `progress`.
    ///
    /// The previous checkpoint survives as the backup until the new primary
    /// is written and synced; only then is the backup removed. Any error here
    /// is fatal to the campaign, resumption depends on this file.
    pub fn save(&self, progress: &Progress) -> Result<(), ProgressError> {
        if self.primary.exists() {
            fs::rename(&self.primary, &self.backup).map_err(|source| ProgressError::Io {
                path: self.backup.clone(),
                source,
            })?;
        }

        let io_err = |source| ProgressError::Io {
            path: self.primary.clone(),
            source,
        };
        let mut file = File::create(&self.primary).map_err(io_err)?;
        let body = serde_json::to_vec(progress).map_err(|source| ProgressError::Malformed {
            path: self.primary.clone(),
            source,
        })?;
        file.write_all(&body).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        file.sync_all().map_err(io_err)?;

        if self.backup.exists() {
            fs::remove_file(&self.backup).map_err(|source| ProgressError::Io {
                path: self.backup.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Load the checkpoint for resumption, repairing any interrupted save
    /// first: a leftover backup supersedes whatever primary the crash left
    /// behind. A directory with no checkpoint at all is a fresh campaign.
    pub fn load_or_start(&self) -> Result<Progress, ProgressError> {
        if self.backup.exists() {
            if self.primary.exists() {
                fs::remove_file(&self.primary).map_err(|source| ProgressError::Io {
                    path: self.primary.clone(),
                    source,
                })?;
            }
            fs::rename(&self.backup, &self.primary).map_err(|source| ProgressError::Io {
                path: self.primary.clone(),
                source,
            })?;
        }

        if self.primary.exists() {
            read_checkpoint(&self.primary)
        } else {
            Ok(Progress::start())
        }
    }

    /// Read the checkpoint without modifying either file, preferring the
    /// backup when an interrupted save left one behind. For read-side tooling
    /// that must not disturb a campaign directory it does not own.
    pub fn peek(&self) -> Result<Progress, ProgressError> {
        if self.backup.exists() {
            read_checkpoint(&self.backup)
        } else if self.primary.exists() {
            read_checkpoint(&self.primary)
        } else {
            Err(ProgressError::NoCheckpoint {
                path: self.primary.clone(),
            })
        }
    }
}

fn read_checkpoint(path: &Path) -> Result<Progress, ProgressError> {
    let body = fs::read(path).map_err(|source| ProgressError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&body).map_err(|source| ProgressError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PROGRESS_BACKUP_FILE, PROGRESS_FILE};

    fn store_in(dir: &Path) -> ProgressStore {
        ProgressStore::new(&CampaignLayout::new(dir))
    }

    #[test]
    fn test_advance_rolls_over_batches() {
        let mut p = Progress::start();
        p.advance(3);
        assert_eq!(p, Progress { batch: 0, repetition: 1 });
        p.advance(3);
        p.advance(3);
        assert_eq!(p, Progress { batch: 1, repetition: 0 });
        assert_eq!(p.steps_done(3), 3);
        assert!(!p.is_complete(2));
        p.advance(3);
        p.advance(3);
        p.advance(3);
        assert!(p.is_complete(2));
    }

    #[test]
    fn test_fresh_directory_starts_at_zero() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.load_or_start().unwrap(), Progress::start());
        assert!(matches!(
            store.peek(),
            Err(ProgressError::NoCheckpoint { .. })
        ));
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let p = Progress { batch: 4, repetition: 7 };
        store.save(&p).unwrap();
        assert_eq!(store.load_or_start().unwrap(), p);
        assert_eq!(store.peek().unwrap(), p);
        // A completed save leaves no backup behind.
        assert!(!dir.path().join(PROGRESS_BACKUP_FILE).exists());
    }

    #[test]
    fn test_second_save_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        store.save(&Progress { batch: 1, repetition: 0 }).unwrap();
        store.save(&Progress { batch: 1, repetition: 1 }).unwrap();
        assert_eq!(
            store.load_or_start().unwrap(),
            Progress { batch: 1, repetition: 1 }
        );
    }

    #[test]
    fn test_crash_after_rename_recovers_backup() {
        // Simulates dying between the rename and the new write: only the
        // backup exists.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let old = Progress { batch: 2, repetition: 5 };
        fs::write(
            dir.path().join(PROGRESS_BACKUP_FILE),
            serde_json::to_vec(&old).unwrap(),
        )
        .unwrap();

        assert_eq!(store.load_or_start().unwrap(), old);
        // Recovery restored the backup as the primary.
        assert!(dir.path().join(PROGRESS_FILE).exists());
        assert!(!dir.path().join(PROGRESS_BACKUP_FILE).exists());
    }

    #[test]
    fn test_crash_mid_write_discards_torn_primary() {
        // Simulates dying mid-write: a torn primary next to an intact backup.
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let old = Progress { batch: 3, repetition: 1 };
        fs::write(
            dir.path().join(PROGRESS_BACKUP_FILE),
            serde_json::to_vec(&old).unwrap(),
        )
        .unwrap();
        fs::write(dir.path().join(PROGRESS_FILE), b"{\"batch\": 9, \"rep").unwrap();

        assert_eq!(store.load_or_start().unwrap(), old);
    }

    #[test]
    fn test_peek_prefers_backup_and_mutates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        let newer = Progress { batch: 6, repetition: 0 };
        let older = Progress { batch: 5, repetition: 9 };
        fs::write(
            dir.path().join(PROGRESS_FILE),
            serde_json::to_vec(&newer).unwrap(),
        )
        .unwrap();
        fs::write(
            dir.path().join(PROGRESS_BACKUP_FILE),
            serde_json::to_vec(&older).unwrap(),
        )
        .unwrap();

        assert_eq!(store.peek().unwrap(), older);
        assert!(dir.path().join(PROGRESS_FILE).exists());
        assert!(dir.path().join(PROGRESS_BACKUP_FILE).exists());
    }

    #[test]
    fn test_malformed_primary_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        fs::write(dir.path().join(PROGRESS_FILE), b"not json").unwrap();
        assert!(matches!(
            store.load_or_start(),
            Err(ProgressError::Malformed { .. })
        ));
    }
}
