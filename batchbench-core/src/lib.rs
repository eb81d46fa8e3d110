#![warn(missing_docs)]
//! BatchBench Core - Campaign Data Model
//!
//! Shared vocabulary for batched benchmark campaigns:
//! - `TestCase` identity and the JSON test-list format
//! - `plan_batches` pure partitioning of a test list into fixed-size batches
//! - `RawResult` / `ErrorTag` measurement outcomes and repetition merging
//! - `Progress` / `ProgressStore` crash-safe checkpointing (rename protocol)
//! - `CampaignLayout` the stable on-disk shape of a campaign directory

mod batch;
mod case;
mod layout;
mod progress;
mod result;

pub use batch::{TestBatch, plan_batches};
pub use case::{TestCase, parse_test_list};
pub use layout::{CampaignLayout, PROGRESS_BACKUP_FILE, PROGRESS_FILE};
pub use progress::{Progress, ProgressError, ProgressStore};
pub use result::{ErrorTag, RawResult};
