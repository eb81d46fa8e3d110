#![warn(missing_docs)]
//! BatchBench Engine - Campaign Execution and Collection
//!
//! Orchestrates a campaign end to end:
//! - `ExperimentCampaign` runs the (batch, repetition) grid sequentially,
//!   checkpointing after every step and resuming after interruption
//! - `DataCollector` reads completed steps back, per repetition or merged
//!
//! Both sides are generic over the runner, sharing one layout and checkpoint
//! protocol from `batchbench-core`.

mod campaign;
mod collector;

pub use campaign::{EngineError, ExperimentCampaign};
pub use collector::{CollectorError, DataCollector, ResultKey};
