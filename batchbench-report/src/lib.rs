#![warn(missing_docs)]
//! BatchBench Report - Campaign Data Export
//!
//! Flattens collected campaign data into export formats:
//! - `ResultRow` records with per-row throughput statistics
//! - CSV (stable columns and row order for the analysis tooling)
//! - JSON snapshot (raw samples and error tags, unsummarized)

mod csv;
mod row;
mod snapshot;

pub use csv::generate_csv_report;
pub use row::{batch_rows, ReportError, ResultRow};
pub use snapshot::{
    build_snapshot, generate_json_snapshot, CampaignSnapshot, SnapshotMeta, SnapshotRecord,
    SnapshotRunner, SNAPSHOT_SCHEMA_VERSION,
};
