//! Batch Planning
//!
//! Splits the campaign's ordered test list into fixed-size batches. The split
//! is pure and deterministic: the same list and batch size always produce the
//! same plan, and the batch index doubles as the stable on-disk identifier
//! (`b0`, `b1`, ...) that execution and collection both key on.

use serde::{Deserialize, Serialize};

use crate::case::TestCase;

/// A contiguous slice of the campaign test list, executed and persisted as a
/// unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestBatch {
    /// Position of this batch in the plan; identifies its output directory.
    pub index: usize,
    /// Tests in original list order.
    pub tests: Vec<TestCase>,
}

impl TestBatch {
    /// Number of tests in this batch.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the batch holds no tests.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Partition `tests` into batches of `batch_size`, preserving order.
///
/// Produces `ceil(tests.len() / batch_size)` batches; every batch holds
/// exactly `batch_size` tests except possibly the last, which holds the
/// remainder. Concatenating the batches reproduces the input exactly.
///
/// `batch_size` must be positive; the configuration layer rejects zero before
/// planning ever runs.
pub fn plan_batches(tests: &[TestCase], batch_size: usize) -> Vec<TestBatch> {
    assert!(batch_size > 0, "batch size must be positive");

    tests
        .chunks(batch_size)
        .enumerate()
        .map(|(index, chunk)| TestBatch {
            index,
            tests: chunk.to_vec(),
        })
        .collect()
}
