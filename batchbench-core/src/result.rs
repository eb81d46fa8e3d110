//! Raw Measurement Results
//!
//! The outcome of measuring one test under one runner is either a non-empty
//! sequence of throughput samples or a non-empty set of error tags, never
//! both and never neither. The enum makes the invalid states unrepresentable;
//! the constructors guard the non-emptiness ends.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a measurement produced no usable samples.
///
/// Variant order matches the lexicographic order of the stable export labels,
/// so sorted tag sets render as `FAILED,ZERO_DURATION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorTag {
    /// The tool reported the test as failed, or its report was unusable.
    #[serde(rename = "FAILED")]
    ExecutionFailed,
    /// A duration of zero was recorded; throughput is undefined.
    #[serde(rename = "ZERO_DURATION")]
    ZeroDuration,
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorTag::ExecutionFailed => "FAILED",
            ErrorTag::ZeroDuration => "ZERO_DURATION",
        };
        f.write_str(label)
    }
}

/// Raw result for one (test, runner) pair within one repetition, or merged
/// across the repetitions of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawResult {
    /// Throughput samples, in measurement order.
    Samples(Vec<f64>),
    /// The set of error conditions observed instead of samples.
    Errors(BTreeSet<ErrorTag>),
}

impl RawResult {
    /// Wrap a non-empty sample sequence.
    pub fn from_samples(samples: Vec<f64>) -> Self {
        assert!(!samples.is_empty(), "a sampled result carries at least one sample");
        RawResult::Samples(samples)
    }

    /// Wrap a non-empty error tag set.
    pub fn from_errors(errors: BTreeSet<ErrorTag>) -> Self {
        assert!(!errors.is_empty(), "an errored result carries at least one tag");
        RawResult::Errors(errors)
    }

    /// Result carrying a single error tag.
    pub fn from_error(error: ErrorTag) -> Self {
        RawResult::Errors(BTreeSet::from([error]))
    }

    /// Whether this result carries error tags instead of samples.
    pub fn is_errored(&self) -> bool {
        matches!(self, RawResult::Errors(_))
    }

    /// The samples, if this result has any.
    pub fn samples(&self) -> Option<&[f64]> {
        match self {
            RawResult::Samples(samples) => Some(samples),
            RawResult::Errors(_) => None,
        }
    }

    /// The error tags, if this result is errored.
    pub fn errors(&self) -> Option<&BTreeSet<ErrorTag>> {
        match self {
            RawResult::Samples(_) => None,
            RawResult::Errors(errors) => Some(errors),
        }
    }

    /// Merge the per-repetition results of one (test, runner) pair.
    ///
    /// If every repetition sampled cleanly, the merged result concatenates the
    /// samples in repetition order. If any repetition errored, the merged
    /// result is the union of all error tags observed and every sample is
    /// discarded: partially errored data would bias any downstream statistic.
    pub fn merge_repetitions(results: &[RawResult]) -> RawResult {
        assert!(!results.is_empty(), "merging requires at least one repetition");

        let mut errors = BTreeSet::new();
        for result in results {
            if let RawResult::Errors(tags) = result {
                errors.extend(tags.iter().copied());
            }
        }
        if !errors.is_empty() {
            return RawResult::Errors(errors);
        }

        let mut samples = Vec::new();
        for result in results {
            if let RawResult::Samples(values) = result {
                samples.extend_from_slice(values);
            }
        }
        RawResult::Samples(samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels() {
        assert_eq!(ErrorTag::ExecutionFailed.to_string(), "FAILED");
        assert_eq!(ErrorTag::ZeroDuration.to_string(), "ZERO_DURATION");
    }

    #[test]
    fn test_tag_order_matches_label_order() {
        let tags = BTreeSet::from([ErrorTag::ZeroDuration, ErrorTag::ExecutionFailed]);
        let labels: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, vec!["FAILED", "ZERO_DURATION"]);
    }

    #[test]
    fn test_merge_concatenates_in_repetition_order() {
        let merged = RawResult::merge_repetitions(&[
            RawResult::from_samples(vec![1.0, 2.0]),
            RawResult::from_samples(vec![3.0]),
            RawResult::from_samples(vec![4.0, 5.0]),
        ]);
        assert_eq!(merged.samples(), Some(&[1.0, 2.0, 3.0, 4.0, 5.0][..]));
    }

    #[test]
    fn test_merge_discards_samples_when_any_repetition_errors() {
        let merged = RawResult::merge_repetitions(&[
            RawResult::from_samples(vec![1.0, 2.0]),
            RawResult::from_error(ErrorTag::ExecutionFailed),
            RawResult::from_samples(vec![3.0]),
        ]);
        assert!(merged.is_errored());
        assert_eq!(
            merged.errors(),
            Some(&BTreeSet::from([ErrorTag::ExecutionFailed]))
        );
    }

    #[test]
    fn test_merge_unions_error_tags_across_repetitions() {
        let merged = RawResult::merge_repetitions(&[
            RawResult::from_error(ErrorTag::ZeroDuration),
            RawResult::from_samples(vec![1.0]),
            RawResult::from_error(ErrorTag::ExecutionFailed),
        ]);
        assert_eq!(
            merged.errors(),
            Some(&BTreeSet::from([
                ErrorTag::ExecutionFailed,
                ErrorTag::ZeroDuration
            ]))
        );
    }

    #[test]
    #[should_panic(expected = "at least one sample")]
    fn test_empty_samples_rejected() {
        RawResult::from_samples(Vec::new());
    }

    #[test]
    #[should_panic(expected = "at least one repetition")]
    fn test_merge_of_nothing_rejected() {
        RawResult::merge_repetitions(&[]);
    }
}
