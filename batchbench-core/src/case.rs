//! Test Case Identity
//!
//! A campaign measures a fixed, ordered list of test methods. Each test is
//! identified by its fully qualified class name plus method name; that pair is
//! the join key between planning, execution artifacts, and collected results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single test method under measurement.
///
/// The serialized field names (`class`, `test`) are part of the stable
/// test-list and artifact format shared with the external collection tooling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestCase {
    /// Fully qualified class name, e.g. `org.example.FooTest`.
    #[serde(rename = "class")]
    pub class_name: String,
    /// Method name within the class.
    #[serde(rename = "test")]
    pub method_name: String,
}

impl TestCase {
    /// Create a test case from its class and method names.
    pub fn new(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// `class.method` form, as passed on build-tool command lines.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class_name, self.method_name)
    }
}

/// Parse an ordered test list from its JSON representation:
/// `[{"class": "...", "test": "..."}, ...]`.
pub fn parse_test_list(json: &str) -> Result<Vec<TestCase>, serde_json::Error> {
    serde_json::from_str(json)
}
