//! A single histogram row.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Instance count and total size of one class.
///
/// The class name is always the canonical form produced by
/// [`crate::class_name::normalize`], never the raw descriptor. Diff
/// histograms reuse this type for deltas, so both counters are signed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistogramEntry {
    #[serde(rename = "class")]
    class_name: String,
    instances: i64,
    #[serde(rename = "size")]
    bytes: i64,
}

impl HistogramEntry {
    pub fn new(class_name: impl Into<String>, instances: i64, bytes: i64) -> Self {
        Self {
            class_name: class_name.into(),
            instances,
            bytes,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn instances(&self) -> i64 {
        self.instances
    }

    pub fn bytes(&self) -> i64 {
        self.bytes
    }

    /// The same class with both counters negated.
    pub fn negated(&self) -> Self {
        Self::new(self.class_name.clone(), -self.instances, -self.bytes)
    }

    /// Ranking order: larger byte counts first.
    ///
    /// Used with a stable sort, so equal sizes keep their relative order.
    pub fn cmp_by_bytes_desc(&self, other: &Self) -> Ordering {
        other.bytes.cmp(&self.bytes)
    }
}

impl fmt::Display for HistogramEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.class_name, self.instances, self.bytes)
    }
}
