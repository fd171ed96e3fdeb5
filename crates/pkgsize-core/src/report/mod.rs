//! Aggregation of a finalized discovery set.
//!
//! `aggregate` is a pure function: one line per discovered package and the sum of
//! their sizes. Formatting for a terminal or JSON is left to the caller.

use serde::Serialize;

use crate::types::DiscoverySet;
use crate::utils::size::{bytes_to_megabytes, format_megabytes};

/// One line of a size report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// Package name
    pub name: String,
    /// Installed size in bytes
    pub size: u64,
}

/// Per-package sizes and their total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeReport {
    /// One entry per discovered package, in name order
    pub lines: Vec<ReportLine>,
    /// Sum of all line sizes in bytes
    pub total_bytes: u64,
}

impl SizeReport {
    /// Total size in megabytes
    pub fn total_megabytes(&self) -> f64 {
        bytes_to_megabytes(self.total_bytes)
    }

    /// Total size formatted with two decimals, e.g. "0.01 MB"
    pub fn total_display(&self) -> String {
        format_megabytes(self.total_bytes)
    }

    /// Number of packages in the report
    pub fn package_count(&self) -> usize {
        self.lines.len()
    }
}

/// Build a report from a finalized discovery set
pub fn aggregate(discovered: &DiscoverySet) -> SizeReport {
    let mut total_bytes: u64 = 0;
    let lines = discovered
        .iter()
        .map(|(name, size)| {
            total_bytes = total_bytes.saturating_add(size);
            ReportLine {
                name: name.to_string(),
                size,
            }
        })
        .collect();

    SizeReport { lines, total_bytes }
}
