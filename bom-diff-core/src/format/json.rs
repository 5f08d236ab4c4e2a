use serde::Serialize;

use crate::diff::{DiffCounts, FlatReport, StructuredReport};
use crate::format::nested::{nested_flat, nested_tree, NestedReport};

/// Machine-readable comparison: the nested report plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub left: String,
    pub right: String,
    pub has_differences: bool,
    pub counts: DiffCounts,
    pub report: NestedReport,
}

impl JsonReport {
    pub fn flat(report: &FlatReport<'_>) -> Self {
        Self {
            left: report.left.name().to_string(),
            right: report.right.name().to_string(),
            has_differences: report.has_differences(),
            counts: report.diff.counts(),
            report: nested_flat(report),
        }
    }

    pub fn tree(report: &StructuredReport<'_>) -> Self {
        Self {
            left: report.left.name().to_string(),
            right: report.right.name().to_string(),
            has_differences: report.has_differences(),
            counts: report.counts(),
            report: nested_tree(report),
        }
    }
}

/// Format a report as pretty-printed JSON.
pub fn format_json(report: &JsonReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
