use bom_diff_core::format::{format_summary, format_text, format_tree_text, TextOptions};
use bom_diff_core::{DiffCounts, FlatReport, StructuredReport};
use colored::Colorize;

/// Color report lines for terminal output.
///
/// Lines are matched on their first non-blank character so indented
/// assembly blocks color the same way as flat ones.
pub fn colorize(raw: &str) -> String {
    let mut out = Vec::new();

    for line in raw.lines() {
        let marker = line.trim_start();
        let colored = if marker.starts_with('+') {
            line.green().to_string()
        } else if marker.starts_with('-') && !marker.starts_with("----") {
            line.red().to_string()
        } else if marker.starts_with('~') {
            line.yellow().to_string()
        } else if marker.starts_with("----") {
            line.bold().to_string()
        } else if marker == "BOMs match" {
            line.green().to_string()
        } else {
            line.to_string()
        };
        out.push(colored);
    }

    out.join("\n")
}

/// Render a flat comparison for terminal output.
pub fn render_text(report: &FlatReport<'_>, options: &TextOptions) -> String {
    colorize(&format_text(report, options))
}

/// Render a hierarchical comparison for terminal output.
pub fn render_tree_text(report: &StructuredReport<'_>, options: &TextOptions) -> String {
    colorize(&format_tree_text(report, options))
}

/// Render summary counts for terminal output.
pub fn render_summary(counts: &DiffCounts) -> String {
    format_summary(counts).cyan().to_string()
}
