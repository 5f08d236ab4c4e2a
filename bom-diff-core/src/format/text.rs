use crate::diff::{BomDiff, DiffCounts, FlatReport, StructuredReport};
use crate::item::Item;
use crate::tree::TreePosition;

/// Options shared by the text renderers.
#[derive(Debug, Clone, Default)]
pub struct TextOptions {
    /// Also list matched items without changes.
    pub show_common: bool,
    /// Changed attributes left out of the detail lines.
    pub skip_attrs: Vec<String>,
}

const INDENT: &str = "    ";

/// Render a flat comparison.
///
/// Lines start with `~` (changed), `=` (unchanged, only with
/// `show_common`), `+` (right only) or `-` (left only).
pub fn format_text(report: &FlatReport<'_>, options: &TextOptions) -> String {
    let mut lines = vec![title(
        report.left.name(),
        report.left.len(),
        report.right.name(),
        report.right.len(),
    )];
    push_body(&mut lines, &report.diff, options, "");
    lines.join("\n")
}

/// Render a hierarchical comparison, one indented block per assembly.
pub fn format_tree_text(report: &StructuredReport<'_>, options: &TextOptions) -> String {
    let mut lines = vec![title(
        report.left.name(),
        report.left.len(),
        report.right.name(),
        report.right.len(),
    )];
    for node in report.tree.values() {
        let depth = if node.position.is_empty() {
            0
        } else {
            TreePosition::parse(&node.position)
                .map(|p| p.level())
                .unwrap_or(0)
        };
        let indent = INDENT.repeat(depth);
        match node.assembly {
            Some((left, _)) => lines.push(format!(
                "{indent}---- {}  {left}  {} ----",
                node.position,
                left.description()
            )),
            None => lines.push(format!("{indent}---- Top Level ----")),
        }
        push_body(&mut lines, &node.diff, options, &INDENT.repeat(depth + 1));
        lines.push(String::new());
    }
    lines.join("\n")
}

/// One-line tally of a comparison.
pub fn format_summary(counts: &DiffCounts) -> String {
    format!(
        "matched={} changed={} left_only={} right_only={}",
        counts.matched, counts.changed, counts.left_only, counts.right_only
    )
}

fn title(left: &str, left_len: usize, right: &str, right_len: usize) -> String {
    format!("{left} ({left_len})\t{right} ({right_len})")
}

fn push_body(lines: &mut Vec<String>, diff: &BomDiff<'_>, options: &TextOptions, indent: &str) {
    for (left, right, attrs) in diff.common() {
        if attrs.is_empty() {
            if options.show_common {
                lines.push(format!("{indent}= {}", pair_label(left, right)));
            }
            continue;
        }
        lines.push(format!("{indent}~ {}", pair_label(left, right)));
        for attr in attrs {
            if options.skip_attrs.contains(attr) {
                continue;
            }
            lines.push(format!(
                "{indent}{INDENT}{attr}: {} != {}",
                left.get(attr),
                right.get(left.counterpart_attribute(right, attr))
            ));
        }
    }
    for item in &diff.right_only {
        lines.push(format!("{indent}+ {item}  {}", item.description()));
    }
    for item in &diff.left_only {
        lines.push(format!("{indent}- {item}  {}", item.description()));
    }
    if !diff.has_differences() {
        lines.push(format!("{indent}BOMs match"));
    }
}

fn pair_label(left: &Item, right: &Item) -> String {
    if left.primary_value() == right.primary_value() {
        format!("{left}  {}", left.description())
    } else {
        format!("{left} / {right}  {}", left.description())
    }
}
