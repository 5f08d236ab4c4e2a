use bom_diff_core::{Bom, StructuredBom};

/// Render an assembly tree with a configurable max depth.
///
/// Depth 0 shows the top-level entries only. Positions without an item are
/// shown as `(empty)`.
pub fn render_tree(bom: &StructuredBom, max_depth: usize) -> String {
    let mut out = String::new();
    for (depth, position, item) in bom.iter_tree() {
        if depth > max_depth {
            continue;
        }
        let indent = "  ".repeat(depth);
        let summary = item.map_or_else(|| "(empty)".to_string(), |i| i.summary());
        out.push_str(&format!("{indent}{position}  {summary}\n"));
    }
    out
}

/// Render the flattened view: every distinct item once, with its total
/// quantity.
pub fn render_flattened(bom: &StructuredBom) -> String {
    let mut out = String::new();
    for (item, quantity) in bom.flattened() {
        out.push_str(&format!("{item}  {}  x{quantity}\n", item.description()));
    }
    out
}

/// Render a flat list, one item per line.
pub fn render_items(bom: &Bom) -> String {
    let mut out = String::new();
    for item in bom {
        out.push_str(&format!("{}\n", item.summary()));
    }
    out
}
