//! Spreadsheet-shaped reports.
//!
//! A [`Table`] is a rectangular matrix of cell strings with a parallel matrix
//! of [`CellStyle`] tags. Its width is `1 + 2 * S` where `S` is the number of
//! shown properties: a position column, then the left item's shown values,
//! then the right item's.

use serde::Serialize;

use crate::collection::Bom;
use crate::diff::{BomDiff, FlatReport, StructuredReport};
use crate::item::{attr, Item};

/// Style tag of one table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    Blank,
    Title,
    SubAssembly,
    LeftMatch,
    LeftDiff,
    RightMatch,
    RightDiff,
    LeftShow,
    RightShow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub rows: Vec<Vec<String>>,
    pub styles: Vec<Vec<CellStyle>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows zipped with their styles.
    pub fn iter(&self) -> impl Iterator<Item = (&[String], &[CellStyle])> {
        self.rows
            .iter()
            .zip(&self.styles)
            .map(|(row, styles)| (row.as_slice(), styles.as_slice()))
    }
}

/// Table of a flat comparison. Shown and compared names come from the left
/// collection.
pub fn table_flat(report: &FlatReport<'_>, show_common: bool) -> Table {
    let mut builder = TableBuilder::new(report.left, show_common);
    builder.titles(report.left, report.right);
    if builder.body(&report.diff) {
        let mut row = vec![String::new(), format!("BOMs match for {}", report.left.name())];
        builder.pad(&mut row);
        let styles = vec![CellStyle::Blank; row.len()];
        builder.push(row, styles);
    }
    builder.table
}

/// Table of a hierarchical comparison: per assembly, a sub-assembly header
/// row followed by that assembly's rows.
pub fn table_tree(report: &StructuredReport<'_>, show_common: bool) -> Table {
    let left = report.left.bom();
    let mut builder = TableBuilder::new(left, show_common);
    builder.titles(left, report.right.bom());

    for node in report.tree.values() {
        let assembly = node.assembly.map(|(l, _)| l);
        let mut row = match assembly {
            Some(item) => vec![
                node.position.clone(),
                item.primary_value().to_string(),
                item.description(),
            ],
            None => vec!["Top Level".to_string()],
        };
        builder.pad(&mut row);
        let styles = vec![CellStyle::SubAssembly; row.len()];
        builder.push(row, styles);

        if builder.body(&node.diff) {
            let code = assembly
                .map(|item| item.primary_value().to_string())
                .unwrap_or_else(|| "top level".to_string());
            let mut row = vec![String::new(), format!("BOMs match for {code}")];
            builder.pad(&mut row);
            let mut styles = vec![CellStyle::Blank];
            styles.extend(vec![CellStyle::LeftMatch; builder.shown.len()]);
            styles.extend(vec![CellStyle::RightMatch; builder.shown.len()]);
            styles.resize(row.len(), CellStyle::Blank);
            builder.push(row, styles);
        }
    }
    builder.table
}

struct TableBuilder<'a> {
    shown: &'a [String],
    compared: &'a [String],
    show_common: bool,
    width: usize,
    table: Table,
}

impl<'a> TableBuilder<'a> {
    fn new(settings: &'a Bom, show_common: bool) -> Self {
        let shown = settings.show_names();
        Self {
            shown,
            compared: settings.diff_names(),
            show_common,
            width: 1 + 2 * shown.len().max(1),
            table: Table::default(),
        }
    }

    fn push(&mut self, row: Vec<String>, styles: Vec<CellStyle>) {
        self.table.rows.push(row);
        self.table.styles.push(styles);
    }

    fn pad(&self, row: &mut Vec<String>) {
        if row.len() < self.width {
            row.resize(self.width, String::new());
        }
    }

    fn titles(&mut self, left: &Bom, right: &Bom) {
        let mut first = vec![String::new(); self.width];
        first[1] = format!("{} ({})", left.name(), left.len());
        first[self.width - self.shown.len().max(1)] = format!("{} ({})", right.name(), right.len());
        let styles = vec![CellStyle::Title; first.len()];
        self.push(first, styles);

        let mut second = vec!["#".to_string()];
        second.extend(self.shown.iter().cloned());
        second.extend(self.shown.iter().cloned());
        self.pad(&mut second);
        let styles = vec![CellStyle::Title; second.len()];
        self.push(second, styles);
    }

    /// Append the rows of one diff. Returns whether it has no differences.
    fn body(&mut self, diff: &BomDiff<'_>) -> bool {
        for (left, right, attrs) in diff.common() {
            if attrs.is_empty() && !self.show_common {
                continue;
            }
            let (mut row, mut styles) = self.position_cell(left);
            self.common_cells(left, right, attrs, &mut row, &mut styles, Side::Left);
            self.common_cells(right, left, attrs, &mut row, &mut styles, Side::Right);
            self.push(row, styles);
        }

        for &item in &diff.left_only {
            let (mut row, mut styles) = self.position_cell(item);
            self.only_cells(Some(item), &mut row, &mut styles, CellStyle::LeftDiff);
            self.only_cells(None, &mut row, &mut styles, CellStyle::LeftDiff);
            self.push(row, styles);
        }
        for &item in &diff.right_only {
            let (mut row, mut styles) = self.position_cell(item);
            self.only_cells(None, &mut row, &mut styles, CellStyle::RightDiff);
            self.only_cells(Some(item), &mut row, &mut styles, CellStyle::RightDiff);
            self.push(row, styles);
        }

        !diff.has_differences()
    }

    fn position_cell(&self, item: &Item) -> (Vec<String>, Vec<CellStyle>) {
        let mut row = Vec::with_capacity(self.width);
        let mut styles = Vec::with_capacity(self.width);
        row.push(item.text(attr::TREE_NUM));
        styles.push(CellStyle::Blank);
        (row, styles)
    }

    fn common_cells(
        &self,
        item: &Item,
        other: &Item,
        changed: &[String],
        row: &mut Vec<String>,
        styles: &mut Vec<CellStyle>,
        side: Side,
    ) {
        for name in self.shown {
            let attribute = item.resolve_attribute(name);
            row.push(attribute.map(|a| item.text(a)).unwrap_or_default());
            let style = if !self.compared.contains(name) {
                side.show()
            } else if attribute.is_some_and(|a| {
                changed
                    .iter()
                    .any(|c| c == a || other.counterpart_attribute(item, c) == a)
            }) {
                side.diff()
            } else {
                side.matched()
            };
            styles.push(style);
        }
    }

    fn only_cells(
        &self,
        item: Option<&Item>,
        row: &mut Vec<String>,
        styles: &mut Vec<CellStyle>,
        style: CellStyle,
    ) {
        for name in self.shown {
            let value = item
                .and_then(|item| item.resolve_attribute(name).map(|a| item.text(a)))
                .unwrap_or_default();
            row.push(value);
            styles.push(style);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

impl Side {
    fn diff(self) -> CellStyle {
        match self {
            Side::Left => CellStyle::LeftDiff,
            Side::Right => CellStyle::RightDiff,
        }
    }

    fn matched(self) -> CellStyle {
        match self {
            Side::Left => CellStyle::LeftMatch,
            Side::Right => CellStyle::RightMatch,
        }
    }

    fn show(self) -> CellStyle {
        match self {
            Side::Left => CellStyle::LeftShow,
            Side::Right => CellStyle::RightShow,
        }
    }
}
