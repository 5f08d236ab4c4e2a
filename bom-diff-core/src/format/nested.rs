//! Nested report mirroring the assembly tree, for YAML or JSON output.
//!
//! Each entry is keyed by its position (empty for the top level). A node
//! without visited sub-assemblies serializes as its sub-report; a node with
//! them serializes as `[sub-report, {children}]`. Every sub-report carries a
//! `status` of either [`MATCH`] or [`DIFFER`].

use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Serialize, Serializer};

/// Status of a sub-report without differences.
pub const MATCH: &str = "BOMs match";
/// Status of a sub-report with at least one difference.
pub const DIFFER: &str = "BOMs differ";

use crate::diff::{AssemblyDiff, BomDiff, FlatReport, StructuredReport};
use crate::item::{attr, Item};
use crate::tree::Branch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedReport {
    pub entries: Vec<(String, NestedEntry)>,
}

/// One assembly's comparison: changed pairs and items found on a single side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedEntry {
    pub header: String,
    pub has_differences: bool,
    pub changed: Vec<NestedChange>,
    pub left_name: String,
    pub left_only: Vec<String>,
    pub right_name: String,
    pub right_only: Vec<String>,
    pub children: NestedReport,
}

/// A matched pair whose compared attributes differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedChange {
    pub item: String,
    pub attributes: Vec<AttributeChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeChange {
    pub name: String,
    pub left: String,
    pub right: String,
}

impl NestedEntry {
    pub fn status(&self) -> &'static str {
        if self.has_differences {
            DIFFER
        } else {
            MATCH
        }
    }
}

impl NestedReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `position`, searched depth-first.
    pub fn find(&self, position: &str) -> Option<&NestedEntry> {
        self.entries.iter().find_map(|(key, entry)| {
            if key == position {
                Some(entry)
            } else {
                entry.children.find(position)
            }
        })
    }
}

struct Names {
    left: String,
    right: String,
}

impl Names {
    /// Both sides need distinct keys, even when the files share a name.
    fn new(left: &str, right: &str) -> Self {
        let right = if left == right {
            format!("{right} (right)")
        } else {
            right.to_string()
        };
        Self {
            left: left.to_string(),
            right,
        }
    }

    fn entry(&self, header: String, diff: &BomDiff<'_>, children: NestedReport) -> NestedEntry {
        NestedEntry {
            header,
            has_differences: diff.has_differences(),
            changed: changes(diff),
            left_name: self.left.clone(),
            left_only: diff.left_only.iter().map(|i| line(i)).collect(),
            right_name: self.right.clone(),
            right_only: diff.right_only.iter().map(|i| line(i)).collect(),
            children,
        }
    }
}

fn changes(diff: &BomDiff<'_>) -> Vec<NestedChange> {
    diff.common()
        .filter(|(_, _, attrs)| !attrs.is_empty())
        .map(|(left, right, attrs)| NestedChange {
            item: line(left),
            attributes: attrs
                .iter()
                .map(|name| AttributeChange {
                    name: name.clone(),
                    left: left.text(name),
                    right: right.text(left.counterpart_attribute(right, name)),
                })
                .collect(),
        })
        .collect()
}

fn line(item: &Item) -> String {
    format!("{}\t{item}\t{}", item.text(attr::TREE_NUM), item.description())
}

/// A flat comparison as a single top-level entry.
pub fn nested_flat(report: &FlatReport<'_>) -> NestedReport {
    let names = Names::new(report.left.name(), report.right.name());
    NestedReport {
        entries: vec![(
            String::new(),
            names.entry("Top Level".to_string(), &report.diff, NestedReport::default()),
        )],
    }
}

/// A hierarchical comparison, nested like the left tree.
pub fn nested_tree(report: &StructuredReport<'_>) -> NestedReport {
    let names = Names::new(report.left.name(), report.right.name());
    let top: Vec<Branch<'_, AssemblyDiff<'_>>> = report
        .tree
        .top_level()
        .filter(|b| !b.position().is_empty())
        .collect();
    let children = nest(&names, top);
    match report.tree.get("") {
        Some(root) => NestedReport {
            entries: vec![(
                String::new(),
                names.entry("Top Level".to_string(), &root.diff, children),
            )],
        },
        None => children,
    }
}

fn nest(names: &Names, branches: Vec<Branch<'_, AssemblyDiff<'_>>>) -> NestedReport {
    let mut out = NestedReport::default();
    for branch in branches {
        let Some(node) = branch.value() else {
            continue;
        };
        let header = match node.assembly {
            Some((item, _)) => format!("{}\t{item}\t{}", node.position, item.description()),
            None => node.position.clone(),
        };
        let children = nest(names, branch.children().collect());
        out.entries
            .push((branch.position().to_string(), names.entry(header, &node.diff, children)));
    }
    out
}

impl Serialize for NestedReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

struct SubReport<'a>(&'a NestedEntry);

impl Serialize for SubReport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entry = self.0;
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("header", &entry.header)?;
        map.serialize_entry("status", entry.status())?;
        map.serialize_entry("changed", &entry.changed)?;
        map.serialize_entry(&entry.left_name, &entry.left_only)?;
        map.serialize_entry(&entry.right_name, &entry.right_only)?;
        map.end()
    }
}

impl Serialize for NestedEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.children.is_empty() {
            return SubReport(self).serialize(serializer);
        }
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&SubReport(self))?;
        tuple.serialize_element(&self.children)?;
        tuple.end()
    }
}
