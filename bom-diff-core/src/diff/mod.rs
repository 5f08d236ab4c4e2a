//! Collection comparison.
//!
//! [`flat`] matches two item lists by identity; [`hierarchy`] walks two
//! assembly trees and runs the flat comparison on each matched assembly.

pub mod flat;
pub mod hierarchy;

pub use flat::{diff_items, BomDiff, DiffCounts};
pub use hierarchy::{diff_trees, AssemblyDiff};

use crate::collection::Bom;
use crate::structured::StructuredBom;
use crate::tree::AssemblyTree;

/// A flat comparison together with the two collections it came from.
#[derive(Debug)]
pub struct FlatReport<'a> {
    pub left: &'a Bom,
    pub right: &'a Bom,
    pub diff: BomDiff<'a>,
}

impl FlatReport<'_> {
    pub fn has_differences(&self) -> bool {
        self.diff.has_differences()
    }
}

/// A hierarchical comparison, one [`AssemblyDiff`] per visited assembly.
///
/// The report tree is keyed by the left side's positions; the top level is
/// stored under the empty position.
#[derive(Debug)]
pub struct StructuredReport<'a> {
    pub left: &'a StructuredBom,
    pub right: &'a StructuredBom,
    pub tree: AssemblyTree<AssemblyDiff<'a>>,
}

impl StructuredReport<'_> {
    pub fn has_differences(&self) -> bool {
        self.tree.values().any(|node| node.diff.has_differences())
    }

    /// Tallies across every visited assembly.
    pub fn counts(&self) -> DiffCounts {
        let mut total = DiffCounts::default();
        for node in self.tree.values() {
            total += node.diff.counts();
        }
        total
    }
}
