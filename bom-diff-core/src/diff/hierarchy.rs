use tracing::debug;

use crate::diff::flat::{diff_items, BomDiff};
use crate::error::{DiffError, TreeError};
use crate::item::{Item, ItemId};
use crate::structured::StructuredBom;
use crate::tree::{AssemblyTree, Branch};

/// Comparison of the direct children of one matched assembly pair.
#[derive(Debug, Clone)]
pub struct AssemblyDiff<'a> {
    /// Left position of the assembly; empty for the top level.
    pub position: String,
    /// The matched assemblies, `None` at the top level.
    pub assembly: Option<(&'a Item, &'a Item)>,
    pub diff: BomDiff<'a>,
}

/// Walk both trees from their roots, comparing the children of every matched
/// assembly pair.
///
/// Matched items are followed into their own subtrees: each side's subtree is
/// looked up by that side's own position, so an assembly moved to another
/// position is still compared against its counterpart. Ignored categories and
/// compared names come from the left collection.
pub fn diff_trees<'a>(
    left: &'a StructuredBom,
    right: &'a StructuredBom,
) -> Result<AssemblyTree<AssemblyDiff<'a>>, DiffError> {
    let mut report = AssemblyTree::new();
    let walker = Walker { left, right };
    let left_top: Vec<&Item> = left
        .tree()
        .top_level()
        .filter_map(|b| walker.left_item(b))
        .collect();
    let right_top: Vec<&Item> = right
        .tree()
        .top_level()
        .filter_map(|b| walker.right_item(b))
        .collect();
    walker.visit(&mut report, String::new(), None, &left_top, &right_top)?;
    debug!(
        left = left.name(),
        right = right.name(),
        assemblies = report.len(),
        "hierarchical diff complete"
    );
    Ok(report)
}

struct Walker<'a> {
    left: &'a StructuredBom,
    right: &'a StructuredBom,
}

impl<'a> Walker<'a> {
    fn left_item(&self, branch: Branch<'a, ItemId>) -> Option<&'a Item> {
        branch.value().map(|id| &self.left.bom()[*id])
    }

    fn right_item(&self, branch: Branch<'a, ItemId>) -> Option<&'a Item> {
        branch.value().map(|id| &self.right.bom()[*id])
    }

    fn visit(
        &self,
        report: &mut AssemblyTree<AssemblyDiff<'a>>,
        position: String,
        assembly: Option<(&'a Item, &'a Item)>,
        left_children: &[&'a Item],
        right_children: &[&'a Item],
    ) -> Result<(), DiffError> {
        let bom = self.left.bom();
        let left_items = bom.diffable(left_children.iter().copied());
        let right_items = bom.diffable(right_children.iter().copied());
        let diff = diff_items(&left_items, &right_items, bom.diff_names())?;
        let pairs: Vec<(&'a Item, &'a Item)> = diff
            .common_left
            .iter()
            .copied()
            .zip(diff.common_right.iter().copied())
            .collect();

        report.set_branch(
            &position,
            AssemblyDiff {
                position: position.clone(),
                assembly,
                diff,
            },
        )?;

        for (l, r) in pairs {
            let left_branch = self.left.tree().branch(placed(l)?)?;
            let right_branch = self.right.tree().branch(placed(r)?)?;
            if !left_branch.has_children() && !right_branch.has_children() {
                continue;
            }
            let next_left: Vec<&Item> = left_branch
                .children()
                .filter_map(|b| self.left_item(b))
                .collect();
            let next_right: Vec<&Item> = right_branch
                .children()
                .filter_map(|b| self.right_item(b))
                .collect();
            self.visit(
                report,
                left_branch.position().to_string(),
                Some((l, r)),
                &next_left,
                &next_right,
            )?;
        }
        Ok(())
    }
}

fn placed(item: &Item) -> Result<&str, TreeError> {
    item.position()
        .ok_or_else(|| TreeError::InvalidPosition(item.to_string()))
}
