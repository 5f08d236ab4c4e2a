use std::collections::HashMap;

use serde::Serialize;

use crate::error::DiffError;
use crate::item::Item;
use crate::value::Value;

/// Result of comparing two item lists.
///
/// `common_left`, `common_right` and `diff_attrs` are index-aligned: entry `i`
/// of each describes one matched pair.
#[derive(Debug, Clone, Default)]
pub struct BomDiff<'a> {
    pub common_left: Vec<&'a Item>,
    pub common_right: Vec<&'a Item>,
    pub diff_attrs: Vec<Vec<String>>,
    pub left_only: Vec<&'a Item>,
    pub right_only: Vec<&'a Item>,
}

impl<'a> BomDiff<'a> {
    /// Matched pairs with their changed attributes.
    pub fn common(&self) -> impl Iterator<Item = (&'a Item, &'a Item, &[String])> + '_ {
        self.common_left
            .iter()
            .zip(&self.common_right)
            .zip(&self.diff_attrs)
            .map(|((l, r), attrs)| (*l, *r, attrs.as_slice()))
    }

    /// Any changed pair or any item on one side only.
    pub fn has_differences(&self) -> bool {
        !self.left_only.is_empty()
            || !self.right_only.is_empty()
            || self.diff_attrs.iter().any(|attrs| !attrs.is_empty())
    }

    pub fn counts(&self) -> DiffCounts {
        let changed = self.diff_attrs.iter().filter(|a| !a.is_empty()).count();
        DiffCounts {
            matched: self.common_left.len() - changed,
            changed,
            left_only: self.left_only.len(),
            right_only: self.right_only.len(),
        }
    }
}

/// Tallies of a diff, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffCounts {
    pub matched: usize,
    pub changed: usize,
    pub left_only: usize,
    pub right_only: usize,
}

impl std::ops::AddAssign for DiffCounts {
    fn add_assign(&mut self, other: Self) {
        self.matched += other.matched;
        self.changed += other.changed;
        self.left_only += other.left_only;
        self.right_only += other.right_only;
    }
}

/// Compare two item lists by identity.
///
/// Each identity counts once per side; its first occurrence in list order
/// represents it. Matched pairs are ordered by the left item's primary value
/// and the one-side lists by their own primary values.
pub fn diff_items<'a>(
    left: &[&'a Item],
    right: &[&'a Item],
    names: &[String],
) -> Result<BomDiff<'a>, DiffError> {
    let (left, left_index) = first_occurrences(left);
    let (right, right_index) = first_occurrences(right);

    let mut pairs: Vec<(&'a Item, &'a Item)> = left
        .iter()
        .filter_map(|l| right_index.get(l.identity()).map(|r| (*l, *r)))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp_primary(b.0));

    let mut out = BomDiff::default();
    for (l, r) in pairs {
        out.diff_attrs.push(l.diff(r, names)?);
        out.common_left.push(l);
        out.common_right.push(r);
    }

    out.left_only = left
        .iter()
        .filter(|i| !right_index.contains_key(i.identity()))
        .copied()
        .collect();
    out.left_only.sort_by(|a, b| a.cmp_primary(b));

    out.right_only = right
        .iter()
        .filter(|i| !left_index.contains_key(i.identity()))
        .copied()
        .collect();
    out.right_only.sort_by(|a, b| a.cmp_primary(b));

    Ok(out)
}

fn first_occurrences<'a>(items: &[&'a Item]) -> (Vec<&'a Item>, HashMap<&'a Value, &'a Item>) {
    let mut unique = Vec::with_capacity(items.len());
    let mut index = HashMap::with_capacity(items.len());
    for &item in items {
        if !index.contains_key(item.identity()) {
            index.insert(item.identity(), item);
            unique.push(item);
        }
    }
    (unique, index)
}
