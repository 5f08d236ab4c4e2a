//! Flat BOM collections.

use std::collections::HashMap;
use std::ops::Index;
use std::sync::Arc;

use tracing::debug;

use crate::category::Categories;
use crate::dialect::Dialect;
use crate::diff::{diff_items, BomDiff, FlatReport};
use crate::error::{BuildError, DiffError};
use crate::item::{attr, HeaderIndex, Item, ItemId};
use crate::value::Value;

/// Names compared when none are configured.
pub const DEFAULT_DIFF_NAMES: [&str; 3] = ["Item Code", "Description", "Qty"];

/// Names shown in reports when none are configured.
pub const DEFAULT_SHOW_NAMES: [&str; 4] = ["Item Code", "Description", "Qty", "Revision"];

/// A named, ordered list of items with identity lookup.
#[derive(Debug, Clone)]
pub struct Bom {
    name: String,
    dialect: Arc<Dialect>,
    header: HeaderIndex,
    items: Vec<Item>,
    index: HashMap<Value, ItemId>,
    diff_names: Vec<String>,
    show_names: Vec<String>,
    ignored_categories: Vec<String>,
}

impl Bom {
    pub fn new(name: impl Into<String>, dialect: Arc<Dialect>) -> Self {
        Self {
            name: name.into(),
            dialect,
            header: HeaderIndex::default(),
            items: Vec::new(),
            index: HashMap::new(),
            diff_names: DEFAULT_DIFF_NAMES.iter().map(|s| s.to_string()).collect(),
            show_names: DEFAULT_SHOW_NAMES.iter().map(|s| s.to_string()).collect(),
            ignored_categories: Vec::new(),
        }
    }

    /// Load from rows; the first row is the header.
    ///
    /// A rejected row fails the whole load with its 1-based line number.
    pub fn from_rows<I>(
        name: impl Into<String>,
        dialect: Arc<Dialect>,
        rows: I,
    ) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut bom = Bom::new(name, dialect);
        let mut rows = rows.into_iter();
        let Some(header) = rows.next() else {
            return Ok(bom);
        };
        bom.header = HeaderIndex::from_row(&header);

        for (offset, row) in rows.enumerate() {
            let item = bom
                .dialect
                .line_to_item(&bom.header, &row)
                .map_err(|source| BuildError::Row {
                    row: offset + 2,
                    source,
                })?;
            if let Some(item) = item {
                bom.append(item);
            }
        }
        debug!(bom = %bom.name, items = bom.items.len(), "loaded rows");
        Ok(bom)
    }

    /// Re-create `items` in this dialect.
    pub fn from_items<'a, I>(name: impl Into<String>, dialect: Arc<Dialect>, items: I) -> Self
    where
        I: IntoIterator<Item = &'a Item>,
    {
        let sources: Vec<&Item> = items.into_iter().collect();
        let mut bom = Bom::new(name, dialect);
        bom.header = HeaderIndex::from_row(&common_header(&sources));
        for source in sources {
            let item = bom.dialect.item_to_item(source);
            bom.append(item);
        }
        bom
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dialect(&self) -> &Arc<Dialect> {
        &self.dialect
    }

    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [Item] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.items.iter()
    }

    /// Whether an item with the same identity is present.
    pub fn contains(&self, item: &Item) -> bool {
        self.index.contains_key(item.identity())
    }

    /// First item with the same identity.
    pub fn find(&self, item: &Item) -> Option<ItemId> {
        self.index.get(item.identity()).copied()
    }

    /// Append an item. Duplicates by identity are kept in the list; lookups
    /// resolve to the first one.
    pub fn append(&mut self, item: Item) -> ItemId {
        let id = self.items.len();
        self.index.entry(item.identity().clone()).or_insert(id);
        self.items.push(item);
        id
    }

    /// Merge `other` into this collection.
    ///
    /// Items already present gain the other item's quantity when
    /// `accumulate` is set; new items are appended.
    pub fn extend(&mut self, other: &Bom, accumulate: bool) {
        for item in other.iter() {
            match self.find(item) {
                Some(id) => {
                    if accumulate {
                        let existing = &mut self.items[id];
                        existing.set_quantity(existing.quantity() + item.quantity());
                    }
                }
                None => {
                    self.append(item.clone());
                }
            }
        }
    }

    pub fn diff_names(&self) -> &[String] {
        &self.diff_names
    }

    pub fn show_names(&self) -> &[String] {
        &self.show_names
    }

    pub fn ignored_categories(&self) -> &[String] {
        &self.ignored_categories
    }

    /// Replace the compared names. An empty list keeps the current ones.
    pub fn set_diff_props(&mut self, names: Vec<String>) {
        if !names.is_empty() {
            self.diff_names = names;
        }
    }

    /// Replace the shown names; every compared name is always shown.
    pub fn set_show_props(&mut self, names: Vec<String>) {
        self.show_names = names;
        for (index, name) in self.diff_names.iter().enumerate() {
            if !self.show_names.contains(name) {
                let at = index.min(self.show_names.len());
                self.show_names.insert(at, name.clone());
            }
        }
    }

    /// Exclude categories, given by name or code in any case, from diffs.
    /// Unknown categories are dropped.
    pub fn set_ignored_categories<S: AsRef<str>>(&mut self, categories: &[S], table: &Categories) {
        for raw in categories {
            match table.normalize(raw.as_ref()) {
                Some(code) => {
                    if !self.ignored_categories.contains(&code) {
                        self.ignored_categories.push(code);
                    }
                }
                None => debug!(category = raw.as_ref(), "ignoring unknown category"),
            }
        }
    }

    /// Copy compared, shown and ignored settings from another collection.
    pub fn copy_settings_from(&mut self, other: &Bom) {
        self.diff_names = other.diff_names.clone();
        self.show_names = other.show_names.clone();
        self.ignored_categories = other.ignored_categories.clone();
    }

    pub(crate) fn is_ignored(&self, item: &Item) -> bool {
        !self.ignored_categories.is_empty()
            && self.ignored_categories.contains(&item.text(attr::CATEGORY))
    }

    /// Items taking part in diffs: everything outside the ignored categories.
    pub(crate) fn diffable<'a>(&self, items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a Item> {
        items.into_iter().filter(|i| !self.is_ignored(i)).collect()
    }

    /// Flat comparison against `other`, using this collection's settings.
    pub fn diff<'a>(&'a self, other: &'a Bom) -> Result<BomDiff<'a>, DiffError> {
        let left = self.diffable(self.items.iter());
        let right = self.diffable(other.items.iter());
        diff_items(&left, &right, &self.diff_names)
    }

    /// [`Bom::diff`] bundled with both collections for rendering.
    pub fn compare<'a>(&'a self, other: &'a Bom) -> Result<FlatReport<'a>, DiffError> {
        Ok(FlatReport {
            left: self,
            right: other,
            diff: self.diff(other)?,
        })
    }

    /// Header plus one row per item, by schema attribute order.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let header = self.dialect.schema().preparsed_header();
        let mut rows = Vec::with_capacity(self.items.len() + 1);
        for item in &self.items {
            rows.push(item.to_list(&header));
        }
        rows.insert(0, header);
        rows
    }
}

impl Index<ItemId> for Bom {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Item {
        &self.items[id]
    }
}

impl<'a> IntoIterator for &'a Bom {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Union of the items' attribute headers, each name inserted at the index it
/// first appeared at.
fn common_header(items: &[&Item]) -> Vec<String> {
    let mut header: Vec<String> = Vec::new();
    for item in items {
        for (index, name) in item.schema().preparsed_header().into_iter().enumerate() {
            if !header.contains(&name) {
                let at = index.min(header.len());
                header.insert(at, name);
            }
        }
    }
    header
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::Bom;
    use crate::category::Categories;
    use crate::dialect::Dialect;
    use crate::equivalence::EquivalenceGroups;
    use crate::error::BuildError;
    use crate::header::{FilterSet, HeaderFilter, ValueParser};
    use crate::item::ItemSchema;

    fn dialect() -> Arc<Dialect> {
        let mut filters = FilterSet::new();
        filters.push(
            HeaderFilter::new("part_number", ValueParser::CodeOrNumber)
                .with_aliases(["item_id"]),
        );
        filters.push(HeaderFilter::new("item_id", ValueParser::Text).with_headers(["Item ID"]));
        filters.push(HeaderFilter::new("quantity", ValueParser::Quantity).with_headers(["Qty"]));
        filters.push(HeaderFilter::new("revision", ValueParser::Revision).with_headers(["Rev"]));
        filters.push(HeaderFilter::new("level", ValueParser::Int).with_headers(["Level"]));
        let schema = ItemSchema::new(filters, "part_number", &EquivalenceGroups::default());
        Arc::new(Dialect::flat("test", Arc::new(schema)))
    }

    fn rows(lines: &[&str]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|l| l.split(',').map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn extend_accumulates_quantity_for_equal_items() {
        let mut a = Bom::from_rows("a", dialect(), rows(&["Item ID,Qty", "ASM-100-01,2"]))
            .expect("valid rows");
        let b = Bom::from_rows(
            "b",
            dialect(),
            rows(&["Item ID,Qty", "ASM-100-01,3", "PCB-200-01,1"]),
        )
        .expect("valid rows");

        a.extend(&b, true);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].quantity(), 5);

        let mut c = Bom::from_rows("c", dialect(), rows(&["Item ID,Qty", "ASM-100-01,2"]))
            .expect("valid rows");
        c.extend(&b, false);
        assert_eq!(c[0].quantity(), 2);
    }

    #[test]
    fn show_props_always_include_diff_props() {
        let mut bom = Bom::new("a", dialect());
        bom.set_diff_props(vec!["Item Code".into(), "Qty".into()]);
        bom.set_show_props(vec!["Description".into()]);
        assert_eq!(bom.show_names(), ["Item Code", "Qty", "Description"]);

        bom.set_diff_props(Vec::new());
        assert_eq!(bom.diff_names(), ["Item Code", "Qty"]);
    }

    #[test]
    fn ignored_categories_are_normalised() {
        let table = Categories::new([("ASM", "Assembly"), ("CBL", "Cable")]);
        let mut bom = Bom::new("a", dialect());
        bom.set_ignored_categories(&["assembly", "cbl", "nonsense"], &table);
        assert_eq!(bom.ignored_categories(), ["ASM", "CBL"]);
    }

    #[test]
    fn ignored_categories_are_left_out_of_diffs() {
        let table = Categories::new([("CBL", "Cable")]);
        let mut a = Bom::from_rows("a", dialect(), rows(&["Item ID", "CBL-300-01", "ASM-100-01"]))
            .expect("valid rows");
        let b = Bom::from_rows("b", dialect(), rows(&["Item ID", "ASM-100-01"]))
            .expect("valid rows");
        a.set_ignored_categories(&["Cable"], &table);

        let diff = a.diff(&b).expect("compatible schemas");
        assert!(diff.left_only.is_empty());
        assert_eq!(diff.common_left.len(), 1);
    }

    #[test]
    fn rejected_rows_carry_their_line_number() {
        let err = Bom::from_rows(
            "a",
            dialect(),
            rows(&["Item ID,Level", "ASM-100-01,1", "ASM-200-01,top"]),
        )
        .expect_err("bad level");
        assert!(matches!(err, BuildError::Row { row: 3, .. }));
    }

    #[test]
    fn to_rows_uses_attribute_order() {
        let bom = Bom::from_rows("a", dialect(), rows(&["Item ID,Qty", "ASM-100-01,2"]))
            .expect("valid rows");
        let out = bom.to_rows();
        assert_eq!(out[0], ["part_number", "item_id", "quantity", "revision", "level"]);
        assert_eq!(out[1], ["100", "ASM-100-01", "2", "01", ""]);
    }
}
