//! BOM dialects.
//!
//! A dialect bundles an item schema with the two item constructors a
//! collection needs (from a source row, and from an item of another dialect)
//! and says where structured collections take tree positions from.

use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

use crate::error::SchemaError;
use crate::item::{attr, HeaderIndex, Item, ItemSchema};

/// Builds an item from one row. `Ok(None)` drops the row.
pub type LineToItem =
    fn(&Arc<ItemSchema>, &HeaderIndex, &[String]) -> Result<Option<Item>, SchemaError>;

/// Re-creates an item from another dialect's item.
pub type ItemToItem = fn(&Arc<ItemSchema>, &Item) -> Item;

/// Where a structured collection finds each item's tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSource {
    /// No position column; items are numbered as top-level entries.
    Sequential,
    /// A dotted position column (`tree_num`).
    Explicit,
    /// Only a nesting `level` column; positions come from a counter.
    Levels,
}

#[derive(Clone)]
pub struct Dialect {
    name: String,
    schema: Arc<ItemSchema>,
    line_to_item: LineToItem,
    item_to_item: ItemToItem,
    positions: PositionSource,
    flat: Option<Arc<Dialect>>,
}

impl Dialect {
    /// A dialect for flat lists.
    pub fn flat(name: impl Into<String>, schema: Arc<ItemSchema>) -> Self {
        Self {
            name: name.into(),
            schema,
            line_to_item: standard_line_to_item,
            item_to_item: standard_item_to_item,
            positions: PositionSource::Sequential,
            flat: None,
        }
    }

    /// A dialect for assembly trees.
    ///
    /// Level-based dialects drop rows whose level does not parse.
    pub fn structured(
        name: impl Into<String>,
        schema: Arc<ItemSchema>,
        positions: PositionSource,
    ) -> Self {
        let line_to_item: LineToItem = match positions {
            PositionSource::Levels => level_line_to_item,
            PositionSource::Sequential | PositionSource::Explicit => standard_line_to_item,
        };
        Self {
            line_to_item,
            positions,
            ..Self::flat(name, schema)
        }
    }

    pub fn with_line_to_item(mut self, f: LineToItem) -> Self {
        self.line_to_item = f;
        self
    }

    pub fn with_item_to_item(mut self, f: ItemToItem) -> Self {
        self.item_to_item = f;
        self
    }

    /// Flat dialect used for top-level and flattened views of this one.
    pub fn with_flat(mut self, flat: Arc<Dialect>) -> Self {
        self.flat = Some(flat);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &Arc<ItemSchema> {
        &self.schema
    }

    pub fn positions(&self) -> PositionSource {
        self.positions
    }

    pub fn flat_dialect(&self) -> Option<&Arc<Dialect>> {
        self.flat.as_ref()
    }

    pub fn line_to_item(
        &self,
        header: &HeaderIndex,
        row: &[String],
    ) -> Result<Option<Item>, SchemaError> {
        (self.line_to_item)(&self.schema, header, row)
    }

    pub fn item_to_item(&self, item: &Item) -> Item {
        (self.item_to_item)(&self.schema, item)
    }
}

impl Debug for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dialect")
            .field("name", &self.name)
            .field("positions", &self.positions)
            .field("attributes", &self.schema.filters().attribute_names())
            .field("flat", &self.flat.as_ref().map(|d| d.name()))
            .finish()
    }
}

pub fn standard_line_to_item(
    schema: &Arc<ItemSchema>,
    header: &HeaderIndex,
    row: &[String],
) -> Result<Option<Item>, SchemaError> {
    Item::from_row(schema, header, row).map(Some)
}

pub fn level_line_to_item(
    schema: &Arc<ItemSchema>,
    header: &HeaderIndex,
    row: &[String],
) -> Result<Option<Item>, SchemaError> {
    let item = Item::from_row(schema, header, row)?;
    if item.get(attr::LEVEL).as_int().is_none() {
        return Ok(None);
    }
    Ok(Some(item))
}

pub fn standard_item_to_item(schema: &Arc<ItemSchema>, item: &Item) -> Item {
    Item::rederive(schema, item)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Dialect, PositionSource};
    use crate::equivalence::EquivalenceGroups;
    use crate::header::{FilterSet, HeaderFilter, ValueParser};
    use crate::item::{HeaderIndex, ItemSchema};

    fn schema() -> Arc<ItemSchema> {
        let mut filters = FilterSet::new();
        filters.push(HeaderFilter::new("part_number", ValueParser::Text).with_headers(["PN"]));
        filters.push(
            HeaderFilter::new("level", ValueParser::Level)
                .with_headers(["Level"])
                .critical(true),
        );
        Arc::new(ItemSchema::new(filters, "part_number", &EquivalenceGroups::default()))
    }

    #[test]
    fn level_dialect_drops_rows_without_a_level() {
        let dialect = Dialect::structured("levels", schema(), PositionSource::Levels);
        let header = HeaderIndex::from_row(&["PN", "Level"]);

        let kept = dialect
            .line_to_item(&header, &["1".to_string(), "2".to_string()])
            .expect("valid row");
        assert!(kept.is_some());

        let dropped = dialect
            .line_to_item(&header, &["1".to_string(), "".to_string()])
            .expect("valid row");
        assert!(dropped.is_none());
    }

    #[test]
    fn flat_dialect_is_linked_for_top_level_views() {
        let flat = Arc::new(Dialect::flat("plain", schema()));
        let tree = Dialect::structured("tree", schema(), PositionSource::Explicit).with_flat(flat);
        assert_eq!(tree.flat_dialect().map(|d| d.name()), Some("plain"));
        assert_eq!(tree.positions(), PositionSource::Explicit);
    }
}
