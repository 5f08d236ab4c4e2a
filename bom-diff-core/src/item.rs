//! The BOM line model.
//!
//! An [`Item`] stores parsed values under canonical attribute names. Its
//! identity is the value of the primary attribute, mapped through the
//! equivalence table, and equality and hashing both follow that identity.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::warn;

use crate::category::CATEGORY_DEFAULT;
use crate::equivalence::{EquivalenceGroups, EquivalenceTable};
use crate::error::{DiffError, SchemaError};
use crate::header::{clean_cell, FilterSet, HeaderFilter, ValueParser, PART_NUMBER_DEFAULT};
use crate::value::Value;

/// Placeholder revision for items whose revision is unknown.
pub const REVISION_DEFAULT: &str = "XX";

/// Canonical attribute names the engine itself reads or derives.
pub mod attr {
    pub const PART_NUMBER: &str = "part_number";
    pub const ITEM_CODE: &str = "item_code";
    pub const ITEM_ID: &str = "item_id";
    pub const CATEGORY: &str = "category";
    pub const REVISION: &str = "revision";
    pub const DESCRIPTION: &str = "description";
    pub const QUANTITY: &str = "quantity";
    pub const TREE_NUM: &str = "tree_num";
    pub const LEVEL: &str = "level";
}

/// Index of an item inside its owning collection.
pub type ItemId = usize;

static EMPTY: Value = Value::Empty;

/// Ordered mapping from raw header text to column index.
///
/// A header repeated in the source keeps its first position and its last
/// column index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderIndex {
    entries: Vec<(String, usize)>,
}

impl HeaderIndex {
    pub fn from_row<S: AsRef<str>>(row: &[S]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::with_capacity(row.len());
        for (index, cell) in row.iter().enumerate() {
            let name = cell.as_ref().to_string();
            match entries.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = index,
                None => entries.push((name, index)),
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, index)| (name.as_str(), *index))
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// Header filters, primary attribute and equivalence table shared by every
/// item of one dialect.
#[derive(Debug)]
pub struct ItemSchema {
    filters: FilterSet,
    primary: String,
    fallback: Option<HeaderFilter>,
    equivalence: EquivalenceTable,
}

impl ItemSchema {
    /// `primary` is resolved through the filters like any header name, so it
    /// may be an attribute name or a raw header text.
    pub fn new(filters: FilterSet, primary: impl Into<String>, groups: &EquivalenceGroups) -> Self {
        Self::build(filters, primary.into(), None, groups)
    }

    /// Like [`ItemSchema::new`], with `fallback` standing in as the primary
    /// filter when `filters` has none for `primary`.
    ///
    /// Its aliases still let other columns satisfy the primary attribute.
    pub fn with_primary_fallback(
        filters: FilterSet,
        primary: impl Into<String>,
        fallback: HeaderFilter,
        groups: &EquivalenceGroups,
    ) -> Self {
        Self::build(filters, primary.into(), Some(fallback), groups)
    }

    fn build(
        filters: FilterSet,
        primary: String,
        fallback: Option<HeaderFilter>,
        groups: &EquivalenceGroups,
    ) -> Self {
        let fallback = fallback.filter(|_| filters.resolve(&primary).is_none());
        let parser = filters
            .resolve(&primary)
            .or(fallback.as_ref())
            .map(HeaderFilter::parser)
            .cloned()
            .unwrap_or(ValueParser::Text);
        let equivalence = EquivalenceTable::parse(groups, &parser);
        Self {
            filters,
            primary,
            fallback,
            equivalence,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The configured primary comparison name.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn primary_filter(&self) -> Option<&HeaderFilter> {
        self.filters
            .resolve(&self.primary)
            .or(self.fallback.as_ref())
    }

    pub fn equivalence(&self) -> &EquivalenceTable {
        &self.equivalence
    }

    /// Filter a header or display name resolves to.
    pub fn resolve(&self, name: &str) -> Option<&HeaderFilter> {
        self.filters.resolve(name)
    }

    /// Filter registered for exactly `attribute`, the primary fallback included.
    pub fn filter_for(&self, attribute: &str) -> Option<&HeaderFilter> {
        self.filters
            .get(attribute)
            .or(self.fallback.as_ref().filter(|f| f.attribute() == attribute))
    }

    /// Attribute names in filter order, used as the column header for rows.
    pub fn preparsed_header(&self) -> Vec<String> {
        self.filters.attribute_names()
    }
}

/// Where an item sits in an assembly tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub position: String,
    pub parent_position: String,
    pub level: usize,
    /// Resolved after the whole tree is built.
    pub parent: Option<ItemId>,
}

/// One BOM line.
#[derive(Debug, Clone)]
pub struct Item {
    schema: Arc<ItemSchema>,
    values: BTreeMap<String, Value>,
    primary: String,
    placement: Option<Placement>,
}

impl Item {
    /// An item holding only the default identity values.
    pub fn blank(schema: Arc<ItemSchema>) -> Self {
        let primary = schema
            .primary_filter()
            .map(|f| f.attribute().to_string())
            .unwrap_or_else(|| attr::PART_NUMBER.to_string());
        let mut values = BTreeMap::new();
        values.insert(attr::PART_NUMBER.to_string(), Value::text(PART_NUMBER_DEFAULT));
        values.insert(attr::ITEM_CODE.to_string(), Value::text(""));
        values.insert(attr::ITEM_ID.to_string(), Value::text(""));
        values.insert(attr::CATEGORY.to_string(), Value::text(CATEGORY_DEFAULT));
        values.insert(attr::REVISION.to_string(), Value::text(REVISION_DEFAULT));
        values.insert(attr::DESCRIPTION.to_string(), Value::text(""));
        values.insert(attr::QUANTITY.to_string(), Value::Int(0));
        Self {
            schema,
            values,
            primary,
            placement: None,
        }
    }

    /// Build an item from one source row.
    ///
    /// Every header column is resolved to a filter; unmapped columns and
    /// columns for an attribute that was already set are skipped. Cells past
    /// the end of a short row leave the attribute empty.
    pub fn from_row(
        schema: &Arc<ItemSchema>,
        header: &HeaderIndex,
        row: &[String],
    ) -> Result<Self, SchemaError> {
        let mut item = Item::blank(Arc::clone(schema));
        let primary_filter = schema.primary_filter();
        let mut critical: Vec<(&str, bool)> = schema
            .filters()
            .iter()
            .filter(|f| f.is_critical())
            .map(|f| (f.attribute(), false))
            .collect();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut primary_found = false;

        for (name, index) in header.iter() {
            let Some(filter) = schema.resolve(name) else {
                continue;
            };
            let attribute = filter.attribute();
            if seen.contains(attribute) {
                continue;
            }

            if !primary_found {
                if let Some(primary) = primary_filter {
                    if primary.is_equivalent(filter) {
                        primary_found = true;
                        item.primary = primary.attribute().to_string();
                    }
                }
            }
            if let Some(entry) = critical.iter_mut().find(|(a, _)| *a == attribute) {
                entry.1 = true;
            }

            let Some(cell) = row.get(index) else {
                item.values.insert(attribute.to_string(), Value::Empty);
                continue;
            };
            let value = filter
                .parser()
                .parse(&clean_cell(cell))
                .map_err(|message| SchemaError::Parse {
                    attribute: attribute.to_string(),
                    header: name.to_string(),
                    message,
                })?;
            item.values.insert(attribute.to_string(), value);
            seen.insert(attribute);
        }

        if !primary_found {
            return Err(SchemaError::MissingPrimary {
                attribute: schema.primary().to_string(),
                header: header.names(),
            });
        }
        let missing: Vec<String> = critical
            .into_iter()
            .filter(|(_, found)| !found)
            .map(|(a, _)| a.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError::MissingCritical {
                missing,
                header: header.names(),
            });
        }

        item.split_item_id();
        Ok(item)
    }

    /// Carry `source` into another schema, copying every attribute the target
    /// schema declares. Placement is not carried over.
    pub fn rederive(schema: &Arc<ItemSchema>, source: &Item) -> Self {
        let mut item = Item::blank(Arc::clone(schema));
        for filter in schema.filters().iter() {
            if let Some(value) = source.values.get(filter.attribute()) {
                item.values
                    .insert(filter.attribute().to_string(), value.clone());
            }
        }
        item.primary = source.primary.clone();
        item
    }

    /// Fill category, part number and revision from a `CAT-NUMBER-REV` id,
    /// then derive `item_code` and `item_id`.
    ///
    /// Only attributes still at their default are filled.
    fn split_item_id(&mut self) {
        let composite = [attr::ITEM_ID, attr::ITEM_CODE]
            .into_iter()
            .map(|a| self.text(a))
            .find(|text| text.contains('-'));

        if let Some(composite) = composite {
            let parts: Vec<&str> = composite.split('-').collect();
            let category = parts[0];
            let number = parts.get(1).copied().unwrap_or_default();
            let revision = parts
                .get(2)
                .map(|r| r.to_string())
                .unwrap_or_else(|| self.text(attr::REVISION));

            if !looks_like_part_number(number) {
                warn!(id = %composite, number, "invalid part number in composite item id");
            }
            if self.text(attr::CATEGORY) == CATEGORY_DEFAULT {
                self.set(attr::CATEGORY, Value::text(category));
            }
            if self.text(attr::PART_NUMBER) == PART_NUMBER_DEFAULT {
                self.set(attr::PART_NUMBER, Value::text(number));
            }
            if self.text(attr::REVISION) == REVISION_DEFAULT {
                self.set(attr::REVISION, Value::text(revision));
            }
        }

        let category = self.text(attr::CATEGORY);
        let number = self.text(attr::PART_NUMBER);
        // Some part numbers already embed their category (PCB123).
        let code = if number.contains(&category) {
            number
        } else {
            format!("{category}-{number}")
        };
        let id = format!("{code}-{}", self.text(attr::REVISION));
        self.set(attr::ITEM_CODE, Value::text(code));
        self.set(attr::ITEM_ID, Value::text(id));
    }

    pub fn schema(&self) -> &Arc<ItemSchema> {
        &self.schema
    }

    /// Attribute holding this item's identity.
    pub fn primary_attribute(&self) -> &str {
        &self.primary
    }

    pub fn value(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute)
    }

    /// Value of `attribute`, or [`Value::Empty`] when unset.
    pub fn get(&self, attribute: &str) -> &Value {
        self.values.get(attribute).unwrap_or(&EMPTY)
    }

    /// Display text of `attribute`, empty when unset.
    pub fn text(&self, attribute: &str) -> String {
        self.get(attribute).to_string()
    }

    pub fn set(&mut self, attribute: &str, value: Value) {
        self.values.insert(attribute.to_string(), value);
    }

    pub fn primary_value(&self) -> &Value {
        self.get(&self.primary)
    }

    /// Primary value after equivalence mapping. Equality and hashing use this.
    pub fn identity(&self) -> &Value {
        let primary = self.primary_value();
        self.schema.equivalence().canonical(primary).unwrap_or(primary)
    }

    /// Order by raw primary value.
    pub fn cmp_primary(&self, other: &Item) -> Ordering {
        self.primary_value().cmp(other.primary_value())
    }

    /// Integer quantity; anything else counts as zero.
    pub fn quantity(&self) -> i64 {
        self.get(attr::QUANTITY).as_int().unwrap_or(0)
    }

    pub fn set_quantity(&mut self, quantity: i64) {
        self.set(attr::QUANTITY, Value::Int(quantity));
    }

    pub fn description(&self) -> String {
        self.text(attr::DESCRIPTION)
    }

    pub fn category(&self) -> String {
        self.text(attr::CATEGORY)
    }

    pub fn item_code(&self) -> String {
        self.text(attr::ITEM_CODE)
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    /// Tree position, once the item has been placed.
    pub fn position(&self) -> Option<&str> {
        self.placement.as_ref().map(|p| p.position.as_str())
    }

    pub(crate) fn set_placement(&mut self, placement: Placement) {
        self.set(attr::TREE_NUM, Value::text(placement.position.clone()));
        self.placement = Some(placement);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ItemId>) {
        if let Some(placement) = self.placement.as_mut() {
            placement.parent = parent;
        }
    }

    /// Attribute a display or header name resolves to for this item.
    pub fn resolve_attribute(&self, name: &str) -> Option<&str> {
        self.schema.resolve(name).map(HeaderFilter::attribute)
    }

    /// Attribute on `other` that pairs with this item's `attribute`.
    ///
    /// Two schemas may store the same column under aliased attribute names;
    /// this follows the alias so both values of a changed pair can be shown.
    pub fn counterpart_attribute<'s>(&self, other: &'s Item, attribute: &'s str) -> &'s str {
        if other.schema.filter_for(attribute).is_some() {
            return attribute;
        }
        let Some(own) = self.schema.filter_for(attribute) else {
            return attribute;
        };
        other
            .schema
            .filters()
            .iter()
            .find(|f| own.is_equivalent(f) || f.is_equivalent(own))
            .map(HeaderFilter::attribute)
            .unwrap_or(attribute)
    }

    /// Attributes among `names` whose values differ between the two items.
    ///
    /// Each name is resolved on both items independently. A name neither item
    /// knows is skipped; a name both items know must resolve to the same or
    /// equivalent filters.
    pub fn diff(&self, other: &Item, names: &[String]) -> Result<Vec<String>, DiffError> {
        let mut changed = Vec::new();
        for name in names {
            let (left, right) = match (self.schema.resolve(name), other.schema.resolve(name)) {
                (None, None) => continue,
                (Some(l), Some(r)) => {
                    if !(l.is_equivalent(r) || r.is_equivalent(l)) {
                        return Err(DiffError::AttributeConflict {
                            name: name.clone(),
                            left: l.attribute().to_string(),
                            right: r.attribute().to_string(),
                        });
                    }
                    (l.attribute(), r.attribute())
                }
                (Some(f), None) | (None, Some(f)) => (f.attribute(), f.attribute()),
            };
            if self.get(left) != other.get(right) {
                changed.push(left.to_string());
            }
        }
        Ok(changed)
    }

    /// `"<description>, QTY: <qty>, <CAT>-<NUMBER>"`.
    pub fn summary(&self) -> String {
        format!(
            "{}, QTY: {}, {}-{}",
            self.description(),
            self.get(attr::QUANTITY),
            self.category(),
            self.text(attr::PART_NUMBER)
        )
    }

    /// Display text of the named attributes, empty for unset ones.
    pub fn to_list<S: AsRef<str>>(&self, names: &[S]) -> Vec<String> {
        names.iter().map(|n| self.text(n.as_ref())).collect()
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.primary_value())
    }
}

fn looks_like_part_number(number: &str) -> bool {
    !number.is_empty() && number.chars().all(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::{attr, HeaderIndex, Item, ItemSchema};
    use crate::equivalence::EquivalenceGroups;
    use crate::error::{DiffError, SchemaError};
    use crate::header::{FilterSet, HeaderFilter, Matcher, ValueParser};
    use crate::value::Value;

    fn filters() -> FilterSet {
        let mut set = FilterSet::new();
        set.push(HeaderFilter::new("description", ValueParser::Text).with_headers(["Description"]));
        set.push(
            HeaderFilter::new("quantity", ValueParser::Quantity)
                .with_matcher(Matcher::predicate("__is_qty__").expect("builtin")),
        );
        set.push(
            HeaderFilter::new("part_number", ValueParser::CodeOrNumber)
                .with_headers(["Part Number"])
                .with_aliases(["item_code", "item_id"]),
        );
        set.push(HeaderFilter::new("item_code", ValueParser::Text).with_headers(["Item Code"]));
        set.push(HeaderFilter::new("item_id", ValueParser::Text).with_headers(["Item ID"]));
        set.push(HeaderFilter::new("category", ValueParser::Text).with_headers(["Category"]));
        set.push(HeaderFilter::new("revision", ValueParser::Revision).with_headers(["Rev"]));
        set
    }

    fn schema(groups: &[&[&str]]) -> Arc<ItemSchema> {
        let groups = EquivalenceGroups::new(
            groups
                .iter()
                .map(|g| g.iter().map(|s| s.to_string()).collect())
                .collect(),
        );
        Arc::new(ItemSchema::new(filters(), "part_number", &groups))
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn composite_id_fills_defaults() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Item ID", "Description", "qty"]);
        let item = Item::from_row(&schema, &header, &row(&["ASM-000100-01", "Frame", "2"]))
            .expect("valid row");

        assert_eq!(item.primary_attribute(), "part_number");
        assert_eq!(item.text(attr::PART_NUMBER), "000100");
        assert_eq!(item.category(), "ASM");
        assert_eq!(item.text(attr::REVISION), "01");
        assert_eq!(item.item_code(), "ASM-000100");
        assert_eq!(item.text(attr::ITEM_ID), "ASM-000100-01");
        assert_eq!(item.quantity(), 2);
    }

    #[test]
    fn dedicated_columns_win_over_composite_id() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Part Number", "Item Code", "Rev"]);
        let item = Item::from_row(&schema, &header, &row(&["200", "PCB-999", "3"]))
            .expect("valid row");
        assert_eq!(item.text(attr::PART_NUMBER), "200");
        assert_eq!(item.category(), "PCB");
        assert_eq!(item.text(attr::REVISION), "03");
        assert_eq!(item.item_code(), "PCB-200");
    }

    #[test]
    fn part_number_embedding_category_is_the_code() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Part Number", "Category"]);
        let item = Item::from_row(&schema, &header, &row(&["PCB0042", "PCB"])).expect("valid row");
        assert_eq!(item.item_code(), "PCB0042");
    }

    #[test]
    fn missing_primary_is_an_error() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Description"]);
        let err = Item::from_row(&schema, &header, &row(&["Frame"])).expect_err("no id column");
        assert!(matches!(err, SchemaError::MissingPrimary { .. }));
    }

    #[test]
    fn missing_critical_lists_every_field() {
        let mut filters = filters();
        filters.push(HeaderFilter::new("level", ValueParser::Level).critical(true));
        filters.push(HeaderFilter::new("owner", ValueParser::Text).critical(true));
        let schema = Arc::new(ItemSchema::new(filters, "part_number", &EquivalenceGroups::default()));
        let header = HeaderIndex::from_row(&["Part Number"]);
        let err = Item::from_row(&schema, &header, &row(&["1"])).expect_err("criticals absent");
        match err {
            SchemaError::MissingCritical { missing, .. } => {
                assert_eq!(missing, vec!["level".to_string(), "owner".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_failure_names_attribute_and_header() {
        let mut filters = filters();
        filters.push(HeaderFilter::new("weight", ValueParser::Float).with_headers(["Mass"]));
        let schema = Arc::new(ItemSchema::new(filters, "part_number", &EquivalenceGroups::default()));
        let header = HeaderIndex::from_row(&["Part Number", "Mass"]);
        let err = Item::from_row(&schema, &header, &row(&["1", "heavy"])).expect_err("bad float");
        match err {
            SchemaError::Parse {
                attribute, header, ..
            } => {
                assert_eq!(attribute, "weight");
                assert_eq!(header, "Mass");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn short_rows_leave_attributes_empty() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Part Number", "Description"]);
        let item = Item::from_row(&schema, &header, &row(&["7"])).expect("short row is fine");
        assert_eq!(item.get(attr::DESCRIPTION), &Value::Empty);
    }

    #[test]
    fn equivalent_items_compare_and_hash_equal() {
        let schema = schema(&[&["100", "200"]]);
        let header = HeaderIndex::from_row(&["Part Number"]);
        let x = Item::from_row(&schema, &header, &row(&["100"])).expect("valid");
        let y = Item::from_row(&schema, &header, &row(&["200"])).expect("valid");
        assert_eq!(x, y);

        let hash = |item: &Item| {
            let mut h = DefaultHasher::new();
            item.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&x), hash(&y));
    }

    #[test]
    fn diff_reports_changed_attributes() {
        let schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Item ID", "qty"]);
        let a = Item::from_row(&schema, &header, &row(&["ASM-000100-01", "2"])).expect("valid");
        let b = Item::from_row(&schema, &header, &row(&["ASM-000100-02", "2"])).expect("valid");
        let names = vec!["revision".to_string(), "Qty".to_string(), "Color".to_string()];
        assert_eq!(a.diff(&b, &names), Ok(vec!["revision".to_string()]));
    }

    #[test]
    fn counterpart_follows_declared_aliases() {
        let left = schema(&[]);
        let mut other = FilterSet::new();
        other.push(HeaderFilter::new("pn", ValueParser::Text).with_headers(["Part Number"]));
        other.push(
            HeaderFilter::new("code", ValueParser::Text)
                .with_headers(["Item Code"])
                .with_aliases(["item_code"]),
        );
        let right = Arc::new(ItemSchema::new(other, "pn", &EquivalenceGroups::default()));

        let a = Item::from_row(&left, &HeaderIndex::from_row(&["Part Number"]), &row(&["1"]))
            .expect("valid");
        let b = Item::from_row(
            &right,
            &HeaderIndex::from_row(&["Part Number", "Item Code"]),
            &row(&["1", "PRT-1"]),
        )
        .expect("valid");
        assert_eq!(a.counterpart_attribute(&b, "item_code"), "code");
        assert_eq!(a.counterpart_attribute(&b, "description"), "description");
        assert_eq!(b.get(a.counterpart_attribute(&b, "item_code")), &Value::text("PRT-1"));
    }

    #[test]
    fn conflicting_resolution_fails_loudly() {
        let left = schema(&[]);
        let mut other = FilterSet::new();
        other.push(HeaderFilter::new("part_number", ValueParser::Text).with_headers(["Part Number"]));
        other.push(HeaderFilter::new("notes", ValueParser::Text).with_headers(["Rev"]));
        let right = Arc::new(ItemSchema::new(other, "part_number", &EquivalenceGroups::default()));

        let a = Item::from_row(&left, &HeaderIndex::from_row(&["Part Number"]), &row(&["1"]))
            .expect("valid");
        let b = Item::from_row(&right, &HeaderIndex::from_row(&["Part Number"]), &row(&["1"]))
            .expect("valid");
        let err = a.diff(&b, &["Rev".to_string()]).expect_err("different attributes");
        assert!(matches!(err, DiffError::AttributeConflict { .. }));
    }

    #[test]
    fn fallback_primary_is_satisfied_by_an_alias_column() {
        let mut narrow = FilterSet::new();
        narrow.push(HeaderFilter::new("item_code", ValueParser::Text).with_headers(["Part number"]));
        narrow.push(HeaderFilter::new("name", ValueParser::Text).with_headers(["Name"]));
        let primary = HeaderFilter::new("part_number", ValueParser::CodeOrNumber)
            .with_aliases(["item_code", "item_id"]);
        let schema = Arc::new(ItemSchema::with_primary_fallback(
            narrow,
            "part_number",
            primary,
            &EquivalenceGroups::default(),
        ));

        let header = HeaderIndex::from_row(&["Name", "Part number"]);
        let item = Item::from_row(&schema, &header, &row(&["Bolt", "HDW-000777"])).expect("valid");
        assert_eq!(item.primary_attribute(), "part_number");
        assert_eq!(item.primary_value(), &Value::text("000777"));
        assert_eq!(item.item_code(), "HDW-000777");
    }

    #[test]
    fn rederive_copies_declared_attributes() {
        let source_schema = schema(&[]);
        let header = HeaderIndex::from_row(&["Item ID", "Description"]);
        let source = Item::from_row(&source_schema, &header, &row(&["CBL-000300-01", "Harness"]))
            .expect("valid");

        let mut narrow = FilterSet::new();
        narrow.push(HeaderFilter::new("part_number", ValueParser::Text));
        narrow.push(HeaderFilter::new("description", ValueParser::Text));
        let target = Arc::new(ItemSchema::new(narrow, "part_number", &EquivalenceGroups::default()));

        let copy = Item::rederive(&target, &source);
        assert_eq!(copy.description(), "Harness");
        assert_eq!(copy.text(attr::PART_NUMBER), "000300");
        assert_eq!(copy.category(), "XXX");
        assert_eq!(copy, source);
    }
}
