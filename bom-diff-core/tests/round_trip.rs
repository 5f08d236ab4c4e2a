use std::sync::Arc;

use bom_diff_core::dialect::standard_line_to_item;
use bom_diff_core::error::SchemaError;
use bom_diff_core::item::attr;
use bom_diff_core::{
    AssemblyTree, Bom, Dialect, EquivalenceGroups, FilterSet, HeaderFilter, HeaderIndex, Item,
    ItemSchema, PositionSource, StructuredBom, TreeError, Value, ValueParser,
};
use pretty_assertions::assert_eq;

fn filters(structured: bool) -> FilterSet {
    let mut filters = FilterSet::new();
    if structured {
        filters.push(HeaderFilter::new("tree_num", ValueParser::TreeNumber).with_headers(["#"]));
    }
    filters.push(
        HeaderFilter::new("part_number", ValueParser::Text).with_aliases(["item_code", "item_id"]),
    );
    filters.push(HeaderFilter::new("item_code", ValueParser::Text).with_headers(["Item Code"]));
    filters.push(HeaderFilter::new("item_id", ValueParser::Text).with_headers(["Item ID"]));
    filters.push(HeaderFilter::new("description", ValueParser::Text).with_headers(["Description"]));
    filters.push(HeaderFilter::new("quantity", ValueParser::Quantity).with_headers(["Qty"]));
    filters
}

fn flat_dialect() -> Arc<Dialect> {
    let schema = ItemSchema::new(filters(false), "part_number", &EquivalenceGroups::default());
    Arc::new(Dialect::flat("flat", Arc::new(schema)))
}

fn structured_dialect() -> Arc<Dialect> {
    let schema = ItemSchema::new(filters(true), "part_number", &EquivalenceGroups::default());
    Arc::new(
        Dialect::structured("structured", Arc::new(schema), PositionSource::Explicit)
            .with_flat(flat_dialect()),
    )
}

fn rows(lines: &[&str]) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|l| l.split(',').map(str::to_string).collect())
        .collect()
}

fn tree() -> StructuredBom {
    StructuredBom::from_rows(
        "tree.csv",
        structured_dialect(),
        rows(&[
            "#,Item ID,Description,Qty",
            "1,ASM-000100-01,Frame,1",
            "1.1,PRT-000110-01,Rail,2",
            "1.2,PRT-000120-01,Bracket,4",
            "2,ASM-000200-01,Cover,1",
            "2.1,PRT-000120-01,Bracket,2",
        ]),
    )
    .expect("valid tree")
}

#[test]
fn flattened_tree_matches_the_equivalent_flat_list() {
    let tree = tree();
    let flattened = tree.flattened_bom();
    assert_eq!(flattened.dialect().name(), "flat");

    let flat = Bom::from_rows(
        "flat.csv",
        flat_dialect(),
        rows(&[
            "Item ID,Description,Qty",
            "ASM-000100-01,Frame,1",
            "PRT-000110-01,Rail,2",
            "PRT-000120-01,Bracket,6",
            "ASM-000200-01,Cover,1",
        ]),
    )
    .expect("valid rows");

    let diff = flattened.diff(&flat).expect("compatible");
    assert!(!diff.has_differences(), "{diff:?}");
    assert_eq!(diff.common_left.len(), 4);
}

#[test]
fn rebuilding_a_full_tree_keeps_its_shape() {
    let source = tree();
    let all: AssemblyTree<&Item> = source.tree().map(|id| &source[*id]);
    let rebuilt = StructuredBom::from_tree("copy", structured_dialect(), &all).expect("rebuild");

    let before: Vec<_> = source.iter_tree().map(|(d, p, _)| (d, p.to_string())).collect();
    let after: Vec<_> = rebuilt.iter_tree().map(|(d, p, _)| (d, p.to_string())).collect();
    assert_eq!(before, after);
    assert_eq!(rebuilt.to_rows()[1..], source.to_rows()[1..]);
}

#[test]
fn duplicate_branch_leaves_the_tree_unchanged() {
    let mut tree: AssemblyTree<&str> = AssemblyTree::new();
    tree.set_branch("1.1", "rail").expect("fresh slot");
    let len = tree.len();

    let err = tree.set_branch("1.1", "bracket").expect_err("occupied");
    assert_eq!(
        err,
        TreeError::DuplicatePosition {
            position: "1.1".to_string()
        }
    );
    assert_eq!(tree.len(), len);
    assert_eq!(tree.get("1.1"), Some(&"rail"));
    assert_eq!(tree.get("1"), None);
}

#[test]
fn missing_segments_are_reported() {
    let tree = tree();
    let err = tree.tree().branch("1.4.2").expect_err("no such node");
    assert_eq!(
        err,
        TreeError::PositionNotFound {
            requested: "1.4.2".to_string(),
            missing: "1.4".to_string(),
        }
    );
    let found = tree
        .get_item(&Value::text("000120"), attr::PART_NUMBER)
        .expect("all placed");
    let positions: Vec<_> = found.iter().map(|b| b.position()).collect();
    assert_eq!(positions, vec!["1.2", "2.1"]);
}

fn skip_reference_rows(
    schema: &Arc<ItemSchema>,
    header: &HeaderIndex,
    row: &[String],
) -> Result<Option<Item>, SchemaError> {
    let item = standard_line_to_item(schema, header, row)?;
    Ok(item.filter(|i| i.description() != "REFERENCE"))
}

fn shout(schema: &Arc<ItemSchema>, source: &Item) -> Item {
    let mut item = Item::rederive(schema, source);
    item.set(attr::DESCRIPTION, Value::text(source.description().to_uppercase()));
    item
}

#[test]
fn dialect_strategies_replace_item_construction() {
    let schema = Arc::new(ItemSchema::new(
        filters(false),
        "part_number",
        &EquivalenceGroups::default(),
    ));
    let custom = Arc::new(
        Dialect::flat("custom", schema)
            .with_line_to_item(skip_reference_rows)
            .with_item_to_item(shout),
    );
    let bom = Bom::from_rows(
        "custom.csv",
        Arc::clone(&custom),
        rows(&["Item ID,Description", "ASM-000100-01,Frame", "DOC-000900-01,REFERENCE"]),
    )
    .expect("valid rows");
    assert_eq!(bom.len(), 1);

    let copy = Bom::from_items("copy", custom, &bom);
    assert_eq!(copy[0].description(), "FRAME");
}
