use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn bomdiff() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bomdiff"))
}

#[test]
fn flat_diff_reports_each_kind_of_difference() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--left-type")
        .arg("propel")
        .arg("--right-type")
        .arg("solidworks")
        .assert()
        .success()
        .stdout(predicate::str::contains("flat_left.csv (4)\tflat_right.csv (4)"))
        .stdout(predicate::str::contains("~ 000110  Rail"))
        .stdout(predicate::str::contains("    quantity: 2 != 4"))
        .stdout(predicate::str::contains("+ 000400  Harness"))
        .stdout(predicate::str::contains("- 000200  Controller Board"))
        .stdout(predicate::str::contains("Frame").not());
}

#[test]
fn show_common_lists_unchanged_items() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--show-common")
        .assert()
        .success()
        .stdout(predicate::str::contains("= 000100  Frame"));
}

#[test]
fn summary_prints_counts_only() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "matched=2 changed=1 left_only=1 right_only=1",
        ));
}

#[test]
fn ignored_categories_drop_items_from_the_diff() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--ignore-category")
        .arg("pcb")
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("left_only=0"));
}

#[test]
fn json_output_carries_counts_and_nested_report() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"has_differences\": true"))
        .stdout(predicate::str::contains("\"left_only\": 1"))
        .stdout(predicate::str::contains("\"header\": \"Top Level\""));
}

#[test]
fn yaml_report_is_written_to_output() {
    let dir = tempdir().expect("tempdir");
    let out_path = dir.path().join("report.yaml");

    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--format")
        .arg("yaml")
        .arg("--output")
        .arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let contents = fs::read_to_string(out_path).expect("report should be readable");
    assert!(contents.contains("header: Top Level"));
    assert!(contents.contains("Harness"));
}

#[test]
fn csv_table_has_one_column_per_shown_property() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "#,item_code,description,quantity,revision,item_code,description,quantity,revision",
        ));
}

#[test]
fn structured_diff_walks_moved_assemblies() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/tree_left.csv"))
        .arg(fixture("fixtures/tree_right.csv"))
        .arg("--structured")
        .arg("--left-type")
        .arg("solidworks")
        .arg("--right-type")
        .arg("propel")
        .assert()
        .success()
        .stdout(predicate::str::contains("---- Top Level ----"))
        .stdout(predicate::str::contains("    ---- 1  000100  Frame ----"))
        .stdout(predicate::str::contains("        ~ 000110  Rail"))
        .stdout(predicate::str::contains("            quantity: 2 != 3"))
        .stdout(predicate::str::contains("        + 000220  Lid"))
        .stdout(predicate::str::contains("        - 000210  Panel"))
        .stdout(predicate::str::contains("==== Top Level Assemblies ===="));
}

#[test]
fn structured_summary_covers_tree_and_top_level() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/tree_left.csv"))
        .arg(fixture("fixtures/tree_right.csv"))
        .arg("--structured")
        .arg("--left-type")
        .arg("solidworks")
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "structured: matched=3 changed=1 left_only=1 right_only=1",
        ))
        .stdout(predicate::str::contains(
            "top level: matched=2 changed=0 left_only=0 right_only=0",
        ));
}

#[test]
fn equivalent_items_are_matched() {
    let dir = tempdir().expect("tempdir");
    let right = dir.path().join("renumbered.csv");
    fs::write(
        &right,
        "Item ID,Description,Qty\nASM-000100-01,Frame,1\nPRT-000111-01,Rail,2\n",
    )
    .expect("write right BOM");
    let left = dir.path().join("original.csv");
    fs::write(
        &left,
        "Item ID,Description,Qty\nASM-000100-01,Frame,1\nPRT-000110-01,Rail,2\n",
    )
    .expect("write left BOM");
    let table = dir.path().join("equivalent_items.csv");
    fs::write(&table, "000110,000111\n").expect("write equivalents");

    bomdiff()
        .arg("diff")
        .arg(&left)
        .arg(&right)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("left_only=1 right_only=1"));

    bomdiff()
        .arg("diff")
        .arg(&left)
        .arg(&right)
        .arg("--equivalents")
        .arg(&table)
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("left_only=0 right_only=0"));
}

#[test]
fn equivalents_next_to_config_are_picked_up() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("bomdiff.toml");
    fs::write(&config, "show_common = true\ndiff_properties = [\"Description\"]\n")
        .expect("write settings");
    fs::write(dir.path().join("equivalent_items.csv"), "000110,000111\n")
        .expect("write equivalents");
    let left = dir.path().join("a.csv");
    fs::write(&left, "Item ID,Description\nPRT-000110-01,Rail\n").expect("write left BOM");
    let right = dir.path().join("b.csv");
    fs::write(&right, "Item ID,Description\nPRT-000111-01,Rail\n").expect("write right BOM");

    bomdiff()
        .arg("diff")
        .arg(&left)
        .arg(&right)
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("= 000110 / 000111  Rail"));
}

#[test]
fn unknown_primary_property_fails() {
    let dir = tempdir().expect("tempdir");
    let config = dir.path().join("bad.toml");
    fs::write(&config, "primary_prop = \"Serial\"\n").expect("write settings");

    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("'Serial' is an invalid property name"));
}

#[test]
fn unknown_dialect_lists_the_known_ones() {
    bomdiff()
        .arg("diff")
        .arg(fixture("fixtures/flat_left.csv"))
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--left-type")
        .arg("altium")
        .assert()
        .failure()
        .stderr(predicate::str::contains("known: propel, solidworks, onshape"));
}

#[test]
fn missing_primary_column_reports_the_row() {
    let dir = tempdir().expect("tempdir");
    let left = dir.path().join("no_ids.csv");
    fs::write(&left, "Description,Qty\nFrame,1\n").expect("write BOM");

    bomdiff()
        .arg("diff")
        .arg(&left)
        .arg(fixture("fixtures/flat_right.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("row 2"))
        .stderr(predicate::str::contains("primary comparison attribute 'part_number'"));
}

#[test]
fn refuses_to_overwrite_an_input() {
    let dir = tempdir().expect("tempdir");
    let left = dir.path().join("left.csv");
    fs::copy(fixture("fixtures/flat_left.csv"), &left).expect("copy fixture");

    bomdiff()
        .arg("diff")
        .arg(&left)
        .arg(fixture("fixtures/flat_right.csv"))
        .arg("--output")
        .arg(&left)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite input BOM"));
}
