//! End-to-end tests for merging collector outputs.

use pretty_assertions::assert_eq;
use serde_json::json;

use e2e_tests::{read_json, TestHarness};
use postlab_corpus::{combine, combine_files, load};

#[test]
fn test_array_and_object_files() {
    let harness = TestHarness::new();
    let array = harness.write_raw("a.json", &json!([{"title": "x"}, {"title": "y"}]));
    let object = harness.write_raw("b.json", &json!({"title": "z"}));

    let merged = combine(&[array, object]);

    assert_eq!(merged, vec![json!({"title": "x"}), json!({"title": "y"})]);
}

#[test]
fn test_combine_files_reports_and_round_trips_into_load() {
    let harness = TestHarness::new();
    let first = harness.write_raw("perfil_a.json", &json!([{"title": "Olá"}]));
    let second = harness.write_raw(
        "perfil_b.json",
        &json!([{"hashtags": ["#Arte"]}, {"title": "Tchau"}]),
    );
    let broken = harness.write_raw_text("quebrado.json", "[{");
    let missing = harness.raw_dir.join("ausente.json");
    let text = harness.write_raw_text("notas.txt", "[]");

    let output = harness.output("combined.json");
    let report = combine_files(&[first, second, broken, missing, text], &output).unwrap();

    assert_eq!(report.merged.len(), 2);
    assert_eq!(report.skipped.len(), 3);
    assert_eq!(report.elements, 3);

    assert_eq!(read_json(&output).as_array().unwrap().len(), 3);

    let records = load(&output).unwrap();
    assert_eq!(records[0].title(), Some("Olá"));
    assert_eq!(records[2].title(), Some("Tchau"));
}

#[test]
fn test_no_valid_inputs_writes_empty_array() {
    let harness = TestHarness::new();
    let output = harness.output("combined.json");

    let report = combine_files(&[harness.raw_dir.join("nada.json")], &output).unwrap();

    assert_eq!(report.elements, 0);
    assert_eq!(read_json(&output), json!([]));
}
