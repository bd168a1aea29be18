//! End-to-end preprocessing tests: corpus file -> processed records -> cleaned
//! combined documents on disk.

use pretty_assertions::assert_eq;

use e2e_tests::{portuguese_processor, read_json, sample_corpus, TestHarness};
use postlab_corpus::{filter_empty, load, load_json, save, CorpusError};
use postlab_text::{normalize, LanguageProfile};

#[test]
fn test_corpus_to_clean_documents() {
    let harness = TestHarness::new();
    let input = harness.write_raw("corpus.json", &sample_corpus());

    let records = load(&input).unwrap();
    assert_eq!(records.len(), 5);

    let processed = portuguese_processor().process_all(records);
    let combined: Vec<String> = processed.iter().map(|p| p.combined.clone()).collect();

    // Order is preserved and posts with no text collapse to "".
    assert!(!combined[0].is_empty());
    assert!(!combined[1].is_empty());
    assert!(!combined[2].is_empty());
    assert_eq!(combined[3], "");
    assert_eq!(combined[4], "");

    let docs_path = harness.output("docs.json");
    save(&docs_path, &combined).unwrap();

    let cleaned = filter_empty(load_json::<String>(&docs_path).unwrap());
    assert_eq!(cleaned.len(), 3);
    assert_eq!(cleaned, combined[..3].to_vec());
}

#[test]
fn test_combined_documents_are_canonical() {
    let harness = TestHarness::new();
    let input = harness.write_raw("corpus.json", &sample_corpus());

    let processed = portuguese_processor().process_all(load(&input).unwrap());

    for doc in processed.iter().map(|p| &p.combined) {
        assert_eq!(doc.trim(), doc);
        assert!(!doc.contains("  "));
        assert!(!doc.contains("http"));
        assert!(!doc.contains('@'));
        assert!(!doc.contains('#'));
        assert!(doc.chars().all(|c| !c.is_uppercase()));
        assert!(doc.chars().all(|c| c.is_alphanumeric() || c == ' '));
    }
}

#[test]
fn test_hashtags_combine_to_normalized_words() {
    let harness = TestHarness::new();
    let input = harness.write_raw(
        "hashtags.json",
        &serde_json::json!([{"hashtags": ["#Ciência", "#Dados"]}]),
    );

    let processed = portuguese_processor().process_all(load(&input).unwrap());
    let expected = normalize("ciência dados", &LanguageProfile::portuguese());

    assert_eq!(processed[0].combined, expected);
    assert_eq!(
        processed[0].record.processed_hashtags.as_deref(),
        Some(expected.as_str())
    );
}

#[test]
fn test_annotated_records_keep_unknown_fields() {
    let harness = TestHarness::new();
    let input = harness.write_raw("corpus.json", &sample_corpus());

    let processed = portuguese_processor().process_all(load(&input).unwrap());
    let annotated: Vec<_> = processed.iter().map(|p| &p.record).collect();

    let out = harness.output("annotated.json");
    save(&out, &annotated).unwrap();
    let value = read_json(&out);

    assert_eq!(value[0]["id"], "post");
    assert_eq!(value[4]["id"], "sem texto");
    assert_eq!(value[0]["processed_text_on_media"].as_array().unwrap().len(), 2);
    assert!(value[3].get("processed_title").is_none());
}

#[test]
fn test_saved_output_is_pretty_utf8() {
    let harness = TestHarness::new();
    let out = harness.output("docs.json");
    save(&out, &vec!["ciência", "ação"]).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert_eq!(text, "[\n    \"ciência\",\n    \"ação\"\n]");
}

#[test]
fn test_envelope_and_wrong_extension_rejected() {
    let harness = TestHarness::new();

    let envelope = harness.write_raw("envelope.json", &serde_json::json!({"data": []}));
    assert!(matches!(load(&envelope), Err(CorpusError::NotASequence(_))));

    let csv = harness.write_raw_text("corpus.csv", "title\nolá\n");
    assert!(matches!(load(&csv), Err(CorpusError::UnsupportedFormat(_))));
}
