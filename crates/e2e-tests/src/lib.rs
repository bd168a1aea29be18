//! End-to-end test infrastructure for postlab.
//!
//! Provides a shared TestHarness and fixture builders for tests that run
//! corpus files through the preprocessing and labeling pipelines.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{json, Value};

use postlab_text::{LanguageProfile, RecordProcessor, TextNormalizer};

/// Shared test harness: a scratch directory plus helpers to place fixtures in it.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Directory holding raw collector outputs
    pub raw_dir: PathBuf,
    /// Directory for pipeline outputs
    pub processed_dir: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let raw_dir = temp_dir.path().join("raw");
        let processed_dir = temp_dir.path().join("processed");

        std::fs::create_dir_all(&raw_dir).expect("Failed to create raw dir");
        std::fs::create_dir_all(&processed_dir).expect("Failed to create processed dir");

        Self {
            _temp_dir: temp_dir,
            raw_dir,
            processed_dir,
        }
    }

    /// Write `data` as JSON under the raw directory and return its path.
    pub fn write_raw<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> PathBuf {
        let path = self.raw_dir.join(name);
        let bytes = serde_json::to_vec(data).expect("Failed to serialize fixture");
        std::fs::write(&path, bytes).expect("Failed to write fixture");
        path
    }

    /// Write raw text under the raw directory and return its path.
    pub fn write_raw_text(&self, name: &str, text: &str) -> PathBuf {
        let path = self.raw_dir.join(name);
        std::fs::write(&path, text).expect("Failed to write fixture");
        path
    }

    /// Path for an output file.
    pub fn output(&self, name: &str) -> PathBuf {
        self.processed_dir.join(name)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a JSON file into a value.
pub fn read_json(path: &Path) -> Value {
    let bytes = std::fs::read(path).expect("Failed to read output");
    serde_json::from_slice(&bytes).expect("Output is not valid JSON")
}

/// Record processor with the default Portuguese profile.
pub fn portuguese_processor() -> RecordProcessor {
    RecordProcessor::new(TextNormalizer::new(LanguageProfile::portuguese()))
}

/// A collector-style post with every text field populated.
pub fn full_post(title: &str, media: &[&str], hashtags: &[&str]) -> Value {
    json!({
        "id": "post",
        "title": title,
        "text_on_media": media
            .iter()
            .map(|t| json!({"text_on_media": t}))
            .collect::<Vec<_>>(),
        "hashtags": hashtags,
    })
}

/// Sample corpus mixing complete, partial and empty posts.
pub fn sample_corpus() -> Vec<Value> {
    vec![
        full_post(
            "Manifestação pelos direitos das mulheres 🚀 https://exemplo.org/ato",
            &["Todas juntas na praça", "@coletivo convida"],
            &["#Feminismo", "#DireitosHumanos"],
        ),
        json!({"title": "Leitura da semana: autoras brasileiras"}),
        json!({"hashtags": ["#Ciência", "#Dados"]}),
        json!({"title": "", "text_on_media": [], "hashtags": []}),
        json!({"id": "sem texto"}),
    ]
}
