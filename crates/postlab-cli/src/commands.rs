//! Command implementations for the `postlab` binary.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use postlab_corpus::{combine_files, filter_empty, load, load_json, save};
use postlab_labeling::{
    load_prompt_tokenizer, LabelingSession, OllamaConfig, OllamaResponder, SessionConfig,
};
use postlab_text::{LanguageProfile, RecordProcessor, TextNormalizer};
use postlab_types::{Settings, TopicItem};

use crate::collector::SourceCollector;

/// Load settings from every configured source, then apply the log-level flag.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Normalize a corpus and write its combined documents.
pub fn preprocess(
    settings: &Settings,
    input: &Path,
    output: &Path,
    annotated: Option<&Path>,
    drop_empty: bool,
) -> Result<()> {
    let profile = LanguageProfile::from_settings(&settings.normalizer)
        .context("Failed to build language profile")?;
    info!(
        language = profile.language(),
        stopwords = profile.stopword_count(),
        "Language profile ready"
    );

    let records = load(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let processor = RecordProcessor::new(TextNormalizer::new(profile));
    let processed = processor.process_all(records);

    if let Some(path) = annotated {
        let records: Vec<_> = processed.iter().map(|p| &p.record).collect();
        save(path, &records).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), records = records.len(), "Annotated records saved");
    }

    let mut combined: Vec<String> = processed.into_iter().map(|p| p.combined).collect();
    let total = combined.len();
    if drop_empty {
        combined = filter_empty(combined);
    }

    save(output, &combined).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        path = %output.display(),
        documents = combined.len(),
        dropped = total - combined.len(),
        "Combined documents saved"
    );
    Ok(())
}

/// Merge collector outputs into a single corpus.
pub fn combine(inputs: &[impl AsRef<Path>], output: &Path) -> Result<()> {
    let report = combine_files(inputs, output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Merged {} file(s), skipped {}, {} element(s) -> {}",
        report.merged.len(),
        report.skipped.len(),
        report.elements,
        output.display()
    );
    for (path, reason) in &report.skipped {
        println!("  skipped {}: {}", path.display(), reason);
    }
    Ok(())
}

/// Drop blank entries from a list of combined documents.
pub fn clean(input: &Path, output: &Path) -> Result<()> {
    let documents: Vec<String> =
        load_json(input).with_context(|| format!("Failed to load {}", input.display()))?;
    let before = documents.len();
    let kept = filter_empty(documents);

    save(output, &kept).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(before, after = kept.len(), "Removed empty documents");
    println!("{} -> {} document(s)", before, kept.len());
    Ok(())
}

/// Label topic items and write the index -> label map.
pub async fn label(
    settings: &Settings,
    input: &Path,
    output: &Path,
    max_attempts: Option<u32>,
    concurrency: Option<usize>,
) -> Result<()> {
    let items: Vec<TopicItem> =
        load_json(input).with_context(|| format!("Failed to load {}", input.display()))?;
    if items.is_empty() {
        warn!(path = %input.display(), "No topic items to label");
    }

    // Hub downloads block; keep them off the async workers.
    let model = settings.responder.tokenizer_model.clone();
    let tokenizer = tokio::task::spawn_blocking(move || load_prompt_tokenizer(&model))
        .await
        .context("Tokenizer loading task failed")?
        .context("Failed to load prompt tokenizer")?;

    let config = OllamaConfig::from_settings(&settings.responder);
    let responder =
        OllamaResponder::new(config, tokenizer).context("Failed to create responder")?;

    let mut config = SessionConfig::from_settings(&settings.labeling);
    if let Some(n) = max_attempts {
        config = config.with_max_attempts(n);
    }
    if let Some(n) = concurrency {
        config = config.with_concurrency(n);
    }

    let session = LabelingSession::new(responder, config);
    let (result, stats) = session.label_all_with_stats(&items).await;

    save(output, &result).with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Labeled {}/{} item(s) ({} failed, {} call(s)) -> {}",
        stats.labeled,
        stats.items,
        stats.failed,
        stats.attempts,
        output.display()
    );
    Ok(())
}

/// Download a profile's posts and store them pretty-printed.
pub async fn collect(
    settings: &Settings,
    query: &str,
    output: &Path,
    url: Option<&str>,
) -> Result<()> {
    let mut collector_settings = settings.collector.clone();
    if let Some(url) = url {
        collector_settings.api_url = url.to_string();
    }
    if collector_settings.api_key.is_none() {
        warn!("No API credential configured (API_KEY); the request will be unauthenticated");
    }

    let collector = SourceCollector::from_settings(&collector_settings)?;
    let data = collector.fetch(query).await?;

    save(output, &data).with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), "Collected data saved");
    Ok(())
}

/// Print the effective settings with the credential masked.
pub fn show_config(settings: &Settings) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&settings.redacted())
        .context("Failed to render configuration")?;
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_preprocess_writes_combined_documents() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("out.json");
        let annotated = dir.path().join("annotated.json");
        fs::write(
            &input,
            r##"[{"title": "Dados abertos!", "hashtags": ["#Ciência"]}, {"title": ""}]"##,
        )
        .unwrap();

        preprocess(&Settings::default(), &input, &output, Some(&annotated), false).unwrap();

        let docs: Vec<String> = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(docs.len(), 2);
        assert!(!docs[0].is_empty());
        assert_eq!(docs[1], "");

        let records: Vec<serde_json::Value> =
            serde_json::from_slice(&fs::read(&annotated).unwrap()).unwrap();
        assert!(records[0].get("processed_title").is_some());
        assert!(records[1].get("processed_title").is_none());
    }

    #[test]
    fn test_preprocess_drop_empty() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("out.json");
        fs::write(&input, r#"[{"title": "Dados abertos"}, {}]"#).unwrap();

        preprocess(&Settings::default(), &input, &output, None, true).unwrap();

        let docs: Vec<String> = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_preprocess_rejects_envelope() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("raw.json");
        fs::write(&input, r#"{"data": []}"#).unwrap();

        let result = preprocess(
            &Settings::default(),
            &input,
            &dir.path().join("out.json"),
            None,
            false,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_clean() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("docs.json");
        let output = dir.path().join("clean.json");
        fs::write(&input, r#"["a b", "", "  ", "c"]"#).unwrap();

        clean(&input, &output).unwrap();

        let docs: Vec<String> = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(docs, vec!["a b", "c"]);
    }

    #[test]
    fn test_show_config() {
        assert!(show_config(&Settings::default()).is_ok());
    }
}
