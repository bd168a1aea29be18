//! Record processing: normalizes a post's text fields and merges them into a
//! single combined document.

use rayon::prelude::*;
use tracing::{debug, info};

use postlab_types::PostRecord;

use crate::normalizer::TextNormalizer;

/// A post after processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    /// Input record annotated with `processed_*` fields
    pub record: PostRecord,
    /// Canonical title, media texts and hashtags joined by single spaces
    pub combined: String,
}

/// Applies the normalizer across a post's fields.
#[derive(Debug)]
pub struct RecordProcessor {
    normalizer: TextNormalizer,
}

impl RecordProcessor {
    pub fn new(normalizer: TextNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    /// Normalize every present field of `record` and build its combined document.
    ///
    /// Fields that are missing or empty contribute nothing and get no
    /// `processed_*` annotation.
    pub fn process(&self, mut record: PostRecord) -> ProcessedRecord {
        let mut fragments: Vec<String> = Vec::new();

        if let Some(title) = record.title() {
            let processed = self.normalizer.normalize(title);
            fragments.push(processed.clone());
            record.processed_title = Some(processed);
        }

        if let Some(media) = record.media_texts() {
            let processed: Vec<String> = media
                .iter()
                .map(|m| self.normalizer.normalize(m.text()))
                .collect();
            fragments.extend(processed.iter().cloned());
            record.processed_text_on_media = Some(processed);
        }

        if let Some(hashtags) = record.hashtags() {
            let processed = self.normalizer.normalize(&join_hashtags(hashtags));
            fragments.push(processed.clone());
            record.processed_hashtags = Some(processed);
        }

        let combined = combine_fragments(&fragments);
        ProcessedRecord { record, combined }
    }

    /// Process a corpus in parallel. Output order matches input order.
    pub fn process_all(&self, records: Vec<PostRecord>) -> Vec<ProcessedRecord> {
        let total = records.len();
        info!(records = total, "Processing records");

        let processed: Vec<ProcessedRecord> =
            records.into_par_iter().map(|r| self.process(r)).collect();

        let empty = processed.iter().filter(|p| p.combined.is_empty()).count();
        debug!(records = total, empty, "Finished processing records");
        processed
    }
}

/// Strip leading `#` markers and join the hashtags with spaces.
pub fn join_hashtags(hashtags: &[String]) -> String {
    hashtags
        .iter()
        .map(|tag| tag.trim_start_matches('#'))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join non-empty fragments with single spaces.
fn combine_fragments(fragments: &[String]) -> String {
    fragments
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
