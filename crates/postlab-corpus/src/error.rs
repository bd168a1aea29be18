//! Corpus error types.

use thiserror::Error;

/// Errors that can occur while reading or writing corpus files.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Path does not carry the `.json` extension
    #[error("Unsupported file format: {0} (only .json is accepted)")]
    UnsupportedFormat(String),

    /// Document parsed but is not a JSON array
    #[error("Document is not a JSON array: {0}")]
    NotASequence(String),

    /// File content is not UTF-8
    #[error("Invalid UTF-8 in {path}: {source}")]
    Encoding {
        path: String,
        #[source]
        source: std::str::Utf8Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
