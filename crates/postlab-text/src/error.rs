//! Text processing error types.

use thiserror::Error;

/// Errors raised while normalizing text.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// Input bytes are not well-formed UTF-8
    #[error("Encoding error: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Errors raised while building a language profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Language has no built-in resources
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// IO error reading a lemma table
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lemma table is not a JSON object of strings
    #[error("Invalid lemma table: {0}")]
    InvalidLemmaTable(String),
}
