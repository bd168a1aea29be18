//! # postlab-text
//!
//! Text normalization for social-media posts.
//!
//! ## Features
//! - Deterministic canonicalization of raw text (emoji, URL, mention and
//!   punctuation removal, lemmatization, stopword filtering, stemming)
//! - Configurable language profile (stopwords, lemma table)
//! - Record processor merging a post's title, media texts and hashtags into one
//!   combined document
//! - Parallel processing of whole corpora

pub mod error;
pub mod normalizer;
pub mod profile;
pub mod record;

pub use error::{NormalizeError, ProfileError};
pub use normalizer::{normalize, TextNormalizer};
pub use profile::LanguageProfile;
pub use record::{join_hashtags, ProcessedRecord, RecordProcessor};
