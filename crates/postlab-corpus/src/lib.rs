//! # postlab-corpus
//!
//! Flat-file storage for the pipeline: loads and saves JSON corpora, merges
//! several collector outputs into one file, and removes empty documents.

pub mod combine;
pub mod error;
pub mod filter;
pub mod store;

pub use combine::{combine, combine_files, CombineReport};
pub use error::CorpusError;
pub use filter::filter_empty;
pub use store::{is_json_path, load, load_json, read_document, save, to_pretty_json};
