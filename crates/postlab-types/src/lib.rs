//! # postlab-types
//!
//! Shared domain types for the postlab pipeline.
//!
//! This crate defines the data structures exchanged between the pipeline stages:
//! - Post records: raw social-media posts as stored by the source collector
//! - Topic items and results: the unit of work and the output of topic labeling
//! - Settings: layered configuration shared by every component
//!
//! ## Usage
//!
//! ```rust
//! use postlab_types::{PostRecord, TopicItem};
//!
//! let record: PostRecord = serde_json::from_str(r#"{"title": "Olá"}"#).unwrap();
//! assert_eq!(record.title(), Some("Olá"));
//!
//! let item = TopicItem::new(["dados", "ciência", "dados"], "dado ciência");
//! assert_eq!(item.keywords, vec!["dados", "ciência"]);
//! ```

pub mod config;
pub mod error;
pub mod post;
pub mod topic;

pub use config::{
    CollectorSettings, LabelingSettings, NormalizerSettings, ResponderSettings, Settings,
};
pub use error::PipelineError;
pub use post::{MediaText, PostRecord};
pub use topic::{TopicItem, TopicOutcome, TopicResult, FAILURE_SENTINEL};
