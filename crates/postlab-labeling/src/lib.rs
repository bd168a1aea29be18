//! # postlab-labeling
//!
//! Assigns a topic label to each keyword/text item by prompting a language
//! model, retrying unusable answers a bounded number of times.
//!
//! ## Components
//!
//! - [`Responder`]: anything that answers a prompt with text. [`OllamaResponder`]
//!   talks to an Ollama-compatible `/api/generate` endpoint.
//! - [`PromptTokenizer`]: keeps prompts inside the model's token budget.
//! - [`LabelingSession`]: drives every item to a label or the failure sentinel.
//!
//! ## Usage
//!
//! ```rust
//! use postlab_labeling::{LabelingSession, ScriptedResponder, SessionConfig};
//! use postlab_types::TopicItem;
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let session = LabelingSession::new(
//!         ScriptedResponder::always(r#"{"0": "Saúde"}"#),
//!         SessionConfig::default(),
//!     );
//!     let items = vec![TopicItem::new(["vacina", "sus"], "vacina sus")];
//!     let result = session.label_all(&items).await;
//!     assert_eq!(result.get(0).and_then(|o| o.label()), Some("Saúde"));
//! });
//! ```

pub mod error;
pub mod mock;
pub mod prompt;
pub mod responder;
pub mod session;
pub mod tokenizer;

pub use error::ResponderError;
pub use mock::ScriptedResponder;
pub use prompt::{render_prompt, TOPIC_PROMPT};
pub use responder::{concat_stream, OllamaConfig, OllamaResponder, Responder};
pub use session::{
    label_all, parse_label, ItemState, LabelParse, LabelingSession, LabelingStats, SessionConfig,
};
pub use tokenizer::{
    load_prompt_tokenizer, HfPromptTokenizer, PromptTokenizer, TiktokenPromptTokenizer,
    TIKTOKEN_MODEL,
};
