//! Topic labeling session.
//!
//! Each item walks a small state machine:
//!
//! ```text
//! Pending -> AwaitingResponse(1) -> Succeeded
//!                  |
//!                  v (unparsable)
//!              Retry(1) -> AwaitingResponse(2) -> ... -> Exhausted
//! ```
//!
//! An item reaches `Exhausted` after exactly `max_attempts` unparsable
//! responses and is recorded as [`TopicOutcome::Failed`]. The session never
//! aborts: every input index ends up in the result.

use std::time::Instant;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use postlab_types::{LabelingSettings, TopicItem, TopicOutcome, TopicResult};

use crate::prompt::render_prompt;
use crate::responder::Responder;

/// Outcome of interpreting one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelParse {
    /// A usable label
    Parsed(String),
    /// Unusable response, with the reason
    Malformed(String),
}

/// Interpret a response as a JSON object and take its first entry's value.
///
/// The key is ignored; the caller's positional index is authoritative. With
/// `extract_embedded` set, a JSON object inside a markdown fence or
/// surrounding prose is also accepted.
pub fn parse_label(response: &str, extract_embedded: bool) -> LabelParse {
    let value = match serde_json::from_str::<Value>(response.trim()) {
        Ok(value) => value,
        Err(e) if extract_embedded => {
            match serde_json::from_str::<Value>(&extract_json(response)) {
                Ok(value) => value,
                Err(_) => return LabelParse::Malformed(format!("not JSON: {}", e)),
            }
        }
        Err(e) => return LabelParse::Malformed(format!("not JSON: {}", e)),
    };

    let Value::Object(map) = value else {
        return LabelParse::Malformed("not a JSON object".to_string());
    };

    let Some((_, first)) = map.into_iter().next() else {
        return LabelParse::Malformed("empty object".to_string());
    };

    let label = match first {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => return LabelParse::Malformed("null label".to_string()),
        Value::Array(_) | Value::Object(_) => {
            return LabelParse::Malformed("label is not a scalar".to_string())
        }
    };

    if label.is_empty() {
        LabelParse::Malformed("empty label".to_string())
    } else {
        LabelParse::Parsed(label)
    }
}

/// Pull a JSON object out of text that may wrap it in a code fence or prose.
fn extract_json(text: &str) -> String {
    if let Some(start) = text.find("```json") {
        if let Some(end) = text[start + 7..].find("```") {
            return text[start + 7..start + 7 + end].trim().to_string();
        }
    }

    if let Some(start) = text.find("```") {
        if let Some(end) = text[start + 3..].find("```") {
            return text[start + 3..start + 3 + end].trim().to_string();
        }
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
        if start < end {
            return text[start..=end].to_string();
        }
    }

    text.to_string()
}

/// Session parameters.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Attempts per item (at least 1)
    pub max_attempts: u32,
    /// Items in flight at once (at least 1)
    pub concurrency: usize,
    pub extract_embedded_json: bool,
}

impl SessionConfig {
    pub fn from_settings(settings: &LabelingSettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            concurrency: settings.concurrency.max(1),
            extract_embedded_json: settings.extract_embedded_json,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from_settings(&LabelingSettings::default())
    }
}

/// Per-item labeling state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    AwaitingResponse { attempt: u32 },
    Retry { attempt: u32 },
    Succeeded { label: String, attempt: u32 },
    Exhausted,
}

/// Counters for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelingStats {
    pub items: usize,
    pub labeled: usize,
    pub failed: usize,
    /// Responder calls made across all items
    pub attempts: u64,
}

/// Drives items through the responder until each is labeled or exhausted.
pub struct LabelingSession<R> {
    responder: R,
    config: SessionConfig,
}

impl<R: Responder> LabelingSession<R> {
    pub fn new(responder: R, config: SessionConfig) -> Self {
        Self { responder, config }
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Label a single item. Returns the outcome and the number of responder
    /// calls it took.
    pub async fn label_item(&self, index: usize, item: &TopicItem) -> (TopicOutcome, u32) {
        let prompt = render_prompt(item);
        let mut state = ItemState::Pending;

        loop {
            state = match state {
                ItemState::Pending => ItemState::AwaitingResponse { attempt: 1 },
                ItemState::AwaitingResponse { attempt } => {
                    let response = self.responder.send(&prompt).await;
                    match parse_label(&response, self.config.extract_embedded_json) {
                        LabelParse::Parsed(label) => {
                            debug!(index, attempt, label = %label, "Item labeled");
                            ItemState::Succeeded { label, attempt }
                        }
                        LabelParse::Malformed(reason) => {
                            warn!(
                                index,
                                attempt,
                                max_attempts = self.config.max_attempts,
                                reason = %reason,
                                "Unusable response"
                            );
                            debug!(index, response = %response, "Rejected response");
                            if attempt < self.config.max_attempts {
                                ItemState::Retry { attempt }
                            } else {
                                ItemState::Exhausted
                            }
                        }
                    }
                }
                ItemState::Retry { attempt } => ItemState::AwaitingResponse {
                    attempt: attempt + 1,
                },
                ItemState::Succeeded { label, attempt } => {
                    return (TopicOutcome::Labeled(label), attempt)
                }
                ItemState::Exhausted => {
                    error!(
                        index,
                        attempts = self.config.max_attempts,
                        "Attempts exhausted, recording failure"
                    );
                    return (TopicOutcome::Failed, self.config.max_attempts);
                }
            };
        }
    }

    /// Label every item; the result has exactly one entry per input index.
    pub async fn label_all(&self, items: &[TopicItem]) -> TopicResult {
        self.label_all_with_stats(items).await.0
    }

    /// Like [`label_all`](Self::label_all), also returning counters.
    pub async fn label_all_with_stats(&self, items: &[TopicItem]) -> (TopicResult, LabelingStats) {
        let start = Instant::now();
        info!(
            items = items.len(),
            concurrency = self.config.concurrency,
            max_attempts = self.config.max_attempts,
            "Labeling session started"
        );

        let outcomes: Vec<(usize, TopicOutcome, u32)> = stream::iter(items.iter().enumerate())
            .map(|(index, item)| async move {
                let (outcome, attempts) = self.label_item(index, item).await;
                (index, outcome, attempts)
            })
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        let mut stats = LabelingStats {
            items: items.len(),
            ..Default::default()
        };
        let mut result = TopicResult::new();
        for (index, outcome, attempts) in outcomes {
            stats.attempts += u64::from(attempts);
            if outcome.is_failed() {
                stats.failed += 1;
            } else {
                stats.labeled += 1;
            }
            result.insert(index, outcome);
        }

        info!(
            items = stats.items,
            labeled = stats.labeled,
            failed = stats.failed,
            attempts = stats.attempts,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Labeling session finished"
        );

        (result, stats)
    }
}

/// Convenience wrapper: label `items` sequentially with `max_attempts` per item.
pub async fn label_all<R: Responder>(
    items: &[TopicItem],
    responder: R,
    max_attempts: u32,
) -> TopicResult {
    let config = SessionConfig::default().with_max_attempts(max_attempts);
    LabelingSession::new(responder, config).label_all(items).await
}
