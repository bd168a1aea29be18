//! Responder adapters over the language-model service.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backoff::{backoff::Backoff, ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use postlab_types::ResponderSettings;

use crate::error::ResponderError;
use crate::prompt::TOPIC_PROMPT;
use crate::tokenizer::PromptTokenizer;

/// Something that answers a prompt with text.
///
/// `send` never fails: transport problems come back as a descriptive string,
/// which callers handle like any other response they cannot parse.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, prompt: &str) -> String;
}

#[async_trait]
impl<'a, R: Responder + ?Sized> Responder for &'a R {
    async fn send(&self, prompt: &str) -> String {
        (**self).send(prompt).await
    }
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Arc<R> {
    async fn send(&self, prompt: &str) -> String {
        (**self).send(prompt).await
    }
}

#[async_trait]
impl<R: Responder + ?Sized> Responder for Box<R> {
    async fn send(&self, prompt: &str) -> String {
        (**self).send(prompt).await
    }
}

/// Configuration for the Ollama-compatible responder.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Service base URL (e.g., "http://127.0.0.1:11434")
    pub base_url: String,

    /// Generation model (e.g., "llama3")
    pub model: String,

    /// Request timeout
    pub timeout: Duration,

    /// Prompt budget in tokens
    pub max_prompt_tokens: usize,

    /// Extra attempts on connection failures
    pub transport_retries: u32,
}

impl OllamaConfig {
    pub fn from_settings(settings: &ResponderSettings) -> Self {
        Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.generation_model.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
            max_prompt_tokens: settings.max_prompt_tokens,
            transport_retries: settings.transport_retries,
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self::from_settings(&ResponderSettings::default())
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
}

/// Responder talking to an Ollama-style `/api/generate` endpoint.
pub struct OllamaResponder {
    client: Client,
    config: OllamaConfig,
    tokenizer: Box<dyn PromptTokenizer>,
}

impl OllamaResponder {
    pub fn new(
        config: OllamaConfig,
        tokenizer: Box<dyn PromptTokenizer>,
    ) -> Result<Self, ResponderError> {
        if config.max_prompt_tokens == 0 {
            return Err(ResponderError::Config(
                "max_prompt_tokens must be > 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ResponderError::Config(e.to_string()))?;

        // The instructions alone must fit, or every item's keywords get cut.
        match tokenizer.count(TOPIC_PROMPT) {
            Ok(tokens) if tokens >= config.max_prompt_tokens => warn!(
                instruction_tokens = tokens,
                max_prompt_tokens = config.max_prompt_tokens,
                "Prompt instructions fill the token budget; item content will be truncated"
            ),
            Ok(tokens) => debug!(instruction_tokens = tokens, "Prompt instructions measured"),
            Err(e) => warn!(error = %e, "Could not measure prompt instructions"),
        }

        info!(
            base_url = %config.base_url,
            model = %config.model,
            tokenizer = tokenizer.name(),
            max_prompt_tokens = config.max_prompt_tokens,
            "Responder ready"
        );

        Ok(Self {
            client,
            config,
            tokenizer,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Cut the prompt to the token budget.
    ///
    /// A tokenizer failure leaves the prompt as is.
    pub fn truncate_prompt(&self, prompt: &str) -> String {
        match self.tokenizer.truncate(prompt, self.config.max_prompt_tokens) {
            Ok(Some(truncated)) => {
                warn!(
                    max_tokens = self.config.max_prompt_tokens,
                    original_chars = prompt.chars().count(),
                    truncated_chars = truncated.chars().count(),
                    "Prompt exceeds token budget, truncating"
                );
                truncated
            }
            Ok(None) => prompt.to_string(),
            Err(e) => {
                warn!(error = %e, "Could not measure prompt, sending it untruncated");
                prompt.to_string()
            }
        }
    }

    /// Generate a completion, retrying connection failures with backoff.
    pub async fn generate(&self, prompt: &str) -> Result<String, ResponderError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, "Calling generation endpoint");

            match self.make_request(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_connection() && attempts <= self.config.transport_retries => {
                    match backoff.next_backoff() {
                        Some(duration) => {
                            warn!(
                                error = %e,
                                retry_in_ms = duration.as_millis(),
                                "Connection failed, retrying"
                            );
                            tokio::time::sleep(duration).await;
                        }
                        None => return Err(e),
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Make a single request and join the streamed fragments.
    async fn make_request(&self, prompt: &str) -> Result<String, ResponderError> {
        let url = format!("{}/api/generate", self.config.base_url);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "Raw response received");

        if status != reqwest::StatusCode::OK {
            return Err(ResponderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        concat_stream(&body)
    }
}

#[async_trait]
impl Responder for OllamaResponder {
    async fn send(&self, prompt: &str) -> String {
        let prompt = self.truncate_prompt(prompt);
        debug!(chars = prompt.len(), "Sending prompt");

        match self.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Responder call failed");
                format!("Erro: {}", e)
            }
        }
    }
}

/// Join the `response` field of every newline-delimited JSON fragment.
///
/// Blank lines are skipped; any other line that is not JSON fails the whole
/// stream.
pub fn concat_stream(raw: &str) -> Result<String, ResponderError> {
    let mut text = String::new();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let chunk: GenerateChunk = serde_json::from_str(line).map_err(|e| {
            debug!(line = line_no + 1, content = %line, "Unparsable stream line");
            ResponderError::MalformedStream(format!("line {}: {}", line_no + 1, e))
        })?;
        text.push_str(&chunk.response);
    }
    Ok(text)
}
