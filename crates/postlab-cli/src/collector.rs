//! Source collector: downloads a profile's posts from the source API.
//!
//! The response body is stored as returned. Envelopes (a single object
//! wrapping the post list) are left for the caller to unwrap before the
//! corpus is loaded.

use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, info};

use postlab_types::CollectorSettings;

/// HTTP client for the source API.
pub struct SourceCollector {
    client: Client,
    api_url: String,
    api_key: Option<SecretString>,
    limit: u32,
    timeout_secs: u64,
}

impl std::fmt::Debug for SourceCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceCollector")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "********"))
            .field("limit", &self.limit)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SourceCollector {
    pub fn from_settings(settings: &CollectorSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_url: settings.api_url.clone(),
            api_key: settings.api_key.clone().map(SecretString::from),
            limit: settings.limit,
            timeout_secs: settings.timeout_secs,
        })
    }

    /// Fetch the posts of `query` and return the parsed body.
    pub async fn fetch(&self, query: &str) -> Result<Value> {
        let start = Instant::now();
        info!(url = %self.api_url, query = %query, limit = self.limit, "Requesting posts");

        let mut request = self.client.get(&self.api_url).query(&[
            ("query", query.to_string()),
            ("limit", self.limit.to_string()),
            ("timeout", self.timeout_secs.to_string()),
        ]);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", key.expose_secret());
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.api_url))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        info!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Source API responded"
        );

        if !status.is_success() {
            bail!("Source API returned HTTP {}: {}", status.as_u16(), preview(&body));
        }

        let data: Value =
            serde_json::from_str(&body).context("Source API returned invalid JSON")?;
        debug!(preview = %preview(&body), "Received data");
        Ok(data)
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
