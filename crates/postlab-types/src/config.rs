//! Configuration loading for postlab.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/postlab/config.toml.
//! Settings are built once at startup and passed by reference to each stage.

use config::{Config, ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::PipelineError;

/// Environment variable names understood before the `POSTLAB__` scheme existed.
///
/// Each entry maps a legacy variable to its settings key.
const LEGACY_ENV_KEYS: &[(&str, &str)] = &[
    ("LLAMA_BASE_URL", "responder.base_url"),
    ("LLAMA_REQUEST_TIMEOUT", "responder.timeout_secs"),
    ("EMBEDDED_MODEL", "responder.embedding_model"),
    ("TOKENIZER_MODEL", "responder.tokenizer_model"),
    ("LLM_MODEL", "responder.generation_model"),
    ("API_KEY", "collector.api_key"),
];

/// Language-model service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderSettings {
    /// Base URL of the local model service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for topic generation
    #[serde(default = "default_generation_model")]
    pub generation_model: String,

    /// Embedding model name (recorded for the clustering stage, not used by the core)
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Tokenizer used to enforce the prompt budget.
    /// A HuggingFace repo id, or `cl100k_base` for the bundled BPE.
    #[serde(default = "default_tokenizer_model")]
    pub tokenizer_model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum prompt length in tokens; longer prompts are truncated
    #[serde(default = "default_max_prompt_tokens")]
    pub max_prompt_tokens: usize,

    /// Extra attempts on connection failures before reporting an error
    #[serde(default = "default_transport_retries")]
    pub transport_retries: u32,
}

fn default_base_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_generation_model() -> String {
    "llama3".to_string()
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

fn default_tokenizer_model() -> String {
    "neuralmind/bert-large-portuguese-cased".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_prompt_tokens() -> usize {
    4096
}

fn default_transport_retries() -> u32 {
    2
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            generation_model: default_generation_model(),
            embedding_model: default_embedding_model(),
            tokenizer_model: default_tokenizer_model(),
            timeout_secs: default_timeout_secs(),
            max_prompt_tokens: default_max_prompt_tokens(),
            transport_retries: default_transport_retries(),
        }
    }
}

/// Topic labeling session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingSettings {
    /// Attempts per item before recording the failure sentinel
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Items labeled concurrently (1 = strictly sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Accept a JSON object embedded in prose or a markdown fence
    #[serde(default)]
    pub extract_embedded_json: bool,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_concurrency() -> usize {
    1
}

impl Default for LabelingSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            concurrency: default_concurrency(),
            extract_embedded_json: false,
        }
    }
}

/// Text normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerSettings {
    /// Language profile identifier
    #[serde(default = "default_language")]
    pub language: String,

    /// Optional JSON object file mapping surface forms to lemmas
    #[serde(default)]
    pub lemma_table_path: Option<String>,

    /// Stopwords added on top of the language list
    #[serde(default)]
    pub extra_stopwords: Vec<String>,
}

fn default_language() -> String {
    "pt".to_string()
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            language: default_language(),
            lemma_table_path: None,
            extra_stopwords: Vec::new(),
        }
    }
}

/// Source collector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Endpoint returning a profile's posts
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Maximum number of posts requested
    #[serde(default = "default_collector_limit")]
    pub limit: u32,

    /// Request timeout in seconds (also forwarded to the API)
    #[serde(default = "default_collector_timeout")]
    pub timeout_secs: u64,

    /// API credential (loaded from env var, not stored in config file)
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    "https://osint.rest/api/instagram/user_photos".to_string()
}

fn default_collector_limit() -> u32 {
    10_000
}

fn default_collector_timeout() -> u64 {
    1000
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            limit: default_collector_limit(),
            timeout_secs: default_collector_timeout(),
            api_key: None,
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Language-model service
    #[serde(default)]
    pub responder: ResponderSettings,

    /// Topic labeling
    #[serde(default)]
    pub labeling: LabelingSettings,

    /// Text normalization
    #[serde(default)]
    pub normalizer: NormalizerSettings,

    /// Source collector
    #[serde(default)]
    pub collector: CollectorSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            responder: ResponderSettings::default(),
            labeling: LabelingSettings::default(),
            normalizer: NormalizerSettings::default(),
            collector: CollectorSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/postlab/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (POSTLAB_*, `__` between nested keys)
    /// 5. Legacy variable names (LLAMA_BASE_URL, LLM_MODEL, API_KEY, ...)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, PipelineError> {
        let config_dir = ProjectDirs::from("", "", "postlab")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("log_level", default_log_level())
            .map_err(config_err)?
            .set_default("responder.base_url", default_base_url())
            .map_err(config_err)?
            .set_default("responder.timeout_secs", default_timeout_secs() as i64)
            .map_err(config_err)?
            .set_default("labeling.max_attempts", default_max_attempts() as i64)
            .map_err(config_err)?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: POSTLAB_RESPONDER__BASE_URL, POSTLAB_LABELING__MAX_ATTEMPTS, etc.
        builder = builder.add_source(
            Environment::with_prefix("POSTLAB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("normalizer.extra_stopwords"),
        );

        builder = apply_legacy_env(builder)?;

        let config = builder.build().map_err(config_err)?;

        let settings: Settings = config.try_deserialize().map_err(config_err)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.labeling.max_attempts == 0 {
            return Err(PipelineError::Config(
                "labeling.max_attempts must be > 0".to_string(),
            ));
        }
        if self.labeling.concurrency == 0 {
            return Err(PipelineError::Config(
                "labeling.concurrency must be > 0".to_string(),
            ));
        }
        if self.responder.timeout_secs == 0 {
            return Err(PipelineError::Config(
                "responder.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.responder.max_prompt_tokens == 0 {
            return Err(PipelineError::Config(
                "responder.max_prompt_tokens must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Copy of the settings safe to print: the API credential is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.collector.api_key.is_some() {
            copy.collector.api_key = Some("********".to_string());
        }
        copy
    }
}

fn apply_legacy_env(
    mut builder: ConfigBuilder<config::builder::DefaultState>,
) -> Result<ConfigBuilder<config::builder::DefaultState>, PipelineError> {
    for (var, key) in LEGACY_ENV_KEYS {
        let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
        builder = builder
            .set_override_option(*key, value)
            .map_err(config_err)?;
    }
    Ok(builder)
}

fn config_err(e: config::ConfigError) -> PipelineError {
    PipelineError::Config(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.responder.base_url, "http://127.0.0.1:11434");
        assert_eq!(settings.responder.timeout_secs, 10);
        assert_eq!(settings.responder.generation_model, "llama3");
        assert_eq!(settings.responder.embedding_model, "all-minilm");
        assert_eq!(
            settings.responder.tokenizer_model,
            "neuralmind/bert-large-portuguese-cased"
        );
        assert_eq!(settings.labeling.max_attempts, 3);
        assert_eq!(settings.labeling.concurrency, 1);
        assert_eq!(settings.normalizer.language, "pt");
        assert!(settings.collector.api_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        let contents = concat!(
            "[labeling]\nmax_attempts = 5\nconcurrency = 4\n\n",
            "[responder]\ngeneration_model = \"llama3.1\"",
        );
        writeln!(file, "{}", contents).unwrap();

        let settings = Settings::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(settings.labeling.max_attempts, 5);
        assert_eq!(settings.labeling.concurrency, 4);
        assert_eq!(settings.responder.generation_model, "llama3.1");
    }

    #[test]
    fn test_validation_rejects_zero_attempts() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());

        settings.labeling.max_attempts = 0;
        assert!(matches!(settings.validate(), Err(PipelineError::Config(_))));

        settings.labeling.max_attempts = 3;
        settings.labeling.concurrency = 0;
        assert!(settings.validate().is_err());

        settings.labeling.concurrency = 1;
        settings.responder.max_prompt_tokens = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_redacted_masks_api_key() {
        let mut settings = Settings::default();
        settings.collector.api_key = Some("secret-token".to_string());

        let redacted = settings.redacted();
        assert_eq!(redacted.collector.api_key.as_deref(), Some("********"));
        assert_eq!(settings.collector.api_key.as_deref(), Some("secret-token"));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.labeling.max_attempts, settings.labeling.max_attempts);
        assert_eq!(decoded.responder.base_url, settings.responder.base_url);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let decoded: Settings =
            serde_json::from_str(r#"{"labeling": {"concurrency": 2}}"#).unwrap();
        assert_eq!(decoded.labeling.concurrency, 2);
        assert_eq!(decoded.labeling.max_attempts, 3);
        assert_eq!(decoded.log_level, "info");
    }
}
