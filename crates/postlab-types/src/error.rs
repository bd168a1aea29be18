//! Error types shared across the pipeline.

use thiserror::Error;

/// Errors raised while assembling the pipeline's settings.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}
