//! Responder error types.

use thiserror::Error;

/// Failures talking to the language-model service.
///
/// These never reach the labeling session as errors: the responder logs them
/// and hands back a descriptive string, which the session then treats like any
/// other unparsable response.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// Service answered with a non-200 status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Could not connect to the service
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Any other transport failure
    #[error("Request failed: {0}")]
    Request(String),

    /// A streamed line was not valid JSON
    #[error("Malformed response stream: {0}")]
    MalformedStream(String),

    /// Tokenizer could not be loaded or failed to encode/decode
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ResponderError {
    /// Whether a transport-level retry could help.
    pub fn is_connection(&self) -> bool {
        matches!(self, ResponderError::Connection(_))
    }
}

impl From<reqwest::Error> for ResponderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResponderError::Timeout(e.to_string())
        } else if e.is_connect() {
            ResponderError::Connection(e.to_string())
        } else {
            ResponderError::Request(e.to_string())
        }
    }
}
