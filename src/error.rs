//! Error types for Lola

use thiserror::Error;

/// Result type alias for Lola operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Lola
///
/// Tool-domain failures (no GPS fix, unknown contact, ...) are not errors at
/// this level: they travel to the LLM as [`crate::tools::ToolError`] payloads.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("LLM gateway returned HTTP {status}: {message}")]
    LlmStatus { status: u16, message: String },

    #[error("Tool registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether retrying the same gateway request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::LlmStatus { status, .. } => *status == 429 || *status >= 500,
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_classified() {
        let throttled = Error::LlmStatus { status: 429, message: "slow down".into() };
        let unavailable = Error::LlmStatus { status: 503, message: "busy".into() };
        let bad_request = Error::LlmStatus { status: 400, message: "bad".into() };

        assert!(throttled.is_transient());
        assert!(unavailable.is_transient());
        assert!(!bad_request.is_transient());
        assert!(!Error::Llm("no message".into()).is_transient());
    }

    #[test]
    fn test_display_includes_status() {
        let err = Error::LlmStatus { status: 502, message: "bad gateway".into() };
        assert_eq!(err.to_string(), "LLM gateway returned HTTP 502: bad gateway");
    }
}
