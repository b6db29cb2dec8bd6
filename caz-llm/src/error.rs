//! LLM error types.

use thiserror::Error;

/// Errors from the tokenizer/generation service and prompt assembly.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("LLM request failed: {0}")]
    RequestFailed(String),

    /// The service answered with something unparseable.
    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    /// Request timed out.
    #[error("LLM request timed out after {0}ms")]
    Timeout(u64),

    /// Service is unreachable.
    #[error("LLM provider unavailable: {0}")]
    Unavailable(String),

    /// Configuration error.
    #[error("LLM configuration error: {0}")]
    ConfigError(String),

    /// Even the bare message does not fit the context budget.
    #[error("Prompt of {tokens} tokens exceeds the budget of {budget} even without history")]
    PromptOverflow {
        /// Tokens in the smallest prompt tried.
        tokens: usize,
        /// Tokens available for the prompt.
        budget: usize,
    },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else if err.is_connect() {
            LlmError::Unavailable(err.to_string())
        } else {
            LlmError::RequestFailed(err.to_string())
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, LlmError>;
