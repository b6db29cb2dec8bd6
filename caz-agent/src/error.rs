//! Request-level errors.

use thiserror::Error;

use caz_core::CoreError;
use caz_llm::LlmError;

/// Errors that fail a whole request.
///
/// Gate refusals and generation failures are not errors: the former are
/// normal outcomes and the latter degrade to a placeholder reply.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Persistence, configuration or state error from the core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Prompt could not be fitted to the context window.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// Logging could not be initialised.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, AgentError>;
