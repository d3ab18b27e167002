//! Error types for the agent crate.

use thiserror::Error;

/// Errors that can occur while generating agent output.
///
/// These never leave [`AgentRunner::run`](crate::AgentRunner::run); the
/// runner converts them into fallback results.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Model invocation failed before any output.
    #[error("model invocation failed: {0}")]
    ModelInvocation(String),

    /// The token stream broke off mid-response.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Response parsing failed.
    #[error("failed to parse response: {0}")]
    ResponseParse(String),

    /// The run exceeded its time budget.
    #[error("generation timed out after {0}s")]
    Timeout(u64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
