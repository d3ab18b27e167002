//! Error types for the orchestrator crate.

use thiserror::Error;

/// Errors that can occur while setting up or running the orchestrator.
///
/// Per-session operations never fail; unknown sessions are no-ops.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Buffer configuration was rejected.
    #[error("buffer error: {0}")]
    Buffer(#[from] coach_buffer::BufferError),

    /// Agent backend could not be set up.
    #[error("agent error: {0}")]
    Agent(#[from] coach_agent::AgentError),

    /// Runtime not started.
    #[error("runtime not started")]
    NotStarted,

    /// Runtime already started.
    #[error("runtime already started")]
    AlreadyStarted,

    /// Shutdown error.
    #[error("shutdown error: {0}")]
    Shutdown(String),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
