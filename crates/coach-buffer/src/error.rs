//! Error types for the buffer crate.

use thiserror::Error;

/// Errors raised by the buffer.
///
/// Buffer operations themselves never fail; only configuration is checked.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Configuration values are unusable.
    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for buffer operations.
pub type Result<T> = std::result::Result<T, BufferError>;
