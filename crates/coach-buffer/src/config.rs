//! Buffer configuration.

use std::time::Duration;

use serde::Serialize;

use crate::error::{BufferError, Result};

/// Configuration for the transcript buffer.
///
/// Read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferConfig {
    /// Word budget for a session's sliding window.
    pub max_buffer_words: usize,
    /// Pending word count that triggers processing.
    pub trigger_threshold_words: usize,
    /// How long an incomplete fragment may wait before it is processed anyway.
    pub incomplete_timeout: Duration,
    /// How long a session may go without new speech before it is reaped.
    pub session_idle_timeout: Duration,
    /// Processed chunks kept as context after a cycle.
    pub carry_over_chunks: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_buffer_words: 200,
            trigger_threshold_words: 20,
            incomplete_timeout: Duration::from_millis(3000),
            session_idle_timeout: Duration::from_secs(30 * 60),
            carry_over_chunks: 5,
        }
    }
}

impl BufferConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the word budget.
    pub fn with_max_buffer_words(mut self, words: usize) -> Self {
        self.max_buffer_words = words;
        self
    }

    /// Sets the word-count trigger.
    pub fn with_trigger_threshold_words(mut self, words: usize) -> Self {
        self.trigger_threshold_words = words;
        self
    }

    /// Sets the incomplete-fragment timeout.
    pub fn with_incomplete_timeout(mut self, timeout: Duration) -> Self {
        self.incomplete_timeout = timeout;
        self
    }

    /// Sets the idle-session timeout.
    pub fn with_session_idle_timeout(mut self, timeout: Duration) -> Self {
        self.session_idle_timeout = timeout;
        self
    }

    /// Sets how many processed chunks are carried over.
    pub fn with_carry_over_chunks(mut self, chunks: usize) -> Self {
        self.carry_over_chunks = chunks;
        self
    }

    /// Checks the thresholds are usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_words == 0 {
            return Err(BufferError::InvalidConfig(
                "max_buffer_words must be greater than zero".into(),
            ));
        }
        if self.trigger_threshold_words == 0 {
            return Err(BufferError::InvalidConfig(
                "trigger_threshold_words must be greater than zero".into(),
            ));
        }
        if self.trigger_threshold_words > self.max_buffer_words {
            return Err(BufferError::InvalidConfig(format!(
                "trigger_threshold_words ({}) exceeds max_buffer_words ({})",
                self.trigger_threshold_words, self.max_buffer_words
            )));
        }
        if self.incomplete_timeout.is_zero() {
            return Err(BufferError::InvalidConfig(
                "incomplete_timeout must be non-zero".into(),
            ));
        }
        if self.session_idle_timeout <= self.incomplete_timeout {
            return Err(BufferError::InvalidConfig(
                "session_idle_timeout must exceed incomplete_timeout".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BufferConfig::default();

        assert_eq!(config.max_buffer_words, 200);
        assert_eq!(config.trigger_threshold_words, 20);
        assert_eq!(config.incomplete_timeout, Duration::from_millis(3000));
        assert_eq!(config.carry_over_chunks, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = BufferConfig::new()
            .with_max_buffer_words(50)
            .with_trigger_threshold_words(10)
            .with_incomplete_timeout(Duration::from_millis(500))
            .with_session_idle_timeout(Duration::from_secs(60))
            .with_carry_over_chunks(2);

        assert_eq!(config.max_buffer_words, 50);
        assert_eq!(config.trigger_threshold_words, 10);
        assert_eq!(config.incomplete_timeout, Duration::from_millis(500));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(60));
        assert_eq!(config.carry_over_chunks, 2);
    }

    #[test]
    fn test_validate_rejects_bad_thresholds() {
        let zero = BufferConfig::new().with_max_buffer_words(0);
        assert!(matches!(zero.validate(), Err(BufferError::InvalidConfig(_))));

        let inverted = BufferConfig::new()
            .with_max_buffer_words(10)
            .with_trigger_threshold_words(20);
        assert!(inverted.validate().is_err());

        let idle = BufferConfig::new()
            .with_incomplete_timeout(Duration::from_secs(10))
            .with_session_idle_timeout(Duration::from_secs(5));
        assert!(idle.validate().is_err());
    }
}
