//! Model configuration shared by all agent runners.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};

/// Model configuration for agent runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "anthropic/claude-sonnet-4").
    pub model: String,

    /// Maximum tokens to generate per run.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Seconds a single run may take before it is abandoned.
    #[serde(default = "default_stream_timeout_secs")]
    pub stream_timeout_secs: u64,

    /// Conversation turns included in each prompt.
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.3
}

fn default_stream_timeout_secs() -> u64 {
    60
}

fn default_history_turns() -> usize {
    10
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "anthropic/claude-sonnet-4".into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            stream_timeout_secs: default_stream_timeout_secs(),
            history_turns: default_history_turns(),
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration with the given model ID.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the per-run timeout.
    pub fn with_stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Set how many conversation turns are included in prompts.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// The per-run timeout.
    pub fn stream_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_timeout_secs)
    }

    /// Rejects values that would make every run fail.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AgentError::Configuration("model must not be empty".into()));
        }
        if self.max_tokens == 0 {
            return Err(AgentError::Configuration("max_tokens must be > 0".into()));
        }
        if self.stream_timeout_secs == 0 {
            return Err(AgentError::Configuration(
                "stream_timeout_secs must be > 0".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AgentError::Configuration(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        Ok(())
    }
}
