//! Orchestrator configuration and environment loading.

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use coach_agent::ModelConfig;
use coach_buffer::BufferConfig;

use crate::error::{OrchestratorError, Result};

/// Feature flags and timing for the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrchestratorConfig {
    pub enable_validation: bool,
    pub enable_clarification: bool,
    pub enable_follow_up: bool,
    pub enable_topic_analysis: bool,
    pub enable_topic_discovery: bool,
    /// Start topic discovery alongside validation instead of after it.
    pub parallel_validation_and_discovery: bool,
    /// How often the poller scans sessions.
    pub poll_interval: Duration,
    /// Validation confidence above which its feedback is surfaced.
    pub confidence_threshold: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            enable_validation: true,
            enable_clarification: true,
            enable_follow_up: true,
            enable_topic_analysis: true,
            enable_topic_discovery: true,
            parallel_validation_and_discovery: true,
            poll_interval: Duration::from_secs(2),
            confidence_threshold: 70,
        }
    }
}

impl OrchestratorConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the validation confidence threshold.
    pub fn with_confidence_threshold(mut self, threshold: u32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Enables or disables validation.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    /// Enables or disables clarification.
    pub fn with_clarification(mut self, enabled: bool) -> Self {
        self.enable_clarification = enabled;
        self
    }

    /// Enables or disables follow-up.
    pub fn with_follow_up(mut self, enabled: bool) -> Self {
        self.enable_follow_up = enabled;
        self
    }

    /// Enables or disables topic analysis.
    pub fn with_topic_analysis(mut self, enabled: bool) -> Self {
        self.enable_topic_analysis = enabled;
        self
    }

    /// Enables or disables topic discovery.
    pub fn with_topic_discovery(mut self, enabled: bool) -> Self {
        self.enable_topic_discovery = enabled;
        self
    }

    /// Runs topic discovery in parallel with validation, or after it.
    pub fn with_parallel_validation_and_discovery(mut self, parallel: bool) -> Self {
        self.parallel_validation_and_discovery = parallel;
        self
    }

    /// Checks the values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(OrchestratorError::Configuration(
                "poll_interval must be greater than zero".into(),
            ));
        }
        if self.confidence_threshold > 100 {
            return Err(OrchestratorError::Configuration(format!(
                "confidence_threshold must be at most 100, got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Every configuration surface of the engine, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct CoachConfig {
    pub buffer: BufferConfig,
    pub orchestrator: OrchestratorConfig,
    pub model: ModelConfig,
}

impl CoachConfig {
    /// Loads configuration from `COACH_*` environment variables over defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let buffer = &mut config.buffer;
        let orchestrator = &mut config.orchestrator;

        if let Some(v) = parse_var(&lookup, "COACH_MAX_BUFFER_WORDS")? {
            buffer.max_buffer_words = v;
        }
        if let Some(v) = parse_var(&lookup, "COACH_TRIGGER_THRESHOLD_WORDS")? {
            buffer.trigger_threshold_words = v;
        }
        if let Some(ms) = parse_var(&lookup, "COACH_INCOMPLETE_TIMEOUT_MS")? {
            buffer.incomplete_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var(&lookup, "COACH_SESSION_IDLE_TIMEOUT_MS")? {
            buffer.session_idle_timeout = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var(&lookup, "COACH_CARRY_OVER_CHUNKS")? {
            buffer.carry_over_chunks = v;
        }
        if let Some(ms) = parse_var(&lookup, "COACH_POLL_INTERVAL_MS")? {
            orchestrator.poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = parse_var(&lookup, "COACH_CONFIDENCE_THRESHOLD")? {
            orchestrator.confidence_threshold = v;
        }

        let flags: [(&str, &mut bool); 6] = [
            ("COACH_ENABLE_VALIDATION", &mut orchestrator.enable_validation),
            ("COACH_ENABLE_CLARIFICATION", &mut orchestrator.enable_clarification),
            ("COACH_ENABLE_FOLLOW_UP", &mut orchestrator.enable_follow_up),
            ("COACH_ENABLE_TOPIC_ANALYSIS", &mut orchestrator.enable_topic_analysis),
            ("COACH_ENABLE_TOPIC_DISCOVERY", &mut orchestrator.enable_topic_discovery),
            (
                "COACH_PARALLEL_VALIDATION_AND_DISCOVERY",
                &mut orchestrator.parallel_validation_and_discovery,
            ),
        ];
        for (key, slot) in flags {
            if let Some(raw) = lookup(key) {
                *slot = parse_bool(key, &raw)?;
            }
        }

        if let Some(model) = lookup("OPENROUTER_MODEL").filter(|m| !m.trim().is_empty()) {
            config.model.model = model.trim().to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks every section.
    pub fn validate(&self) -> Result<()> {
        self.buffer.validate()?;
        self.model.validate()?;
        self.orchestrator.validate()
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            OrchestratorError::Configuration(format!("{} has invalid value '{}'", key, raw))
        }),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OrchestratorError::Configuration(format!(
            "{} has invalid boolean '{}'",
            key, raw
        ))),
    }
}
