//! Deterministic text generator for offline runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use coach_models::AgentKind;

use crate::error::{AgentError, Result};
use crate::generator::{GenerationRequest, TextGenerator};

/// Words sent per token.
const WORDS_PER_TOKEN: usize = 2;

fn default_response(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Validation => {
            "CONFIDENCE: 85\n\
             ISSUES:\n\
             - The step order was not confirmed\n\
             SUGGESTIONS:\n\
             - Ask the expert to restate the sequence\n\
             SUMMARY: The explanation is mostly consistent."
        }
        AgentKind::Clarification => {
            "QUESTIONS:\n\
             - Which tool do you use for that step?\n\
             - How do you know it is finished?\n\
             PRIORITY: medium\n\
             REASONING: Tools and completion criteria were not named."
        }
        AgentKind::FollowUp => {
            "QUESTION: What would go wrong if this step were skipped?\n\
             RATIONALE: Failure modes reveal tacit knowledge."
        }
        AgentKind::TopicAnalysis => {
            "COVERED: preparation\n\
             MISSING: safety checks, verification\n\
             COVERAGE: 33"
        }
        AgentKind::TopicDiscovery => {
            "NEW_TOPICS: tool calibration\n\
             RATIONALE: The expert mentioned calibrating before use."
        }
    }
}

/// Splits a response into tokens that concatenate back to the original.
fn tokenize(response: &str) -> Vec<String> {
    let words: Vec<&str> = response.split_inclusive(char::is_whitespace).collect();
    words
        .chunks(WORDS_PER_TOKEN)
        .map(|chunk| chunk.concat())
        .collect()
}

/// Streams canned responses per agent kind.
///
/// Failure injection makes a kind send half its tokens and then error, which
/// exercises the runner's mid-stream fallback path.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: HashMap<AgentKind, String>,
    failures: HashSet<AgentKind>,
    start_delays: HashMap<AgentKind, Duration>,
    token_delay: Option<Duration>,
    calls: Mutex<Vec<AgentKind>>,
}

impl ScriptedGenerator {
    /// A generator with the built-in canned response for every kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the response for one kind.
    pub fn with_response(mut self, kind: AgentKind, response: impl Into<String>) -> Self {
        self.responses.insert(kind, response.into());
        self
    }

    /// Makes every run of `kind` fail mid-stream.
    pub fn with_failure(mut self, kind: AgentKind) -> Self {
        self.failures.insert(kind);
        self
    }

    /// Waits before the first token of `kind`.
    pub fn with_start_delay(mut self, kind: AgentKind, delay: Duration) -> Self {
        self.start_delays.insert(kind, delay);
        self
    }

    /// Waits before every token.
    pub fn with_token_delay(mut self, delay: Duration) -> Self {
        self.token_delay = Some(delay);
        self
    }

    /// Kinds in the order their runs started.
    pub fn calls(&self) -> Vec<AgentKind> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of runs started for `kind`.
    pub fn call_count(&self, kind: AgentKind) -> usize {
        self.calls().iter().filter(|k| **k == kind).count()
    }

    fn response_for(&self, kind: AgentKind) -> &str {
        self.responses
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| default_response(kind))
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        tokens: mpsc::Sender<String>,
    ) -> Result<()> {
        let kind = request.agent;
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(kind);

        if let Some(delay) = self.start_delays.get(&kind) {
            tokio::time::sleep(*delay).await;
        }

        let all_tokens = tokenize(self.response_for(kind));
        let failing = self.failures.contains(&kind);
        let limit = if failing {
            all_tokens.len() / 2
        } else {
            all_tokens.len()
        };

        for token in all_tokens.into_iter().take(limit) {
            if let Some(delay) = self.token_delay {
                tokio::time::sleep(delay).await;
            }
            if tokens.send(token).await.is_err() {
                debug!(agent = %kind, "Token receiver dropped");
                return Ok(());
            }
        }

        if failing {
            return Err(AgentError::StreamInterrupted(format!(
                "scripted failure for {}",
                kind
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::parse_metadata;
    use coach_models::AgentMetadata;

    #[test]
    fn test_tokenize_round_trips() {
        let text = "CONFIDENCE: 85\nISSUES:\n- one  two";
        assert_eq!(tokenize(text).concat(), text);
        assert!(tokenize(text).len() > 1);
    }

    #[test]
    fn test_default_responses_parse() {
        let AgentMetadata::Validation(v) =
            parse_metadata(AgentKind::Validation, default_response(AgentKind::Validation))
        else {
            panic!("expected validation metadata");
        };
        assert_eq!(v.confidence, 85);
        assert_eq!(v.issues.len(), 1);

        for kind in AgentKind::ALL {
            assert_eq!(parse_metadata(kind, default_response(kind)).kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_records_calls() {
        let generator = ScriptedGenerator::new();
        let (tx, mut rx) = mpsc::channel(64);
        let request = GenerationRequest {
            agent: AgentKind::FollowUp,
            model: "m".into(),
            max_tokens: 10,
            temperature: 0.0,
            messages: vec![],
        };

        generator.generate(request, tx).await.unwrap();

        let mut text = String::new();
        while let Some(token) = rx.recv().await {
            text.push_str(&token);
        }
        assert_eq!(text, default_response(AgentKind::FollowUp));
        assert_eq!(generator.call_count(AgentKind::FollowUp), 1);
        assert_eq!(generator.calls(), vec![AgentKind::FollowUp]);
    }
}
