//! Streaming agent runner.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use coach_models::{AgentKind, AgentStreamResult};

use crate::config::ModelConfig;
use crate::contract::parse_metadata;
use crate::error::{AgentError, Result};
use crate::generator::{GenerationRequest, TextGenerator};
use crate::input::AgentInput;
use crate::prompts::{build_messages, fallback_message};

/// Capacity of the token channel between generator and runner.
const TOKEN_CHANNEL_CAPACITY: usize = 256;

/// Runs one agent role against a text generator.
///
/// A run never fails: generation errors, interrupted streams, timeouts and
/// empty output all resolve to a complete fallback result.
#[derive(Clone)]
pub struct AgentRunner {
    kind: AgentKind,
    generator: Arc<dyn TextGenerator>,
    config: ModelConfig,
}

impl std::fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRunner")
            .field("kind", &self.kind)
            .field("generator", &self.generator.name())
            .field("model", &self.config.model)
            .finish()
    }
}

impl AgentRunner {
    pub fn new(kind: AgentKind, generator: Arc<dyn TextGenerator>, config: ModelConfig) -> Self {
        Self {
            kind,
            generator,
            config,
        }
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Streams one run, calling `on_partial` with the cumulative text after
    /// every token batch, and returns the final result.
    pub async fn run<F>(&self, input: &AgentInput, mut on_partial: F) -> AgentStreamResult
    where
        F: FnMut(AgentStreamResult) + Send,
    {
        let request = GenerationRequest {
            agent: self.kind,
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            messages: build_messages(self.kind, input),
        };

        debug!(agent = %self.kind, generator = self.generator.name(), "Starting agent run");

        let timeout = self.config.stream_timeout();
        let outcome = match tokio::time::timeout(timeout, self.stream(request, &mut on_partial)).await
        {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout(timeout.as_secs())),
        };

        match outcome {
            Ok(content) if content.trim().is_empty() => {
                self.fallback(AgentError::ResponseParse("empty response".into()))
            }
            Ok(content) => {
                let metadata = parse_metadata(self.kind, &content);
                info!(agent = %self.kind, chars = content.len(), "Agent run complete");
                AgentStreamResult::complete(self.kind, content, metadata)
            }
            Err(e) => self.fallback(e),
        }
    }

    async fn stream<F>(&self, request: GenerationRequest, on_partial: &mut F) -> Result<String>
    where
        F: FnMut(AgentStreamResult) + Send,
    {
        let (tx, mut rx) = mpsc::channel::<String>(TOKEN_CHANNEL_CAPACITY);
        let kind = self.kind;

        let generation = self.generator.generate(request, tx);
        let consume = async {
            let mut content = String::new();
            while let Some(token) = rx.recv().await {
                content.push_str(&token);
                while let Ok(more) = rx.try_recv() {
                    content.push_str(&more);
                }
                on_partial(AgentStreamResult::partial(kind, content.clone()));
            }
            content
        };

        let (generated, content) = tokio::join!(generation, consume);
        generated?;
        Ok(content)
    }

    fn fallback(&self, error: AgentError) -> AgentStreamResult {
        warn!(agent = %self.kind, error = %error, "Agent run failed, using fallback");
        AgentStreamResult::fallback(self.kind, fallback_message(self.kind), error.to_string())
    }
}
