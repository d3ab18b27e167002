//! The seam between agent runners and the model backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use coach_models::AgentKind;

use crate::error::Result;

/// A message in a chat-style prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender ("system" or "user").
    pub role: String,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// One streaming generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The agent role making the request.
    pub agent: AgentKind,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub messages: Vec<ChatMessage>,
}

/// A backend that streams generated text as incremental tokens.
///
/// Implementations send each token on `tokens` as it arrives and return once
/// the response is finished. A closed receiver means the caller lost
/// interest; implementations should stop quietly rather than error.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Streams the response to `request` into `tokens`.
    async fn generate(&self, request: GenerationRequest, tokens: mpsc::Sender<String>)
        -> Result<()>;
}
