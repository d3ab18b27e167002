//! OpenRouter streaming chat-completions backend.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::{AgentError, Result};
use crate::generator::{ChatMessage, GenerationRequest, TextGenerator};

/// Environment variable for OpenRouter API key.
pub const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// OpenRouter chat completions endpoint.
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Streaming OpenRouter client.
#[derive(Clone)]
pub struct OpenRouterClient {
    client: reqwest::Client,
    api_key: String,
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient").finish_non_exhaustive()
    }
}

impl OpenRouterClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Create a client from the `OPENROUTER_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(OPENROUTER_API_KEY_ENV).map_err(|_| {
            AgentError::Configuration(format!(
                "Missing {} environment variable",
                OPENROUTER_API_KEY_ENV
            ))
        })?;
        Ok(Self::new(api_key))
    }
}

#[derive(Debug, Serialize)]
struct StreamRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

impl<'a> StreamRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stream: true,
        }
    }

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Incremental parser for OpenAI-style server-sent events.
///
/// Bytes may split lines (and multi-byte characters) anywhere; only complete
/// lines are decoded and interpreted.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    done: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw bytes and returns the text deltas completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            if self.done {
                continue;
            }
            let line = match std::str::from_utf8(&raw) {
                Ok(line) => line.trim(),
                Err(e) => {
                    debug!(error = %e, "skipping SSE line with invalid UTF-8");
                    continue;
                }
            };
            if line.is_empty() {
                continue;
            }
            let Some(payload) = line.strip_prefix("data:") else {
                // Comments (": OPENROUTER PROCESSING") and other fields.
                continue;
            };
            let payload = payload.trim_start();
            if payload == "[DONE]" {
                self.done = true;
                continue;
            }

            match serde_json::from_str::<StreamChunk>(payload) {
                Ok(chunk) => deltas.extend(
                    chunk
                        .choices
                        .into_iter()
                        .filter_map(|c| c.delta.and_then(|d| d.content))
                        .filter(|s| !s.is_empty()),
                ),
                Err(e) => trace!(error = %e, "skipping unparseable SSE payload"),
            }
        }
        deltas
    }

    /// Whether the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate(
        &self,
        request: GenerationRequest,
        tokens: mpsc::Sender<String>,
    ) -> Result<()> {
        let body = StreamRequest::from_request(&request).encode()?;

        debug!(agent = %request.agent, model = %request.model, "Sending streaming chat request");

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "Live Coach")
            .body(body)
            .send()
            .await
            .map_err(|e| AgentError::ModelInvocation(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::ModelInvocation(format!(
                "OpenRouter API error {}: {}",
                status, text
            )));
        }

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AgentError::StreamInterrupted(e.to_string()))?;
            for delta in parser.push(&chunk) {
                if tokens.send(delta).await.is_err() {
                    debug!(agent = %request.agent, "Token receiver dropped, stopping stream");
                    return Ok(());
                }
            }
            if parser.is_done() {
                break;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(content: &str) -> String {
        format!(
            "data: {}\n\n",
            serde_json::json!({"choices": [{"delta": {"content": content}}]})
        )
    }

    #[test]
    fn test_sse_parser_extracts_deltas() {
        let mut parser = SseParser::new();
        let input = format!("{}{}data: [DONE]\n\n", data("CONF"), data("IDENCE: 80"));

        let deltas = parser.push(input.as_bytes());
        assert_eq!(deltas, vec!["CONF", "IDENCE: 80"]);
        assert!(parser.is_done());
    }

    #[test]
    fn test_sse_parser_handles_split_lines() {
        let mut parser = SseParser::new();
        let event = data("hello");
        let (a, b) = event.split_at(10);

        assert!(parser.push(a.as_bytes()).is_empty());
        assert_eq!(parser.push(b.as_bytes()), vec!["hello"]);
    }

    #[test]
    fn test_sse_parser_keeps_multibyte_chars_split_across_reads() {
        let mut parser = SseParser::new();
        let event = data("Tür");
        let bytes = event.as_bytes();
        let umlaut = event.find('ü').unwrap();
        let (a, b) = bytes.split_at(umlaut + 1);

        assert!(parser.push(a).is_empty());
        assert_eq!(parser.push(b), vec!["Tür"]);
    }

    #[test]
    fn test_sse_parser_skips_invalid_utf8_line() {
        let mut parser = SseParser::new();
        let mut input = b"data: \xff\xfe\n\n".to_vec();
        input.extend_from_slice(data("ok").as_bytes());

        assert_eq!(parser.push(&input), vec!["ok"]);
    }

    #[test]
    fn test_sse_parser_skips_comments_and_garbage() {
        let mut parser = SseParser::new();
        let input = format!(": OPENROUTER PROCESSING\n\ndata: {{not json\n\n{}", data("ok"));

        assert_eq!(parser.push(input.as_bytes()), vec!["ok"]);
        assert!(!parser.is_done());
    }

    #[test]
    fn test_sse_parser_ignores_after_done() {
        let mut parser = SseParser::new();
        let input = format!("data: [DONE]\n\n{}", data("late"));
        assert!(parser.push(input.as_bytes()).is_empty());
    }

    #[test]
    fn test_stream_request_serialization() {
        let request = GenerationRequest {
            agent: coach_models::AgentKind::Validation,
            model: "m".into(),
            max_tokens: 64,
            temperature: 0.2,
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
        };
        let bytes = StreamRequest::from_request(&request).encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["stream"], true);
        assert_eq!(json["max_tokens"], 64);
        assert_eq!(json["messages"][1]["role"], "user");
    }

    #[test]
    fn test_from_env_requires_key() {
        if std::env::var(OPENROUTER_API_KEY_ENV).is_err() {
            assert!(matches!(
                OpenRouterClient::from_env(),
                Err(AgentError::Configuration(_))
            ));
        }
    }
}
