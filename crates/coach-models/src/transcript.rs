//! Transcript chunks produced by the speech capture layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChunkId, SessionId};

/// One unit of incrementally arriving transcribed speech.
///
/// Chunks are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptChunk {
    /// Unique identifier for the chunk.
    pub id: ChunkId,

    /// Session the chunk belongs to.
    pub session_id: SessionId,

    /// Transcribed text.
    pub content: String,

    /// When the chunk was received.
    pub timestamp: DateTime<Utc>,

    /// Whether the chunk is believed to end a sentence or thought.
    pub is_complete: bool,
}

impl TranscriptChunk {
    /// Creates a new chunk stamped with the current time.
    pub fn new(
        session_id: impl Into<SessionId>,
        content: impl Into<String>,
        is_complete: bool,
    ) -> Self {
        Self {
            id: ChunkId::new(),
            session_id: session_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            is_complete,
        }
    }

    /// Number of whitespace-separated words in the chunk.
    pub fn word_count(&self) -> usize {
        word_count(&self.content)
    }
}

/// Counts whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Heuristic sentence-boundary check used when the caller does not say
/// whether a fragment is complete.
pub fn ends_sentence(text: &str) -> bool {
    let trimmed = text.trim_end_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'');
    trimmed.ends_with(['.', '!', '?'])
}
