//! Core data models for the live coaching engine.
//!
//! This crate provides the types shared by every layer: transcript chunks,
//! agent roles, structured agent results, the per-session shared context and
//! the stream events delivered to callers.

pub mod agent;
pub mod context;
pub mod conversation;
pub mod event;
pub mod ids;
pub mod results;
pub mod transcript;

// Re-export main types
pub use agent::{AgentKind, Priority};
pub use context::SharedContext;
pub use conversation::{ConversationTurn, SessionSnapshot, TurnRole};
pub use event::{StreamEvent, StreamEventType};
pub use ids::{ChunkId, SessionId};
pub use results::{
    AgentMetadata, AgentStreamResult, ClarificationResult, FollowUpResult,
    TopicAnalysisResult, TopicDiscoveryResult, ValidationResult,
};
pub use transcript::{ends_sentence, word_count, TranscriptChunk};
