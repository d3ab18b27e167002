//! Multi-agent orchestration for live interview coaching.
//!
//! The [`Orchestrator`] owns a [`TranscriptBuffer`](coach_buffer::TranscriptBuffer)
//! and, per session, a small state machine (`idle → triggering → active →
//! idle`). When buffered speech is ready it runs the agent dependency graph
//! from [`schedule`], streams every agent's output as [`StreamEvent`]s on the
//! session's channel, and accumulates results in a shared context from which
//! [`select_response`] picks the message to show.
//!
//! Triggers arrive two ways: on every [`Orchestrator::add_transcript_content`]
//! call, and from the [`Runtime`]'s poller, which catches timeout-based
//! triggers when no new speech arrives.
//!
//! [`StreamEvent`]: coach_models::StreamEvent

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod poller;
pub mod runtime;
pub mod schedule;
pub mod selector;
pub mod session;
pub mod store;

pub use config::{CoachConfig, OrchestratorConfig};
pub use error::{OrchestratorError, Result};
pub use orchestrator::Orchestrator;
pub use poller::CyclePoller;
pub use runtime::Runtime;
pub use selector::{select_response, ResponseSource, SelectedResponse, FALLBACK_PROMPT};
pub use session::SessionPhase;
pub use store::{ConversationStore, InMemoryConversationStore};
