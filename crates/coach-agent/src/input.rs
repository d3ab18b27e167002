//! The context bundle handed to every agent run.

use serde::{Deserialize, Serialize};

use coach_models::{ConversationTurn, SessionSnapshot, SharedContext};

/// Everything an agent sees for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInput {
    /// Buffered transcript text for this cycle.
    pub current_transcript: String,
    pub domain_context: String,
    /// Most recent conversation turns, oldest first.
    pub recent_history: Vec<ConversationTurn>,
    /// Topics the interview is expected to cover.
    pub topics: Vec<String>,
    /// Results already completed by other agents.
    pub prior_context: SharedContext,
}

impl AgentInput {
    pub fn new(current_transcript: impl Into<String>) -> Self {
        Self {
            current_transcript: current_transcript.into(),
            ..Default::default()
        }
    }

    /// Builds an input from a stored session snapshot.
    pub fn from_snapshot(
        current_transcript: impl Into<String>,
        snapshot: &SessionSnapshot,
        history_limit: usize,
        prior_context: SharedContext,
    ) -> Self {
        Self {
            current_transcript: current_transcript.into(),
            domain_context: snapshot.domain_context.clone(),
            recent_history: snapshot.recent_history(history_limit).to_vec(),
            topics: snapshot.topics.clone(),
            prior_context,
        }
    }

    /// Replaces the prior context, keeping everything else.
    pub fn with_prior_context(mut self, prior_context: SharedContext) -> Self {
        self.prior_context = prior_context;
        self
    }
}
