//! Read-only conversation data supplied by the session store.

use serde::{Deserialize, Serialize};

/// Speaker role for a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// The person asking questions.
    Interviewer,
    /// The person being interviewed.
    #[default]
    Respondent,
    /// System-generated note.
    System,
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interviewer => write!(f, "interviewer"),
            Self::Respondent => write!(f, "respondent"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A single turn of prior conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

impl ConversationTurn {
    /// Creates a new turn.
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Creates an interviewer turn.
    pub fn interviewer(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Interviewer, content)
    }

    /// Creates a respondent turn.
    pub fn respondent(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Respondent, content)
    }
}

/// Snapshot of a session's stored conversation, read once per cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Free-text description of the domain (e.g. the procedure being documented).
    #[serde(default)]
    pub domain_context: String,

    /// Prior conversation, oldest first.
    #[serde(default)]
    pub conversation_history: Vec<ConversationTurn>,

    /// Topics the interview is expected to cover.
    #[serde(default)]
    pub topics: Vec<String>,
}

impl SessionSnapshot {
    /// Returns the most recent `limit` turns, oldest first.
    pub fn recent_history(&self, limit: usize) -> &[ConversationTurn] {
        let start = self.conversation_history.len().saturating_sub(limit);
        &self.conversation_history[start..]
    }
}
