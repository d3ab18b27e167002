//! Read access to per-session conversation data.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use coach_models::{ConversationTurn, SessionId, SessionSnapshot};

/// Source of domain context, conversation history and topics for a session.
///
/// Read once at the start of every cycle; the orchestrator never writes.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Current snapshot for the session; unknown sessions yield an empty one.
    async fn snapshot(&self, session_id: &SessionId) -> SessionSnapshot;
}

/// Process-local store, used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<SessionId, SessionSnapshot>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_domain_context(&self, session_id: &SessionId, domain: impl Into<String>) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.clone()).or_default().domain_context = domain.into();
    }

    pub async fn set_topics(&self, session_id: &SessionId, topics: Vec<String>) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session_id.clone()).or_default().topics = topics;
    }

    /// Appends a turn to the session's history.
    pub async fn push_turn(&self, session_id: &SessionId, turn: ConversationTurn) {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.clone())
            .or_default()
            .conversation_history
            .push(turn);
    }

    pub async fn remove(&self, session_id: &SessionId) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn snapshot(&self, session_id: &SessionId) -> SessionSnapshot {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}
