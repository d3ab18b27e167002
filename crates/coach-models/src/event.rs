//! Events delivered to the caller during a live session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::ids::SessionId;
use crate::results::AgentMetadata;

/// Kind of stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamEventType {
    /// An agent run started.
    AgentStart,
    /// An agent produced more text.
    AgentStream,
    /// An agent run finished (successfully or with its fallback).
    AgentComplete,
    /// The session's shared context changed.
    ContextUpdate,
    /// An agent run failed and degraded to its fallback.
    Error,
}

impl std::fmt::Display for StreamEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AgentStart => "agent_start",
            Self::AgentStream => "agent_stream",
            Self::AgentComplete => "agent_complete",
            Self::ContextUpdate => "context_update",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Uniform envelope for everything the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    pub event_type: StreamEventType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AgentMetadata>,

    pub session_id: SessionId,

    pub timestamp: DateTime<Utc>,
}

impl StreamEvent {
    fn new(event_type: StreamEventType, session_id: &SessionId) -> Self {
        Self {
            event_type,
            agent_type: None,
            content: None,
            metadata: None,
            session_id: session_id.clone(),
            timestamp: Utc::now(),
        }
    }

    /// An agent run started.
    pub fn agent_start(session_id: &SessionId, agent: AgentKind) -> Self {
        Self {
            agent_type: Some(agent),
            ..Self::new(StreamEventType::AgentStart, session_id)
        }
    }

    /// Accumulated text from a running agent.
    pub fn agent_stream(session_id: &SessionId, agent: AgentKind, content: impl Into<String>) -> Self {
        Self {
            agent_type: Some(agent),
            content: Some(content.into()),
            ..Self::new(StreamEventType::AgentStream, session_id)
        }
    }

    /// Final text and metadata from an agent.
    pub fn agent_complete(
        session_id: &SessionId,
        agent: AgentKind,
        content: impl Into<String>,
        metadata: Option<AgentMetadata>,
    ) -> Self {
        Self {
            agent_type: Some(agent),
            content: Some(content.into()),
            metadata,
            ..Self::new(StreamEventType::AgentComplete, session_id)
        }
    }

    /// Shared context changed; `content` carries the selected response.
    pub fn context_update(
        session_id: &SessionId,
        agent: AgentKind,
        selected: impl Into<String>,
        metadata: AgentMetadata,
    ) -> Self {
        Self {
            agent_type: Some(agent),
            content: Some(selected.into()),
            metadata: Some(metadata),
            ..Self::new(StreamEventType::ContextUpdate, session_id)
        }
    }

    /// An agent failed.
    pub fn error(session_id: &SessionId, agent: Option<AgentKind>, message: impl Into<String>) -> Self {
        Self {
            agent_type: agent,
            content: Some(message.into()),
            ..Self::new(StreamEventType::Error, session_id)
        }
    }

    /// Returns true if this is an error event.
    pub fn is_error(&self) -> bool {
        self.event_type == StreamEventType::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let session = SessionId::from("s1");

        let start = StreamEvent::agent_start(&session, AgentKind::Validation);
        assert_eq!(start.event_type, StreamEventType::AgentStart);
        assert_eq!(start.agent_type, Some(AgentKind::Validation));
        assert!(start.content.is_none());

        let stream = StreamEvent::agent_stream(&session, AgentKind::Validation, "CONFIDENCE: 8");
        assert_eq!(stream.content.as_deref(), Some("CONFIDENCE: 8"));

        let err = StreamEvent::error(&session, Some(AgentKind::FollowUp), "boom");
        assert!(err.is_error());
        assert!(!start.is_error());
    }

    #[test]
    fn test_event_serializes_type_field() {
        let event = StreamEvent::agent_start(&SessionId::from("s1"), AgentKind::FollowUp);
        let value: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "agent_start");
        assert_eq!(value["agent_type"], "follow-up");
        assert_eq!(value["session_id"], "s1");
        assert!(value.get("metadata").is_none());
    }

    #[test]
    fn test_event_type_display_matches_serde() {
        for ty in [
            StreamEventType::AgentStart,
            StreamEventType::AgentStream,
            StreamEventType::AgentComplete,
            StreamEventType::ContextUpdate,
            StreamEventType::Error,
        ] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json.trim_matches('"'), ty.to_string());
        }
    }
}
