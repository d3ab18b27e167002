//! Structured agent results and streaming emissions.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentKind, Priority};

/// Findings from the validation agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Confidence in the findings, 0-100.
    pub confidence: u32,
    /// Problems found in the transcript.
    pub issues: Vec<String>,
    /// Suggested corrections.
    pub suggestions: Vec<String>,
    /// One-line summary.
    pub summary: String,
}

/// Questions proposed by the clarification agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationResult {
    pub questions: Vec<String>,
    pub priority: Priority,
    pub reasoning: String,
}

/// The next question proposed by the follow-up agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpResult {
    pub question: String,
    pub rationale: String,
}

/// Coverage of the expected topic list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicAnalysisResult {
    pub covered_topics: Vec<String>,
    pub missing_topics: Vec<String>,
    /// Percentage of expected topics covered, 0-100.
    pub coverage: u32,
}

/// Topics surfaced that were not on the expected list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDiscoveryResult {
    pub new_topics: Vec<String>,
    pub rationale: String,
}

/// Structured fields extracted from one completed agent run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "kebab-case")]
pub enum AgentMetadata {
    Validation(ValidationResult),
    Clarification(ClarificationResult),
    FollowUp(FollowUpResult),
    TopicAnalysis(TopicAnalysisResult),
    TopicDiscovery(TopicDiscoveryResult),
}

impl AgentMetadata {
    /// The agent kind this metadata belongs to.
    pub fn kind(&self) -> AgentKind {
        match self {
            Self::Validation(_) => AgentKind::Validation,
            Self::Clarification(_) => AgentKind::Clarification,
            Self::FollowUp(_) => AgentKind::FollowUp,
            Self::TopicAnalysis(_) => AgentKind::TopicAnalysis,
            Self::TopicDiscovery(_) => AgentKind::TopicDiscovery,
        }
    }

    /// Default (empty) metadata for an agent kind.
    pub fn empty(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Validation => Self::Validation(ValidationResult::default()),
            AgentKind::Clarification => Self::Clarification(ClarificationResult::default()),
            AgentKind::FollowUp => Self::FollowUp(FollowUpResult::default()),
            AgentKind::TopicAnalysis => Self::TopicAnalysis(TopicAnalysisResult::default()),
            AgentKind::TopicDiscovery => Self::TopicDiscovery(TopicDiscoveryResult::default()),
        }
    }
}

/// One emission from an agent run.
///
/// `content` always carries the full accumulated text, never a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStreamResult {
    pub agent_type: AgentKind,
    pub content: String,
    pub is_complete: bool,
    /// Present only on the final emission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AgentMetadata>,
    /// Why the run degraded to its fallback message, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentStreamResult {
    /// A partial emission carrying the text accumulated so far.
    pub fn partial(agent_type: AgentKind, content: impl Into<String>) -> Self {
        Self {
            agent_type,
            content: content.into(),
            is_complete: false,
            metadata: None,
            error: None,
        }
    }

    /// A successful final emission.
    pub fn complete(agent_type: AgentKind, content: impl Into<String>, metadata: AgentMetadata) -> Self {
        Self {
            agent_type,
            content: content.into(),
            is_complete: true,
            metadata: Some(metadata),
            error: None,
        }
    }

    /// A degraded final emission with default metadata.
    pub fn fallback(
        agent_type: AgentKind,
        message: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            agent_type,
            content: message.into(),
            is_complete: true,
            metadata: Some(AgentMetadata::empty(agent_type)),
            error: Some(error.into()),
        }
    }

    /// Whether the run degraded to its fallback.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
