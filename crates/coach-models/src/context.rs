//! Per-session accumulation of completed agent results.

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::results::{
    AgentMetadata, ClarificationResult, FollowUpResult, TopicAnalysisResult,
    TopicDiscoveryResult, ValidationResult,
};

/// The last completed structured result of each agent for one session.
///
/// Each slot is overwritten, never appended, when its agent completes again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clarification: Option<ClarificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up: Option<FollowUpResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_analysis: Option<TopicAnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_discovery: Option<TopicDiscoveryResult>,
}

impl SharedContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a completed result, replacing the previous one for that agent.
    pub fn apply(&mut self, metadata: AgentMetadata) {
        match metadata {
            AgentMetadata::Validation(r) => self.validation = Some(r),
            AgentMetadata::Clarification(r) => self.clarification = Some(r),
            AgentMetadata::FollowUp(r) => self.follow_up = Some(r),
            AgentMetadata::TopicAnalysis(r) => self.topic_analysis = Some(r),
            AgentMetadata::TopicDiscovery(r) => self.topic_discovery = Some(r),
        }
    }

    /// Returns the stored result for an agent kind.
    pub fn get(&self, kind: AgentKind) -> Option<AgentMetadata> {
        match kind {
            AgentKind::Validation => self.validation.clone().map(AgentMetadata::Validation),
            AgentKind::Clarification => {
                self.clarification.clone().map(AgentMetadata::Clarification)
            }
            AgentKind::FollowUp => self.follow_up.clone().map(AgentMetadata::FollowUp),
            AgentKind::TopicAnalysis => {
                self.topic_analysis.clone().map(AgentMetadata::TopicAnalysis)
            }
            AgentKind::TopicDiscovery => {
                self.topic_discovery.clone().map(AgentMetadata::TopicDiscovery)
            }
        }
    }

    /// Whether a result is stored for the given kind.
    pub fn contains(&self, kind: AgentKind) -> bool {
        match kind {
            AgentKind::Validation => self.validation.is_some(),
            AgentKind::Clarification => self.clarification.is_some(),
            AgentKind::FollowUp => self.follow_up.is_some(),
            AgentKind::TopicAnalysis => self.topic_analysis.is_some(),
            AgentKind::TopicDiscovery => self.topic_discovery.is_some(),
        }
    }

    /// Kinds with a stored result, in dependency order.
    pub fn completed_kinds(&self) -> Vec<AgentKind> {
        AgentKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind))
            .collect()
    }

    /// Whether no agent has completed yet.
    pub fn is_empty(&self) -> bool {
        self.completed_kinds().is_empty()
    }

    /// Compact plain-text rendering used when prompting later agents.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();

        if let Some(v) = &self.validation {
            lines.push(format!("Validation (confidence {}):", v.confidence));
            push_list(&mut lines, "issue", &v.issues);
            push_list(&mut lines, "suggestion", &v.suggestions);
        }
        if let Some(c) = &self.clarification {
            lines.push(format!("Clarification (priority {}):", c.priority));
            push_list(&mut lines, "question", &c.questions);
        }
        if let Some(f) = &self.follow_up {
            if !f.question.is_empty() {
                lines.push(format!("Follow-up: {}", f.question));
            }
        }
        if let Some(t) = &self.topic_analysis {
            lines.push(format!("Topic coverage: {}%", t.coverage));
            push_list(&mut lines, "missing", &t.missing_topics);
        }
        if let Some(d) = &self.topic_discovery {
            push_list(&mut lines, "new topic", &d.new_topics);
        }

        lines.join("\n")
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, items: &[String]) {
    for item in items {
        lines.push(format!("- {}: {}", label, item));
    }
}
