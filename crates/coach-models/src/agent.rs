//! Agent roles and shared enums.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The analysis roles that run against a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentKind {
    /// Checks the transcript for errors, gaps and inconsistencies.
    Validation,
    /// Proposes clarifying questions for ambiguous statements.
    Clarification,
    /// Suggests the single best next question.
    FollowUp,
    /// Measures coverage of the expected topics.
    TopicAnalysis,
    /// Finds topics that were not on the expected list.
    TopicDiscovery,
}

impl AgentKind {
    /// All agent kinds in dependency order.
    pub const ALL: [AgentKind; 5] = [
        AgentKind::Validation,
        AgentKind::TopicAnalysis,
        AgentKind::TopicDiscovery,
        AgentKind::Clarification,
        AgentKind::FollowUp,
    ];

    /// Stable wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Clarification => "clarification",
            Self::FollowUp => "follow-up",
            Self::TopicAnalysis => "topic-analysis",
            Self::TopicDiscovery => "topic-discovery",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "validation" => Ok(Self::Validation),
            "clarification" => Ok(Self::Clarification),
            "follow-up" | "followup" => Ok(Self::FollowUp),
            "topic-analysis" => Ok(Self::TopicAnalysis),
            "topic-discovery" => Ok(Self::TopicDiscovery),
            other => Err(format!("unknown agent kind: {}", other)),
        }
    }
}

/// Urgency attached to clarification requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Lenient parse from model output; anything unrecognised is `None`.
    pub fn from_text(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        if lower.contains("high") || lower.contains("urgent") || lower.contains("critical") {
            Some(Self::High)
        } else if lower.contains("medium") || lower.contains("moderate") {
            Some(Self::Medium)
        } else if lower.contains("low") {
            Some(Self::Low)
        } else {
            None
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}
