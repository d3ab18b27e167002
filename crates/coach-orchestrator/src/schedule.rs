//! The fixed agent dependency graph.
//!
//! ```text
//! validation ──► clarification ──► follow-up
//!     └───────► topic-discovery (when not parallel)
//! topic-analysis
//! ```
//!
//! Disabled agents drop out of the graph and their dependents move up to the
//! nearest enabled ancestor, or start immediately.

use coach_models::AgentKind;

use crate::config::OrchestratorConfig;

/// Whether an agent kind is enabled.
pub fn is_enabled(kind: AgentKind, config: &OrchestratorConfig) -> bool {
    match kind {
        AgentKind::Validation => config.enable_validation,
        AgentKind::Clarification => config.enable_clarification,
        AgentKind::FollowUp => config.enable_follow_up,
        AgentKind::TopicAnalysis => config.enable_topic_analysis,
        AgentKind::TopicDiscovery => config.enable_topic_discovery,
    }
}

/// The agent whose completion gates `kind`, or `None` if it starts immediately.
pub fn prerequisite(kind: AgentKind, config: &OrchestratorConfig) -> Option<AgentKind> {
    match kind {
        AgentKind::Validation | AgentKind::TopicAnalysis => None,
        AgentKind::TopicDiscovery => (!config.parallel_validation_and_discovery
            && config.enable_validation)
            .then_some(AgentKind::Validation),
        AgentKind::Clarification => config.enable_validation.then_some(AgentKind::Validation),
        AgentKind::FollowUp => {
            if config.enable_clarification {
                Some(AgentKind::Clarification)
            } else if config.enable_validation {
                Some(AgentKind::Validation)
            } else {
                None
            }
        }
    }
}

/// Agents that start as soon as a cycle begins.
pub fn initial_agents(config: &OrchestratorConfig) -> Vec<AgentKind> {
    AgentKind::ALL
        .into_iter()
        .filter(|kind| is_enabled(*kind, config) && prerequisite(*kind, config).is_none())
        .collect()
}

/// Agents that start when `completed` finishes.
pub fn unlocked_by(completed: AgentKind, config: &OrchestratorConfig) -> Vec<AgentKind> {
    AgentKind::ALL
        .into_iter()
        .filter(|kind| {
            is_enabled(*kind, config) && prerequisite(*kind, config) == Some(completed)
        })
        .collect()
}
