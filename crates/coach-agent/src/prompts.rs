//! Prompt construction for each agent role.

use coach_models::AgentKind;

use crate::contract::field_specs;
use crate::fields::FieldKind;
use crate::generator::ChatMessage;
use crate::input::AgentInput;

fn role_description(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Validation => {
            "You review a live interview transcript in which an expert explains a procedure. \
             Identify factual errors, gaps, unsafe steps and inconsistencies."
        }
        AgentKind::Clarification => {
            "You help an interviewer capture a procedure precisely. \
             Propose short clarifying questions for ambiguous or vague statements."
        }
        AgentKind::FollowUp => {
            "You coach an interviewer in real time. \
             Suggest the single best next question to ask the expert."
        }
        AgentKind::TopicAnalysis => {
            "You track interview coverage. \
             Compare the transcript with the expected topics and report what is covered."
        }
        AgentKind::TopicDiscovery => {
            "You listen for important subjects the interview plan did not anticipate. \
             Report topics that came up but are not on the expected list."
        }
    }
}

fn format_hint(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Integer => "a number from 0 to 100",
        FieldKind::Priority => "high, medium or low",
        FieldKind::List => "one item per line starting with '- ', or 'none'",
        FieldKind::Text => "a short sentence",
    }
}

/// System prompt for an agent kind, naming the labels it must emit.
pub fn system_prompt(kind: AgentKind) -> String {
    let mut prompt = String::from(role_description(kind));
    prompt.push_str("\n\nAnswer using exactly these labelled sections, in order:\n");
    for spec in field_specs(kind) {
        prompt.push_str(&format!("{}: <{}>\n", spec.label, format_hint(spec.kind)));
    }
    prompt.push_str("Do not add other sections.");
    prompt
}

/// User message rendered from the run's input.
pub fn user_message(kind: AgentKind, input: &AgentInput) -> String {
    let mut sections = Vec::new();

    if !input.domain_context.is_empty() {
        sections.push(format!("Domain:\n{}", input.domain_context));
    }

    let wants_topics = matches!(kind, AgentKind::TopicAnalysis | AgentKind::TopicDiscovery);
    if wants_topics && !input.topics.is_empty() {
        let topics = input
            .topics
            .iter()
            .map(|t| format!("- {}", t))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Expected topics:\n{}", topics));
    }

    if !input.recent_history.is_empty() {
        let history = input
            .recent_history
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n");
        sections.push(format!("Recent conversation:\n{}", history));
    }

    if !input.prior_context.is_empty() {
        sections.push(format!("Analysis so far:\n{}", input.prior_context.render()));
    }

    sections.push(format!("Current transcript:\n{}", input.current_transcript));
    sections.join("\n\n")
}

/// The system and user messages for one run.
pub fn build_messages(kind: AgentKind, input: &AgentInput) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt(kind)),
        ChatMessage::user(user_message(kind, input)),
    ]
}

/// Literal content used when a run degrades.
pub fn fallback_message(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Validation => "Validation is unavailable right now.",
        AgentKind::Clarification => "No clarifying questions available right now.",
        AgentKind::FollowUp => "No follow-up suggestion available right now.",
        AgentKind::TopicAnalysis => "Topic coverage is unavailable right now.",
        AgentKind::TopicDiscovery => "Topic discovery is unavailable right now.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_models::{AgentMetadata, ConversationTurn, SharedContext, ValidationResult};

    #[test]
    fn test_system_prompt_names_labels() {
        let prompt = system_prompt(AgentKind::Validation);
        for label in ["CONFIDENCE:", "ISSUES:", "SUGGESTIONS:", "SUMMARY:"] {
            assert!(prompt.contains(label), "missing {label}");
        }
    }

    #[test]
    fn test_user_message_includes_context() {
        let mut context = SharedContext::new();
        context.apply(AgentMetadata::Validation(ValidationResult {
            confidence: 80,
            issues: vec!["torque missing".into()],
            ..Default::default()
        }));

        let input = AgentInput {
            current_transcript: "Tighten the bolts.".into(),
            domain_context: "Wheel change".into(),
            recent_history: vec![ConversationTurn::interviewer("What next?")],
            topics: vec!["torque".into()],
            prior_context: context,
        };

        let message = user_message(AgentKind::Clarification, &input);
        assert!(message.contains("Wheel change"));
        assert!(message.contains("interviewer: What next?"));
        assert!(message.contains("torque missing"));
        assert!(message.ends_with("Tighten the bolts."));
        assert!(!message.contains("Expected topics"));

        let message = user_message(AgentKind::TopicAnalysis, &input);
        assert!(message.contains("Expected topics:\n- torque"));
    }

    #[test]
    fn test_fallback_messages_are_non_empty() {
        for kind in AgentKind::ALL {
            assert!(!fallback_message(kind).is_empty());
        }
    }
}
