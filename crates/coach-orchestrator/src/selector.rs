//! Picks the single message to surface to the interviewer.

use serde::{Deserialize, Serialize};

use coach_models::{Priority, SharedContext};

/// Shown when no agent result qualifies.
pub const FALLBACK_PROMPT: &str = "Keep going. Ask the expert to walk through the next step in detail.";

/// Where the selected message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Validation,
    Clarification,
    FollowUp,
    Fallback,
}

/// The primary message for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedResponse {
    pub source: ResponseSource,
    pub message: String,
}

/// Selects the primary response. First match wins:
///
/// 1. validation with confidence above `confidence_threshold` and at least one issue
/// 2. high-priority clarification with at least one question
/// 3. follow-up with a non-empty question
/// 4. [`FALLBACK_PROMPT`]
pub fn select_response(context: &SharedContext, confidence_threshold: u32) -> SelectedResponse {
    if let Some(validation) = &context.validation {
        if validation.confidence > confidence_threshold && !validation.issues.is_empty() {
            let mut message = validation.issues.join("; ");
            if let Some(suggestion) = validation.suggestions.first() {
                message.push_str(" Suggestion: ");
                message.push_str(suggestion);
            }
            return SelectedResponse {
                source: ResponseSource::Validation,
                message,
            };
        }
    }

    if let Some(clarification) = &context.clarification {
        if clarification.priority == Priority::High {
            if let Some(question) = clarification.questions.first() {
                return SelectedResponse {
                    source: ResponseSource::Clarification,
                    message: question.clone(),
                };
            }
        }
    }

    if let Some(follow_up) = &context.follow_up {
        if !follow_up.question.trim().is_empty() {
            return SelectedResponse {
                source: ResponseSource::FollowUp,
                message: follow_up.question.clone(),
            };
        }
    }

    SelectedResponse {
        source: ResponseSource::Fallback,
        message: FALLBACK_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_models::{
        AgentMetadata, ClarificationResult, FollowUpResult, ValidationResult,
    };

    fn validation(confidence: u32, issues: &[&str]) -> AgentMetadata {
        AgentMetadata::Validation(ValidationResult {
            confidence,
            issues: issues.iter().map(|s| s.to_string()).collect(),
            suggestions: vec!["Confirm the torque value".into()],
            summary: String::new(),
        })
    }

    fn clarification(priority: Priority) -> AgentMetadata {
        AgentMetadata::Clarification(ClarificationResult {
            questions: vec!["Which wrench size?".into()],
            priority,
            reasoning: String::new(),
        })
    }

    #[test]
    fn test_validation_wins_over_high_clarification() {
        let mut context = SharedContext::new();
        context.apply(validation(85, &["Torque not stated"]));
        context.apply(clarification(Priority::High));

        let selected = select_response(&context, 70);
        assert_eq!(selected.source, ResponseSource::Validation);
        assert_eq!(
            selected.message,
            "Torque not stated Suggestion: Confirm the torque value"
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut context = SharedContext::new();
        context.apply(validation(70, &["Torque not stated"]));
        context.apply(clarification(Priority::High));

        let selected = select_response(&context, 70);
        assert_eq!(selected.source, ResponseSource::Clarification);
        assert_eq!(selected.message, "Which wrench size?");
    }

    #[test]
    fn test_validation_without_issues_is_skipped() {
        let mut context = SharedContext::new();
        context.apply(validation(95, &[]));
        context.apply(AgentMetadata::FollowUp(FollowUpResult {
            question: "What happens next?".into(),
            rationale: String::new(),
        }));

        let selected = select_response(&context, 70);
        assert_eq!(selected.source, ResponseSource::FollowUp);
    }

    #[test]
    fn test_medium_clarification_falls_through() {
        let mut context = SharedContext::new();
        context.apply(clarification(Priority::Medium));

        let selected = select_response(&context, 70);
        assert_eq!(selected.source, ResponseSource::Fallback);
        assert_eq!(selected.message, FALLBACK_PROMPT);
    }

    #[test]
    fn test_empty_context_uses_fallback() {
        let selected = select_response(&SharedContext::new(), 70);
        assert_eq!(selected.source, ResponseSource::Fallback);
        assert!(!selected.message.is_empty());
    }

    #[test]
    fn test_selected_response_serialization() {
        let selected = select_response(&SharedContext::new(), 70);
        let json = serde_json::to_value(&selected).unwrap();
        assert_eq!(json["source"], "fallback");
        assert_eq!(json["message"], FALLBACK_PROMPT);
    }

    #[test]
    fn test_selection_is_idempotent() {
        let mut context = SharedContext::new();
        context.apply(validation(90, &["a", "b"]));

        let first = select_response(&context, 70);
        let second = select_response(&context, 70);
        assert_eq!(first, second);
        assert!(first.message.starts_with("a; b"));
    }
}
