//! Per-agent structured-output contracts.
//!
//! Each agent kind declares the labelled fields it must emit. The same
//! descriptors drive prompting and extraction.

use coach_models::{
    AgentKind, AgentMetadata, ClarificationResult, FollowUpResult, TopicAnalysisResult,
    TopicDiscoveryResult, ValidationResult,
};

use crate::fields::{extract_fields, FieldSpec};

pub const CONFIDENCE: &str = "CONFIDENCE";
pub const ISSUES: &str = "ISSUES";
pub const SUGGESTIONS: &str = "SUGGESTIONS";
pub const SUMMARY: &str = "SUMMARY";
pub const QUESTIONS: &str = "QUESTIONS";
pub const PRIORITY: &str = "PRIORITY";
pub const REASONING: &str = "REASONING";
pub const QUESTION: &str = "QUESTION";
pub const RATIONALE: &str = "RATIONALE";
pub const COVERED: &str = "COVERED";
pub const MISSING: &str = "MISSING";
pub const COVERAGE: &str = "COVERAGE";
pub const NEW_TOPICS: &str = "NEW_TOPICS";

const VALIDATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::integer(CONFIDENCE),
    FieldSpec::list(ISSUES),
    FieldSpec::list(SUGGESTIONS),
    FieldSpec::text(SUMMARY),
];

const CLARIFICATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::list(QUESTIONS),
    FieldSpec::priority(PRIORITY),
    FieldSpec::text(REASONING),
];

const FOLLOW_UP_FIELDS: &[FieldSpec] = &[FieldSpec::text(QUESTION), FieldSpec::text(RATIONALE)];

const TOPIC_ANALYSIS_FIELDS: &[FieldSpec] = &[
    FieldSpec::list(COVERED),
    FieldSpec::list(MISSING),
    FieldSpec::integer(COVERAGE),
];

const TOPIC_DISCOVERY_FIELDS: &[FieldSpec] =
    &[FieldSpec::list(NEW_TOPICS), FieldSpec::text(RATIONALE)];

/// The ordered fields an agent kind emits.
pub fn field_specs(kind: AgentKind) -> &'static [FieldSpec] {
    match kind {
        AgentKind::Validation => VALIDATION_FIELDS,
        AgentKind::Clarification => CLARIFICATION_FIELDS,
        AgentKind::FollowUp => FOLLOW_UP_FIELDS,
        AgentKind::TopicAnalysis => TOPIC_ANALYSIS_FIELDS,
        AgentKind::TopicDiscovery => TOPIC_DISCOVERY_FIELDS,
    }
}

/// Runs the extraction pass for `kind` and builds its typed result.
pub fn parse_metadata(kind: AgentKind, text: &str) -> AgentMetadata {
    let fields = extract_fields(text, field_specs(kind));

    match kind {
        AgentKind::Validation => AgentMetadata::Validation(ValidationResult {
            confidence: fields.integer(CONFIDENCE),
            issues: fields.list(ISSUES),
            suggestions: fields.list(SUGGESTIONS),
            summary: fields.text(SUMMARY),
        }),
        AgentKind::Clarification => AgentMetadata::Clarification(ClarificationResult {
            questions: fields.list(QUESTIONS),
            priority: fields.priority(PRIORITY),
            reasoning: fields.text(REASONING),
        }),
        AgentKind::FollowUp => AgentMetadata::FollowUp(FollowUpResult {
            question: fields.text(QUESTION),
            rationale: fields.text(RATIONALE),
        }),
        AgentKind::TopicAnalysis => AgentMetadata::TopicAnalysis(TopicAnalysisResult {
            covered_topics: fields.list(COVERED),
            missing_topics: fields.list(MISSING),
            coverage: fields.integer(COVERAGE),
        }),
        AgentKind::TopicDiscovery => AgentMetadata::TopicDiscovery(TopicDiscoveryResult {
            new_topics: fields.list(NEW_TOPICS),
            rationale: fields.text(RATIONALE),
        }),
    }
}
