//! Generic extraction of labelled fields from free-text model output.
//!
//! Agents are asked to answer in sections such as:
//!
//! ```text
//! CONFIDENCE: 82
//! ISSUES:
//! - The torque value was never stated
//! SUMMARY: Mostly consistent.
//! ```
//!
//! Each agent kind declares its expected fields as [`FieldSpec`]s and a single
//! pass of [`extract_fields`] turns the text into a [`ParsedFields`] record.
//! Missing or malformed fields never fail; they read back as documented
//! defaults (0, empty list, empty text, `medium` priority).

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use coach_models::Priority;

/// A `LABEL: value` line, tolerant of markdown bullets, headings and bold.
static LABEL_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s>*#-]*([A-Za-z][A-Za-z _/-]*?)\s*\**\s*:\s*\**\s*(.*?)\s*\**\s*$")
        .expect("Invalid label line regex")
});

/// Leading list markers: `-`, `*`, `•`, `1.`, `2)`.
static BULLET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:[-*•]+|\d+[.)])\s*").expect("Invalid bullet regex")
});

static DIGITS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid digits regex"));

/// How a field's raw text is coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// First integer in the value, clamped to 0-100.
    Integer,
    /// `high`, `medium` or `low`.
    Priority,
    /// Bulleted/numbered lines, or a comma-separated single line.
    List,
    /// Trimmed free text.
    Text,
}

/// One expected field in an agent's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub label: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn integer(label: &'static str) -> Self {
        Self { label, kind: FieldKind::Integer }
    }

    pub const fn priority(label: &'static str) -> Self {
        Self { label, kind: FieldKind::Priority }
    }

    pub const fn list(label: &'static str) -> Self {
        Self { label, kind: FieldKind::List }
    }

    pub const fn text(label: &'static str) -> Self {
        Self { label, kind: FieldKind::Text }
    }
}

/// A coerced field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Integer(u32),
    Priority(Priority),
    List(Vec<String>),
    Text(String),
}

/// Typed record produced by one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    values: HashMap<&'static str, FieldValue>,
    missing: Vec<&'static str>,
}

impl ParsedFields {
    /// Integer field, or 0.
    pub fn integer(&self, label: &str) -> u32 {
        match self.values.get(label) {
            Some(FieldValue::Integer(n)) => *n,
            _ => 0,
        }
    }

    /// Priority field, or `medium`.
    pub fn priority(&self, label: &str) -> Priority {
        match self.values.get(label) {
            Some(FieldValue::Priority(p)) => *p,
            _ => Priority::default(),
        }
    }

    /// List field, or empty.
    pub fn list(&self, label: &str) -> Vec<String> {
        match self.values.get(label) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Text field, or empty.
    pub fn text(&self, label: &str) -> String {
        match self.values.get(label) {
            Some(FieldValue::Text(s)) => s.clone(),
            _ => String::new(),
        }
    }

    /// Raw coerced value, if the field was present and well-formed.
    pub fn get(&self, label: &str) -> Option<&FieldValue> {
        self.values.get(label)
    }

    /// Labels that were absent or could not be coerced.
    pub fn missing(&self) -> &[&'static str] {
        &self.missing
    }
}

/// Normalizes a label for comparison: uppercase, runs of space/`_`/`-` to `_`.
fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_sep = false;
    for c in label.trim().chars() {
        if c == ' ' || c == '_' || c == '-' {
            pending_sep = true;
        } else {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_uppercase());
        }
    }
    out
}

/// Splits `text` into sections keyed by the known labels, first occurrence wins.
fn split_sections<'a>(text: &'a str, specs: &[FieldSpec]) -> HashMap<&'static str, Vec<&'a str>> {
    let known: Vec<(String, &'static str)> = specs
        .iter()
        .map(|s| (normalize_label(s.label), s.label))
        .collect();

    let mut sections: HashMap<&'static str, Vec<&'a str>> = HashMap::new();
    // `None` outside any section, `Some(None)` inside a duplicate section.
    let mut current: Option<Option<&'static str>> = None;

    for line in text.lines() {
        let label_match = LABEL_LINE_REGEX.captures(line).and_then(|caps| {
            let label = normalize_label(caps.get(1)?.as_str());
            let spec_label = known.iter().find(|(norm, _)| *norm == label)?.1;
            Some((spec_label, caps.get(2).map_or("", |m| m.as_str())))
        });

        match label_match {
            Some((label, rest)) => {
                if sections.contains_key(label) {
                    current = Some(None);
                } else {
                    let mut lines = Vec::new();
                    if !rest.is_empty() {
                        lines.push(rest);
                    }
                    sections.insert(label, lines);
                    current = Some(Some(label));
                }
            }
            None => {
                if let Some(Some(label)) = current {
                    if let Some(lines) = sections.get_mut(label) {
                        lines.push(line);
                    }
                }
            }
        }
    }

    sections
}

fn is_empty_marker(item: &str) -> bool {
    matches!(
        item.trim().trim_end_matches('.').to_lowercase().as_str(),
        "" | "none" | "n/a" | "na" | "-" | "nothing" | "no issues" | "none identified"
    )
}

fn coerce_list(lines: &[&str]) -> Vec<String> {
    let non_empty: Vec<&str> = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let items: Vec<String> = match non_empty.as_slice() {
        [] => Vec::new(),
        [single] if !BULLET_REGEX.is_match(single) || single.contains(',') => single
            .split([',', ';'])
            .map(|s| BULLET_REGEX.replace(s, "").trim().to_string())
            .collect(),
        many => many
            .iter()
            .map(|l| BULLET_REGEX.replace(l, "").trim().to_string())
            .collect(),
    };

    items.into_iter().filter(|s| !is_empty_marker(s)).collect()
}

fn coerce(kind: FieldKind, lines: &[&str]) -> Option<FieldValue> {
    let joined = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    match kind {
        FieldKind::Integer => DIGITS_REGEX
            .find(&joined)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .map(|n| FieldValue::Integer(n.min(100) as u32)),
        FieldKind::Priority => Priority::from_text(&joined).map(FieldValue::Priority),
        FieldKind::List => Some(FieldValue::List(coerce_list(lines))),
        FieldKind::Text => {
            if joined.is_empty() {
                None
            } else {
                Some(FieldValue::Text(joined))
            }
        }
    }
}

/// Extracts every field in `specs` from `text` in one pass.
pub fn extract_fields(text: &str, specs: &[FieldSpec]) -> ParsedFields {
    let sections = split_sections(text, specs);
    let mut parsed = ParsedFields::default();

    for spec in specs {
        let value = sections
            .get(spec.label)
            .and_then(|lines| coerce(spec.kind, lines));

        match value {
            Some(value) => {
                parsed.values.insert(spec.label, value);
            }
            None => {
                debug!(label = spec.label, "field missing or malformed, using default");
                parsed.missing.push(spec.label);
            }
        }
    }

    parsed
}
