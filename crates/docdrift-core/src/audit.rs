//! Tolerant parsing of audit replies.
//!
//! Models asked for "a JSON list" reply with a bare list, a list wrapped in
//! a ```` ```json ```` fence, or free text. Parsing is a two-stage pipeline
//! that never fails:
//!
//! 1. [`normalize_reply`] trims whitespace and strips a leading
//!    ```` ```json ```` marker and a trailing ```` ``` ```` fence.
//! 2. [`parse_issues`] parses the candidate as a JSON array of objects and
//!    re-serializes each object to compact JSON text. Anything else yields
//!    [`AuditOutcome::Fallback`] holding the raw, unmodified reply.
//!
//! Callers receive issues as JSON *strings*, not structured values; HTTP
//! clients depend on string-typed list elements.
//!
//! ```rust
//! use docdrift_core::audit::parse_issues;
//!
//! let outcome = parse_issues("```json\n[{\"reason\": \"x\"}]\n```");
//! assert_eq!(outcome.into_issues(), vec![r#"{"reason":"x"}"#.to_string()]);
//!
//! let outcome = parse_issues("I cannot answer that.");
//! assert_eq!(outcome.into_issues(), vec!["I cannot answer that.".to_string()]);
//! ```

use serde_json::Value;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Result of parsing an audit reply.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    /// The reply was a JSON list of objects; each entry is one object
    /// re-serialized as compact JSON text.
    Parsed(Vec<String>),
    /// The reply could not be parsed. `raw` is the reply exactly as
    /// received and `reason` says why parsing failed.
    Fallback { raw: String, reason: String },
}

impl AuditOutcome {
    /// The issue list returned to callers: the parsed entries, or a single
    /// element holding the raw reply.
    pub fn into_issues(self) -> Vec<String> {
        match self {
            AuditOutcome::Parsed(issues) => issues,
            AuditOutcome::Fallback { raw, .. } => vec![raw],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, AuditOutcome::Fallback { .. })
    }
}

/// Stage 1: trim the reply and strip known fence markers.
///
/// Only a leading ```` ```json ```` marker and a trailing ```` ``` ```` are
/// recognized; whitespace left behind by the markers is tolerated by the
/// JSON parser.
pub fn normalize_reply(raw: &str) -> &str {
    let mut content = raw.trim();
    if let Some(rest) = content.strip_prefix(FENCE_OPEN) {
        content = rest;
    }
    if let Some(rest) = content.strip_suffix(FENCE_CLOSE) {
        content = rest;
    }
    content
}

/// Stage 2: parse a reply into compact JSON issue strings, or fall back to
/// the raw text.
pub fn parse_issues(raw: &str) -> AuditOutcome {
    match try_parse(normalize_reply(raw)) {
        Ok(issues) => AuditOutcome::Parsed(issues),
        Err(reason) => AuditOutcome::Fallback {
            raw: raw.to_string(),
            reason,
        },
    }
}

fn try_parse(candidate: &str) -> Result<Vec<String>, String> {
    let value: Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;

    let items = match value {
        Value::Array(items) => items,
        other => return Err(format!("expected a JSON list, got {}", kind(&other))),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if !item.is_object() {
                return Err(format!("issue {} is {}, not an object", i, kind(item)));
            }
            serde_json::to_string(item).map_err(|e| e.to_string())
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
