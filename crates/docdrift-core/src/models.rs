//! Core data models shared by the indexer, the session store, and the
//! auditor.

use serde::{Deserialize, Serialize};

/// A raw source document before chunking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDoc {
    /// Provenance label carried by every chunk (e.g. `"Old_Documentation.txt"`).
    pub source: String,
    pub text: String,
}

impl SourceDoc {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// A contiguous span of one source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    /// Provenance label of the owning document.
    pub source: String,
    /// Position within the owning document, contiguous from 0.
    pub chunk_index: i64,
    pub text: String,
    /// SHA-256 of `text`, hex encoded.
    pub hash: String,
}

/// One finding reported by the consistency audit.
///
/// The audit endpoint forwards issues as JSON text; this type is the
/// structured view used when a caller wants to inspect them. `severity`
/// is an open set and is kept as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssue {
    #[serde(default)]
    pub contradiction: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub fix: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub old_quote: String,
    #[serde(default)]
    pub new_quote: String,
}
