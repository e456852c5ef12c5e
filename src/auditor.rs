//! Consistency audit of a session's old documentation against its new
//! changelog.
//!
//! The audit compares the first two chunks of the index by insertion
//! order. For scenarios whose documents each fit in one chunk these are
//! the old document and the new document. Longer documents are compared
//! only on their first two chunks.

use std::time::Duration;

use docdrift_core::audit::{parse_issues, AuditOutcome};
use docdrift_core::completion::CompletionProvider;
use docdrift_core::prompt::audit_prompt;

use crate::error::with_timeout;
use crate::session::SessionStore;

pub struct Auditor<'a> {
    pub llm: &'a dyn CompletionProvider,
    pub sessions: &'a SessionStore,
    pub timeout: Duration,
}

impl Auditor<'_> {
    /// Issues found for the session, each a JSON object as text, or a
    /// single raw-reply element when the model's reply is not a JSON list
    /// of objects.
    ///
    /// Returns an empty list without calling the model when the session
    /// has no index or fewer than two chunks, and also when the model call
    /// fails or times out.
    pub async fn audit(&self, session_id: Option<&str>) -> Vec<String> {
        let Some(index) = self.sessions.get(session_id).await else {
            return Vec::new();
        };
        let session = session_id.unwrap_or_default();

        let first = index.first_chunks(2);
        let [old, new] = first.as_slice() else {
            tracing::debug!(session, chunks = index.len(), "too few chunks to audit");
            return Vec::new();
        };

        let prompt = audit_prompt(&old.text, &new.text);
        let reply = match with_timeout("completion", self.timeout, self.llm.complete(&prompt)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session, "audit skipped: {}", e);
                return Vec::new();
            }
        };

        let outcome = parse_issues(&reply);
        match &outcome {
            AuditOutcome::Parsed(issues) => {
                tracing::info!(session, issues = issues.len(), "audit complete");
            }
            AuditOutcome::Fallback { reason, .. } => {
                tracing::warn!(session, "audit reply was not a JSON list: {}", reason);
            }
        }
        outcome.into_issues()
    }
}
