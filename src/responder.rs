//! Retrieval-augmented answers over a session's index.

use std::time::Duration;

use docdrift_core::completion::CompletionProvider;
use docdrift_core::embedding::{embed_query, EmbeddingProvider};
use docdrift_core::prompt::{chat_prompt, join_context};

use crate::error::{with_timeout, ServiceError};
use crate::session::SessionStore;

/// Reply given to sessions that have no index yet.
pub const NO_INDEX_REPLY: &str = "Please load a scenario first.";

pub struct Responder<'a> {
    pub embedder: &'a dyn EmbeddingProvider,
    pub llm: &'a dyn CompletionProvider,
    pub sessions: &'a SessionStore,
    pub top_k: usize,
    pub timeout: Duration,
}

impl Responder<'_> {
    /// Answer `question` from the `top_k` chunks of the session's index
    /// closest to it.
    ///
    /// Without an index, or with one built by a different embedding model
    /// or dimension, the reply is [`NO_INDEX_REPLY`] and neither the
    /// embedder nor the model is called. The model's reply is returned
    /// verbatim.
    pub async fn answer(
        &self,
        session_id: Option<&str>,
        question: &str,
    ) -> Result<String, ServiceError> {
        let Some(index) = self.sessions.get(session_id).await else {
            return Ok(NO_INDEX_REPLY.to_string());
        };
        if !index.matches_embedder(self.embedder.model_name(), self.embedder.dims()) {
            tracing::warn!(
                session = session_id.unwrap_or_default(),
                index_model = %index.info().model,
                index_dims = index.dims(),
                embedder = self.embedder.model_name(),
                embedder_dims = self.embedder.dims(),
                "index was built by a different embedder; treating as absent"
            );
            return Ok(NO_INDEX_REPLY.to_string());
        }

        let query = with_timeout(
            "embedding",
            self.timeout,
            embed_query(self.embedder, question),
        )
        .await?;

        let hits = index.similarity_search(&query, self.top_k);
        tracing::debug!(
            session = session_id.unwrap_or_default(),
            hits = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "retrieved context"
        );
        let context = join_context(hits.iter().map(|h| h.chunk.text.as_str()));

        with_timeout(
            "completion",
            self.timeout,
            self.llm.complete(&chat_prompt(&context, question)),
        )
        .await
    }
}
