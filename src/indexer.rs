//! Scenario loading: chunk, embed, persist, and install a session index.
//!
//! Loading always builds a brand-new index from the scenario's two
//! documents, old documentation first and new changelog second, and
//! replaces whatever the session held before. Earlier loads are never
//! merged in.

use std::time::Duration;

use docdrift_core::chunk::{chunk_documents, ChunkingParams};
use docdrift_core::embedding::EmbeddingProvider;
use docdrift_core::index::VectorIndex;

use crate::error::{with_timeout, ServiceError};
use crate::scenarios::ScenarioCatalog;
use crate::session::SessionStore;

/// What happened to a load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The session now holds a fresh index of `chunks` chunks.
    Loaded { chunks: usize },
    /// No scenario has the requested id; the session is unchanged.
    NotFound,
}

/// Everything a load needs besides the request itself.
pub struct Indexer<'a> {
    pub catalog: &'a ScenarioCatalog,
    pub embedder: &'a dyn EmbeddingProvider,
    pub sessions: &'a SessionStore,
    pub chunking: ChunkingParams,
    pub timeout: Duration,
}

impl Indexer<'_> {
    /// Build the index for `scenario_id` and make it the index of
    /// `session_id`.
    ///
    /// # Errors
    ///
    /// Embedding failures and timeouts leave the session unchanged. A
    /// failed save also leaves the resident index unchanged.
    pub async fn load_scenario(
        &self,
        session_id: &str,
        scenario_id: &str,
    ) -> Result<LoadOutcome, ServiceError> {
        let Some(scenario) = self.catalog.get(scenario_id) else {
            tracing::info!(session = session_id, scenario = scenario_id, "unknown scenario");
            return Ok(LoadOutcome::NotFound);
        };

        let chunks = chunk_documents(&scenario.documents(), self.chunking);
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            with_timeout("embedding", self.timeout, self.embedder.embed(&texts)).await?
        };

        let index = VectorIndex::from_parts(
            self.embedder.model_name(),
            self.embedder.dims(),
            chunks,
            vectors,
        )
        .map_err(|e| ServiceError::upstream("embedding", e))?;
        let count = index.len();

        self.sessions
            .replace(session_id, index)
            .await
            .map_err(|e| ServiceError::Storage(format!("{:#}", e)))?;

        tracing::info!(
            session = session_id,
            scenario = scenario_id,
            chunks = count,
            "scenario loaded"
        );
        Ok(LoadOutcome::Loaded { chunks: count })
    }
}
