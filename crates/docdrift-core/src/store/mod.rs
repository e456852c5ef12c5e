//! Persistence seam for session indexes.
//!
//! The [`IndexStore`] trait is the storage half of the session lookup:
//! the session cache asks it to load an index that is not resident in
//! memory, and the indexer asks it to save a freshly built one. Backends
//! are pluggable (on-disk in the app crate, in-memory here for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::index::VectorIndex;

/// Durable storage for one index per session.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`load`](IndexStore::load) | Read a session's persisted index, if any |
/// | [`save`](IndexStore::save) | Replace a session's persisted index entirely |
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Load the persisted index for `session_id`.
    ///
    /// Returns `Ok(None)` when nothing has been saved for the session and
    /// an error when something was saved but cannot be read back.
    async fn load(&self, session_id: &str) -> Result<Option<VectorIndex>>;

    /// Persist `index` for `session_id`, discarding whatever was stored
    /// before. Never merges.
    async fn save(&self, session_id: &str, index: &VectorIndex) -> Result<()>;
}
