//! In-memory [`IndexStore`] implementation for tests and embedding.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety. Saved
//! indexes are cloned in and out, so callers never share state with the
//! store.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::index::VectorIndex;

use super::IndexStore;

/// In-memory index store.
pub struct InMemoryIndexStore {
    indexes: RwLock<HashMap<String, VectorIndex>>,
}

impl InMemoryIndexStore {
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sessions with a saved index.
    pub fn len(&self) -> usize {
        self.indexes.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for InMemoryIndexStore {
    async fn load(&self, session_id: &str) -> Result<Option<VectorIndex>> {
        let indexes = self
            .indexes
            .read()
            .map_err(|_| anyhow!("index store lock poisoned"))?;
        Ok(indexes.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, index: &VectorIndex) -> Result<()> {
        let mut indexes = self
            .indexes
            .write()
            .map_err(|_| anyhow!("index store lock poisoned"))?;
        indexes.insert(session_id.to_string(), index.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    fn index_with(text: &str) -> VectorIndex {
        let chunk = Chunk {
            id: "c0".to_string(),
            source: "old".to_string(),
            chunk_index: 0,
            text: text.to_string(),
            hash: String::new(),
        };
        VectorIndex::from_parts("m", 1, vec![chunk], vec![vec![1.0]]).unwrap()
    }

    #[tokio::test]
    async fn test_missing_session_is_none() {
        let store = InMemoryIndexStore::new();
        assert!(store.load("nobody").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_previous() {
        let store = InMemoryIndexStore::new();
        store.save("s1", &index_with("first")).await.unwrap();
        store.save("s1", &index_with("second")).await.unwrap();

        let loaded = store.load("s1").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.first_chunks(1)[0].text, "second");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryIndexStore::new();
        store.save("a", &index_with("alpha")).await.unwrap();
        assert!(store.load("b").await.unwrap().is_none());
    }
}
