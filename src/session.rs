//! Session-keyed cache of vector indexes over a persistent [`IndexStore`].
//!
//! Resident indexes live in a map shared by all request handlers. A miss
//! falls through to the backing store, and a successful load becomes
//! resident, so a restarted server serves earlier sessions without
//! re-embedding. Nothing is ever evicted.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::Result;

use docdrift_core::index::VectorIndex;
use docdrift_core::store::IndexStore;

pub struct SessionStore {
    resident: RwLock<HashMap<String, Arc<VectorIndex>>>,
    backend: Arc<dyn IndexStore>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn IndexStore>) -> Self {
        Self {
            resident: RwLock::new(HashMap::new()),
            backend,
        }
    }

    /// Index for `session_id`, reloading it from the backing store if it is
    /// not resident.
    ///
    /// A missing or empty id, an id with nothing persisted, and a persisted
    /// index that fails to load all yield `None`. Load failures are logged.
    pub async fn get(&self, session_id: Option<&str>) -> Option<Arc<VectorIndex>> {
        let session_id = session_id.filter(|s| !s.is_empty())?;

        if let Some(index) = self.resident_get(session_id) {
            return Some(index);
        }

        match self.backend.load(session_id).await {
            Ok(Some(index)) => {
                tracing::info!(session = session_id, chunks = index.len(), "session reloaded from disk");
                let mut resident = self.resident.write().unwrap_or_else(|e| e.into_inner());
                let entry = resident
                    .entry(session_id.to_string())
                    .or_insert_with(|| Arc::new(index));
                Some(entry.clone())
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(session = session_id, "ignoring unreadable index: {:#}", e);
                None
            }
        }
    }

    /// Persist `index` for `session_id` and make it resident, replacing any
    /// earlier index for that session.
    ///
    /// Nothing changes in memory if the save fails.
    pub async fn replace(&self, session_id: &str, index: VectorIndex) -> Result<Arc<VectorIndex>> {
        self.backend.save(session_id, &index).await?;
        let index = Arc::new(index);
        self.resident
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_id.to_string(), index.clone());
        Ok(index)
    }

    /// Number of sessions currently held in memory.
    pub fn resident_count(&self) -> usize {
        self.resident.read().map(|m| m.len()).unwrap_or(0)
    }

    fn resident_get(&self, session_id: &str) -> Option<Arc<VectorIndex>> {
        self.resident
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use docdrift_core::models::Chunk;
    use docdrift_core::store::memory::InMemoryIndexStore;

    fn index(text: &str) -> VectorIndex {
        let chunk = Chunk {
            id: text.to_string(),
            source: "Old_Documentation.txt".to_string(),
            chunk_index: 0,
            text: text.to_string(),
            hash: String::new(),
        };
        VectorIndex::from_parts("hash", 2, vec![chunk], vec![vec![1.0, 0.0]]).unwrap()
    }

    struct BrokenStore;

    #[async_trait]
    impl IndexStore for BrokenStore {
        async fn load(&self, _session_id: &str) -> Result<Option<VectorIndex>> {
            bail!("corrupt dump")
        }
        async fn save(&self, _session_id: &str, _index: &VectorIndex) -> Result<()> {
            bail!("disk full")
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_id_is_absent() {
        let store = SessionStore::new(Arc::new(InMemoryIndexStore::new()));
        assert!(store.get(None).await.is_none());
        assert!(store.get(Some("")).await.is_none());
        assert!(store.get(Some("never-loaded")).await.is_none());
    }

    #[tokio::test]
    async fn test_replace_then_get() {
        let store = SessionStore::new(Arc::new(InMemoryIndexStore::new()));
        store.replace("s1", index("first")).await.unwrap();
        store.replace("s1", index("second")).await.unwrap();
        let got = store.get(Some("s1")).await.unwrap();
        assert_eq!(got.first_chunks(1)[0].text, "second");
        assert_eq!(store.resident_count(), 1);
    }

    #[tokio::test]
    async fn test_lazy_reload_from_backend() {
        let backend = Arc::new(InMemoryIndexStore::new());
        backend.save("s1", &index("persisted")).await.unwrap();

        let store = SessionStore::new(backend);
        assert_eq!(store.resident_count(), 0);
        let got = store.get(Some("s1")).await.unwrap();
        assert_eq!(got.first_chunks(1)[0].text, "persisted");
        assert_eq!(store.resident_count(), 1);
    }

    #[tokio::test]
    async fn test_load_error_is_treated_as_absent() {
        let store = SessionStore::new(Arc::new(BrokenStore));
        assert!(store.get(Some("s1")).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_save_leaves_previous_index() {
        let backend = Arc::new(InMemoryIndexStore::new());
        let store = SessionStore::new(backend);
        store.replace("s1", index("kept")).await.unwrap();

        let broken = SessionStore {
            resident: RwLock::new(store.resident.read().unwrap().clone()),
            backend: Arc::new(BrokenStore),
        };
        assert!(broken.replace("s1", index("lost")).await.is_err());
        let got = broken.get(Some("s1")).await.unwrap();
        assert_eq!(got.first_chunks(1)[0].text, "kept");
    }
}
