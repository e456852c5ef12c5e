//! Directory-per-session [`IndexStore`] on the local filesystem.
//!
//! # Layout
//!
//! ```text
//! <index_root>/
//!   <session-dir>/
//!     index.json    format version, index info, chunks in insertion order
//!     vectors.bin   one little-endian f32 row of `dims` values per chunk
//! ```
//!
//! A save writes a complete new directory next to the old one and then
//! swaps it in, so a session directory is always rewritten as a whole and
//! never appended to. Saves and loads of the same session are serialized;
//! different sessions never wait on each other.
//!
//! Session ids made only of ASCII letters, digits, `_`, `-` and `.` (not
//! starting with `.` or `h-`, at most 128 bytes) name their directory
//! directly. Any other id is stored under `h-<sha256 hex of the id>`, which
//! keeps every session inside `index_root`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use docdrift_core::embedding::{bytes_to_vec, vec_to_bytes};
use docdrift_core::index::{IndexInfo, VectorIndex};
use docdrift_core::models::Chunk;
use docdrift_core::store::IndexStore;

const FORMAT_VERSION: u32 = 1;
const MANIFEST_FILE: &str = "index.json";
const VECTORS_FILE: &str = "vectors.bin";
const MAX_PLAIN_ID_LEN: usize = 128;

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    info: IndexInfo,
    chunks: Vec<Chunk>,
}

/// Filesystem-backed index store rooted at one directory.
#[derive(Debug, Clone)]
pub struct DiskIndexStore {
    root: PathBuf,
    /// One lock per session directory name.
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl DiskIndexStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the persisted index for `session_id`.
    pub fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(dir_name(session_id))
    }

    fn session_lock(&self, dir_name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(dir_name.to_string()).or_default().clone()
    }

    async fn swap_in(&self, staging: &Path, target: &Path) -> Result<()> {
        if tokio::fs::try_exists(target).await? {
            tokio::fs::remove_dir_all(target)
                .await
                .with_context(|| format!("Failed to remove old index {}", target.display()))?;
        }
        tokio::fs::rename(staging, target)
            .await
            .with_context(|| format!("Failed to move index into {}", target.display()))
    }

    async fn write_dir(&self, dir: &Path, index: &VectorIndex) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            info: index.info().clone(),
            chunks: index.chunks().cloned().collect(),
        };
        tokio::fs::write(dir.join(MANIFEST_FILE), serde_json::to_vec_pretty(&manifest)?).await?;

        let mut bytes = Vec::with_capacity(index.len() * index.dims() * 4);
        for entry in index.entries() {
            bytes.extend_from_slice(&vec_to_bytes(&entry.vector));
        }
        tokio::fs::write(dir.join(VECTORS_FILE), bytes).await?;
        Ok(())
    }
}

fn dir_name(session_id: &str) -> String {
    let plain = !session_id.is_empty()
        && session_id.len() <= MAX_PLAIN_ID_LEN
        && !session_id.starts_with('.')
        && !session_id.starts_with("h-")
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if plain {
        session_id.to_string()
    } else {
        format!("h-{}", hex::encode(Sha256::digest(session_id.as_bytes())))
    }
}

#[async_trait]
impl IndexStore for DiskIndexStore {
    async fn load(&self, session_id: &str) -> Result<Option<VectorIndex>> {
        let name = dir_name(session_id);
        let lock = self.session_lock(&name);
        let _guard = lock.lock().await;

        let dir = self.root.join(name);
        if !tokio::fs::try_exists(&dir).await? {
            return Ok(None);
        }

        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = tokio::fs::read(&manifest_path)
            .await
            .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
        let manifest: Manifest = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

        if manifest.format_version != FORMAT_VERSION {
            bail!(
                "Unsupported index format version {} in {}",
                manifest.format_version,
                dir.display()
            );
        }

        let dims = manifest.info.dims;
        if dims == 0 {
            bail!("Index in {} declares zero dimensions", dir.display());
        }

        let vectors_path = dir.join(VECTORS_FILE);
        let bytes = tokio::fs::read(&vectors_path)
            .await
            .with_context(|| format!("Failed to read {}", vectors_path.display()))?;
        let row_len = dims * 4;
        if bytes.len() != manifest.chunks.len() * row_len {
            bail!(
                "{} holds {} bytes, expected {} for {} chunks of {} dims",
                vectors_path.display(),
                bytes.len(),
                manifest.chunks.len() * row_len,
                manifest.chunks.len(),
                dims
            );
        }

        let mut index = VectorIndex::with_info(manifest.info);
        for (chunk, row) in manifest.chunks.into_iter().zip(bytes.chunks_exact(row_len)) {
            index.insert(chunk, bytes_to_vec(row))?;
        }
        Ok(Some(index))
    }

    async fn save(&self, session_id: &str, index: &VectorIndex) -> Result<()> {
        let name = dir_name(session_id);
        let target = self.root.join(&name);
        let staging = self.root.join(format!(".staging-{}", Uuid::new_v4()));

        if let Err(e) = self.write_dir(&staging, index).await {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e.context(format!("Failed to write index for {}", target.display())));
        }

        let lock = self.session_lock(&name);
        let swapped = {
            let _guard = lock.lock().await;
            self.swap_in(&staging, &target).await
        };
        if let Err(e) = swapped {
            let _ = tokio::fs::remove_dir_all(&staging).await;
            return Err(e);
        }

        tracing::debug!(dir = %target.display(), chunks = index.len(), "index persisted");
        Ok(())
    }
}
