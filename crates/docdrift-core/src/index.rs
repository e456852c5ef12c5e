//! Session-scoped vector index.
//!
//! A [`VectorIndex`] is an insertion-ordered list of chunks with their
//! embedding vectors. Similarity search is brute-force cosine over every
//! entry, which is ample for the handful of chunks a scenario produces.
//!
//! Insertion order is part of the contract: the auditor reads the first
//! two entries and relies on the old document's chunks having been
//! inserted before the new document's.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embedding::cosine_similarity;
use crate::models::Chunk;

/// Number of chunks returned by [`VectorIndex::similarity_search`] callers
/// that do not configure their own limit.
pub const DEFAULT_TOP_K: usize = 4;

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// A chunk returned from a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    /// Cosine similarity to the query vector.
    pub score: f32,
}

/// Metadata describing how an index was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    /// Embedding model that produced the vectors.
    pub model: String,
    /// Vector dimensionality; every entry has exactly this many values.
    pub dims: usize,
    pub built_at: DateTime<Utc>,
}

/// In-memory vector index for one session.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    info: IndexInfo,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty index for vectors of `dims` values.
    pub fn new(model: impl Into<String>, dims: usize) -> Self {
        Self {
            info: IndexInfo {
                model: model.into(),
                dims,
                built_at: Utc::now(),
            },
            entries: Vec::new(),
        }
    }

    /// Build an index from chunks and their vectors, in order.
    ///
    /// # Errors
    ///
    /// Fails if the two slices differ in length or any vector has the
    /// wrong dimensionality.
    pub fn from_parts(
        model: impl Into<String>,
        dims: usize,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if chunks.len() != vectors.len() {
            bail!(
                "chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            );
        }
        let mut index = Self::new(model, dims);
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            index.insert(chunk, vector)?;
        }
        Ok(index)
    }

    /// Restore an index whose metadata was persisted earlier.
    pub fn with_info(info: IndexInfo) -> Self {
        Self {
            info,
            entries: Vec::new(),
        }
    }

    /// Append a chunk. Entries keep insertion order.
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.info.dims {
            bail!(
                "Invalid vector dimension for chunk {}: expected {}, got {}",
                chunk.id,
                self.info.dims,
                vector.len()
            );
        }
        self.entries.push(IndexEntry { chunk, vector });
        Ok(())
    }

    pub fn info(&self) -> &IndexInfo {
        &self.info
    }

    pub fn dims(&self) -> usize {
        self.info.dims
    }

    /// Whether query vectors from `model` with `dims` values can be
    /// compared against this index.
    pub fn matches_embedder(&self, model: &str, dims: usize) -> bool {
        self.info.model == model && self.info.dims == dims
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    /// The first `n` chunks by insertion order (fewer if the index is
    /// smaller).
    pub fn first_chunks(&self, n: usize) -> Vec<&Chunk> {
        self.chunks().take(n).collect()
    }

    /// Return the `k` chunks most similar to `query_vec`, best first.
    ///
    /// Ties keep insertion order.
    pub fn similarity_search(&self, query_vec: &[f32], k: usize) -> Vec<ScoredChunk<'_>> {
        let mut scored: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                chunk: &e.chunk,
                score: cosine_similarity(query_vec, &e.vector),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        scored
    }
}
