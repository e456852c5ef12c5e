//! Recursive character text splitter.
//!
//! Splits document text into [`Chunk`]s of at most `chunk_size` characters,
//! with up to `chunk_overlap` characters repeated between consecutive
//! chunks of the same document.
//!
//! # Algorithm
//!
//! 1. Pick the first separator from `"\n\n"`, `"\n"`, `" "`, `""` that occurs
//!    in the text (`""` splits into single characters).
//! 2. Split on it. Pieces shorter than `chunk_size` are accumulated.
//! 3. Pieces that are too long flush the accumulated ones and are split
//!    again with the remaining, finer separators.
//! 4. Accumulated pieces are merged back together with the separator into
//!    windows no longer than `chunk_size`; after each emitted window the
//!    front of the buffer is dropped until at most `chunk_overlap`
//!    characters remain, so the tail is carried into the next window.
//! 5. Every window is whitespace-trimmed and empty windows are dropped.
//!
//! All lengths are counted in `char`s.
//!
//! # Example
//!
//! ```rust
//! use docdrift_core::chunk::{chunk_document, ChunkingParams};
//! use docdrift_core::models::SourceDoc;
//!
//! let doc = SourceDoc::new("Old_Documentation.txt", "Hello world.\n\nSecond paragraph.");
//! let chunks = chunk_document(&doc, ChunkingParams::default());
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].source, "Old_Documentation.txt");
//! ```

use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, SourceDoc};

/// Separators tried in order, coarsest first.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Size limits for the splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Maximum characters shared by consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Chunk a single document. Indices are contiguous from 0 and every chunk
/// carries the document's source label.
pub fn chunk_document(doc: &SourceDoc, params: ChunkingParams) -> Vec<Chunk> {
    split_text(&doc.text, params)
        .iter()
        .enumerate()
        .map(|(i, text)| make_chunk(&doc.source, i as i64, text))
        .collect()
}

/// Chunk several documents, keeping document order: all chunks of the first
/// document precede those of the second, and so on. Overlap never crosses
/// a document boundary.
pub fn chunk_documents(docs: &[SourceDoc], params: ChunkingParams) -> Vec<Chunk> {
    docs.iter()
        .flat_map(|doc| chunk_document(doc, params))
        .collect()
}

/// Split raw text into trimmed, non-empty windows.
pub fn split_text(text: &str, params: ChunkingParams) -> Vec<String> {
    split_recursive(text, &SEPARATORS, params)
}

fn split_recursive(text: &str, separators: &[&str], params: ChunkingParams) -> Vec<String> {
    let mut separator = "";
    let mut finer: &[&str] = &[];
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() {
            break;
        }
        if text.contains(sep) {
            separator = sep;
            finer = &separators[i + 1..];
            break;
        }
    }

    let pieces: Vec<String> = if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    };

    let mut out = Vec::new();
    let mut pending: Vec<String> = Vec::new();

    for piece in pieces {
        if char_len(&piece) < params.chunk_size {
            pending.push(piece);
            continue;
        }
        if !pending.is_empty() {
            out.extend(merge_splits(&pending, separator, params));
            pending.clear();
        }
        if finer.is_empty() {
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                out.push(trimmed.to_string());
            }
        } else {
            out.extend(split_recursive(&piece, finer, params));
        }
    }

    if !pending.is_empty() {
        out.extend(merge_splits(&pending, separator, params));
    }

    out
}

fn merge_splits(pieces: &[String], separator: &str, params: ChunkingParams) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut windows = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    let joiner = |current: &VecDeque<&str>| if current.is_empty() { 0 } else { sep_len };

    for piece in pieces {
        let len = char_len(piece);

        if total + len + joiner(&current) > params.chunk_size && !current.is_empty() {
            push_window(&mut windows, &current, separator);

            // Drop from the front until only the overlap tail remains and
            // the incoming piece fits.
            while total > params.chunk_overlap
                || (total > 0 && total + len + joiner(&current) > params.chunk_size)
            {
                let Some(front) = current.pop_front() else {
                    break;
                };
                total -= char_len(front) + joiner(&current);
            }
        }

        total += len + joiner(&current);
        current.push_back(piece);
    }

    push_window(&mut windows, &current, separator);
    windows
}

fn push_window(windows: &mut Vec<String>, current: &VecDeque<&str>, separator: &str) {
    let joined = current.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        windows.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn make_chunk(source: &str, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source: source.to_string(),
        chunk_index: index,
        text: text.to_string(),
        hash,
    }
}
