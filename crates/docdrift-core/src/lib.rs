//! # docdrift core
//!
//! Runtime-agnostic logic for docdrift: data models, recursive chunking,
//! the session vector index, the index store trait, provider traits,
//! prompt assembly, and tolerant parsing of audit replies.
//!
//! This crate contains no tokio, HTTP, or filesystem dependencies. The
//! application crate supplies concrete providers and the on-disk store.

pub mod audit;
pub mod chunk;
pub mod completion;
pub mod embedding;
pub mod index;
pub mod models;
pub mod prompt;
pub mod store;
