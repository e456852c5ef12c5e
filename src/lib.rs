//! # docdrift
//!
//! A demo backend that finds drift between old product documentation and
//! a newer changelog.
//!
//! A client picks a *scenario* (an old-docs/new-changelog pair). The two
//! documents are chunked, embedded, and stored as a vector index owned by
//! the client's session. The session can then ask questions answered from
//! retrieved chunks, or request an audit in which a language model lists
//! contradictions between the old docs and the changelog.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Scenarios │──▶│   Indexer    │──▶│ SessionStore │──▶ index_root/<session>/
//! │ (catalog) │   │ Chunk+Embed  │   │  (resident)  │
//! └───────────┘   └──────────────┘   └──────┬───────┘
//!                                           │
//!                         ┌─────────────────┤
//!                         ▼                 ▼
//!                   ┌───────────┐     ┌───────────┐
//!                   │ Responder │     │  Auditor  │
//!                   │  (/chat)  │     │ (/maint.) │
//!                   └───────────┘     └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docdrift scenarios
//! docdrift load python --session demo
//! docdrift ask "How do I print?" --session demo
//! docdrift audit --session demo
//! docdrift serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`scenarios`] | Built-in scenario catalog |
//! | [`embedding`] | Embedding provider implementations |
//! | [`llm`] | Completion provider implementations |
//! | [`disk_store`] | On-disk per-session index persistence |
//! | [`session`] | Resident session map with lazy reload |
//! | [`indexer`] | Scenario loading |
//! | [`responder`] | Retrieval-augmented chat |
//! | [`auditor`] | Old-docs vs changelog consistency audit |
//! | [`server`] | HTTP API |
//! | [`error`] | Upstream and storage failures |
//! | [`retry`] | HTTP retry with backoff |
//!
//! Runtime-agnostic pieces (chunking, the vector index, prompts, audit
//! parsing, provider traits) live in the `docdrift-core` crate.

pub mod auditor;
pub mod config;
pub mod disk_store;
pub mod embedding;
pub mod error;
pub mod indexer;
pub mod llm;
pub mod responder;
pub mod retry;
pub mod scenarios;
pub mod server;
pub mod session;
