//! Text completion provider trait.
//!
//! The responder and the auditor send a single prompt string and expect a
//! single reply string. Concrete HTTP clients live in the `docdrift` app
//! crate; tests substitute scripted implementations.

use anyhow::Result;
use async_trait::async_trait;

/// A prompt-in, text-out language model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the model identifier (e.g. `"llama-3.3-70b-versatile"`).
    fn model_name(&self) -> &str;

    /// Send `prompt` as a single user message and return the reply text
    /// unmodified.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
