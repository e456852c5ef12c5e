//! Completion provider implementations.
//!
//! - **[`OpenAiCompatibleProvider`]**: any `/chat/completions` API speaking the
//!   OpenAI wire format (Groq by default).
//! - **[`DisabledProvider`]**: always errors; for deployments that only
//!   index and never call a model.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use docdrift_core::completion::CompletionProvider;

use crate::config::LlmConfig;
use crate::retry::post_json_with_retry;

/// Chat-completions client for OpenAI-compatible APIs.
///
/// Each prompt is sent as a single user message. The API key is read from
/// the environment variable named by `llm.api_key_env` when the provider
/// is created; a missing key is reported on the first call, so the server
/// can still start and serve `/load-scenario`.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    api_key_env: String,
    max_retries: u32,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                "{} is not set; chat and audit requests will fail until it is",
                config.api_key_env
            );
        }

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            api_key_env: config.api_key_env.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompatibleProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("{} environment variable not set", self.api_key_env))?;

        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let json = post_json_with_retry("Completion", self.max_retries, || {
            self.client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(&body)
        })
        .await?;

        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Invalid completion response: missing choices[0].message.content"))
}

/// A completion provider that refuses every request.
pub struct DisabledProvider;

#[async_trait]
impl CompletionProvider for DisabledProvider {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        bail!("Completion provider is disabled")
    }
}

/// Create the completion provider named by `llm.provider`.
pub fn create_completion_provider(config: &LlmConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config.provider.as_str() {
        "openai-compatible" => Ok(Arc::new(OpenAiCompatibleProvider::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledProvider)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_response() {
        let json = serde_json::json!({
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Use print()."}}]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "Use print().");
    }

    #[test]
    fn test_parse_completion_response_without_choices() {
        let json = serde_json::json!({"choices": []});
        assert!(parse_completion_response(&json).is_err());
    }

    #[tokio::test]
    async fn test_disabled_provider_errors() {
        let err = DisabledProvider.complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[tokio::test]
    async fn test_missing_api_key_reported_on_call() {
        let config = LlmConfig {
            api_key_env: "DOCDRIFT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        let provider = OpenAiCompatibleProvider::new(&config).unwrap();
        assert_eq!(provider.model_name(), "llama-3.3-70b-versatile");
        let err = provider.complete("hi").await.unwrap_err();
        assert!(err.to_string().contains("DOCDRIFT_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = LlmConfig {
            base_url: "https://api.groq.com/openai/v1/".to_string(),
            ..LlmConfig::default()
        };
        let provider = OpenAiCompatibleProvider::new(&config).unwrap();
        assert_eq!(
            provider.endpoint,
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }
}
