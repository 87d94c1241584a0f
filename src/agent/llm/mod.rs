//! LLM client abstraction layer.
//!
//! This module provides:
//! - [`LlmClient`] trait for swappable LLM providers
//! - [`ProviderRegistry`] for dynamic provider creation
//! - Concrete implementations: Ollama, Gemini API key
//! - [`RetryingClient`] for backoff on transient gateway failures
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `openai.rs`)
//! 2. Implement `LlmClient` trait
//! 3. Add to `ProviderRegistry::create()`
//! 4. Add config fields in `config.rs`

mod types;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::tools::ToolSpec;
use crate::Result;

pub use types::*;

pub mod gemini;
pub mod ollama;
pub mod retry;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use retry::RetryingClient;

use super::message::{Message, ToolCall};

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Text content of the response.
    pub content: Option<String>,

    /// Tool calls requested by the LLM.
    pub tool_calls: Vec<ToolCall>,

    /// Reason the response finished.
    pub finish_reason: String,

    /// Token usage statistics.
    pub usage: Usage,
}

impl LlmResponse {
    /// Create a simple text response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
            usage: Usage::default(),
        }
    }

    /// Create a response that only requests tool calls.
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
            finish_reason: "tool_calls".to_string(),
            usage: Usage::default(),
        }
    }

    /// Check if response has tool calls.
    #[inline]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// The assistant message this response represents.
    pub fn into_message(self) -> Message {
        Message::assistant_with_tools(self.content.unwrap_or_default(), self.tool_calls)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

/// LLM client trait: swappable provider abstraction.
///
/// Implement this trait to add a new LLM provider.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send messages and get one assistant response.
    ///
    /// `tools = None` disables tool calling and forces a plain-text reply.
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<LlmResponse>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Provider registry: creates LLM clients dynamically.
///
/// # Example
///
/// ```ignore
/// let client = ProviderRegistry::create(&config)?;
/// let response = client.chat(&config.llm, &messages, Some(&specs)).await?;
/// ```
pub struct ProviderRegistry;

impl ProviderRegistry {
    /// Create an LLM client from configuration, wrapped in retry-with-backoff.
    ///
    /// Supported providers:
    /// - `"ollama"`: local or remote Ollama server
    /// - `"gemini"`: Gemini API with API key authentication
    pub fn create(config: &Config) -> Result<Arc<dyn LlmClient>> {
        let client: Arc<dyn LlmClient> = match config.provider.as_str() {
            "ollama" => Arc::new(OllamaClient::new(&config.ollama_host)?),
            "gemini" => Arc::new(GeminiClient::new(&config.gemini_api_key)),
            other => return Err(Error::Config(format!("Unknown provider: {other}"))),
        };

        if config.retry.max_retries == 0 {
            return Ok(client);
        }
        Ok(Arc::new(RetryingClient::new(
            client,
            config.retry.max_retries,
            Duration::from_millis(config.retry.base_delay_ms),
        )))
    }

    /// List available provider names.
    pub fn available() -> &'static [&'static str] {
        crate::config::PROVIDERS
    }
}

/// One request seen by [`FakeLlmClient`].
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub model: String,
    pub messages: Vec<Message>,
    /// Names of the offered tools, `None` when tools were disabled.
    pub tools: Option<Vec<String>>,
}

/// Fake LLM client for testing.
#[cfg(test)]
pub struct FakeLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<LlmResponse>>>,
    calls: std::sync::Mutex<Vec<RecordedChat>>,
}

#[cfg(test)]
impl FakeLlmClient {
    /// Create with scripted responses, returned in order.
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self::scripted(responses.into_iter().map(Ok).collect())
    }

    /// Create with scripted results, so failures can be injected.
    pub fn scripted(responses: Vec<Result<LlmResponse>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create with predefined text responses.
    pub fn texts(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|s| LlmResponse::text(*s)).collect())
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<RecordedChat> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<LlmResponse> {
        self.calls.lock().unwrap().push(RecordedChat {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.map(|t| t.iter().map(|s| s.name.clone()).collect()),
        });

        let mut responses = self.responses.lock().unwrap();
        responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Llm("No more fake responses".to_string())))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_llm_client() {
        let client = FakeLlmClient::texts(&["Hello!", "World!"]);

        let resp1 = client.chat("m", &[], None).await.unwrap();
        assert_eq!(resp1.content.as_deref(), Some("Hello!"));

        let resp2 = client.chat("m", &[], Some(&[])).await.unwrap();
        assert_eq!(resp2.content.as_deref(), Some("World!"));

        assert!(client.chat("m", &[], None).await.is_err());

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[0].tools.is_none());
        assert_eq!(calls[1].tools, Some(vec![]));
    }

    #[test]
    fn test_into_message() {
        let call = ToolCall::new("get_weather", serde_json::json!({}));
        let message = LlmResponse::with_tool_calls(vec![call.clone()]).into_message();
        assert_eq!(message.content, "");
        assert_eq!(message.tool_calls, vec![call]);
    }

    #[test]
    fn test_registry_rejects_unknown_provider() {
        let mut config = Config::default();
        config.provider = "openai".to_string();
        assert!(ProviderRegistry::create(&config).is_err());

        let config = Config::default();
        let client = ProviderRegistry::create(&config).unwrap();
        assert_eq!(client.name(), "ollama");
    }
}
