//! Retry-with-backoff decorator for any [`LlmClient`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::tools::ToolSpec;
use crate::Result;

use super::super::message::Message;
use super::{LlmClient, LlmResponse};

/// Retries transient gateway failures (HTTP 429, 5xx, timeouts, refused
/// connections) with exponential backoff. Other errors pass through at once.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

#[async_trait]
impl LlmClient for RetryingClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(model, messages, tools).await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        max = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
