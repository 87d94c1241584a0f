//! Ollama LLM client implementation (`/api/chat`, non-streaming).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::Error;
use crate::tools::ToolSpec;
use crate::Result;

use super::super::message::{Message, Role, ToolCall};
use super::{LlmClient, LlmResponse, OllamaResponse, Usage};

pub const OLLAMA_HOST: &str = "http://localhost:11434";

/// Ollama client talking to a local or remote server.
#[derive(Clone)]
pub struct OllamaClient {
    host: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(host: &str) -> Result<Self> {
        // local models can take minutes to load
        let client = Client::builder().timeout(Duration::from_secs(600)).build()?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| match m.role {
                Role::Tool => {
                    let mut entry = json!({"role": "tool", "content": m.content});
                    if let Some(call) = m.tool_calls.first() {
                        entry["tool_name"] = json!(call.name);
                    }
                    entry
                }
                Role::Assistant if m.has_tool_calls() => {
                    let calls: Vec<Value> = m
                        .tool_calls
                        .iter()
                        .map(|tc| {
                            json!({
                                "function": {
                                    "name": tc.name,
                                    "arguments": tc.arguments
                                }
                            })
                        })
                        .collect();

                    json!({
                        "role": "assistant",
                        "content": m.content,
                        "tool_calls": calls
                    })
                }
                role => json!({"role": role.as_str(), "content": m.content}),
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolSpec]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters
                    }
                })
            })
            .collect()
    }

    fn parse_response(response: OllamaResponse) -> LlmResponse {
        let tool_calls: Vec<ToolCall> = response
            .message
            .tool_calls
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall::new(tc.function.name, tc.function.arguments).with_id(format!("tc_{i}")))
            .collect();

        let prompt_tokens = response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = response.eval_count.unwrap_or(0);

        // Ollama says "stop" even when the turn carries tool calls
        let finish_reason = if tool_calls.is_empty() {
            response.done_reason.unwrap_or_else(|| "stop".to_string())
        } else {
            "tool_calls".to_string()
        };

        let content = response.message.content;
        LlmResponse {
            content: (!content.is_empty()).then_some(content),
            finish_reason,
            tool_calls,
            usage: Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<LlmResponse> {
        let mut request = json!({
            "model": model,
            "messages": Self::convert_messages(messages),
            "stream": false
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            request["tools"] = json!(Self::convert_tools(tools));
        }

        let url = format!("{}/api/chat", self.host);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::LlmStatus {
                status: status.as_u16(),
                message,
            });
        }

        let ollama_response: OllamaResponse = response.json().await?;
        Ok(Self::parse_response(ollama_response))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
