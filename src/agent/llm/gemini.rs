//! Gemini LLM client implementation (API key authentication).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::error::Error;
use crate::tools::ToolSpec;
use crate::Result;

use super::super::message::{Message, Role, ToolCall};
use super::{GeminiResponse, LlmClient, LlmResponse, Usage};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    /// Create a new Gemini client with API key.
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, GEMINI_API_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn build_url(&self, model: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    /// Gemini rejects a model turn whose `functionCall` parts are not all
    /// answered by the following `functionResponse` turns, and rejects empty
    /// text parts. Calls nobody answered (unknown tools) are dropped, and a
    /// model turn left with no parts is skipped.
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        let mut contents = Vec::new();

        for (i, m) in messages.iter().enumerate() {
            match m.role {
                Role::System => {}
                Role::Tool => {
                    let name = m.tool_calls.first().map_or("unknown", |c| c.name.as_str());
                    let result: Value =
                        serde_json::from_str(&m.content).unwrap_or_else(|_| json!(m.content));
                    contents.push(json!({
                        "role": "function",
                        "parts": [{
                            "functionResponse": {
                                "name": name,
                                "response": {"result": result}
                            }
                        }]
                    }));
                }
                Role::Assistant => {
                    let answered: Vec<&ToolCall> = messages[i + 1..]
                        .iter()
                        .take_while(|next| next.role == Role::Tool)
                        .filter_map(|next| next.tool_calls.first())
                        .collect();

                    let mut parts = Vec::new();
                    if !m.content.is_empty() {
                        parts.push(json!({"text": m.content}));
                    }
                    parts.extend(m.tool_calls.iter().filter(|tc| answered.contains(tc)).map(|tc| {
                        json!({
                            "functionCall": {
                                "name": tc.name,
                                "args": tc.arguments
                            }
                        })
                    }));

                    if !parts.is_empty() {
                        contents.push(json!({"role": "model", "parts": parts}));
                    }
                }
                Role::User => contents.push(json!({"role": "user", "parts": [{"text": m.content}]})),
            }
        }

        contents
    }

    fn get_system_instruction(messages: &[Message]) -> Option<String> {
        messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.clone())
    }

    fn convert_tools(tools: &[ToolSpec]) -> Option<Value> {
        if tools.is_empty() {
            return None;
        }

        let function_declarations: Vec<Value> = tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters
                })
            })
            .collect();

        Some(json!([{
            "functionDeclarations": function_declarations
        }]))
    }

    fn parse_response(response: GeminiResponse) -> Result<LlmResponse> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No candidates in response".to_string()))?;

        let mut content: Option<String> = None;
        let mut tool_calls = Vec::new();

        for part in candidate.content.parts {
            if let Some(text) = part.text {
                content.get_or_insert_with(String::new).push_str(&text);
            }

            if let Some(fc) = part.function_call {
                let id = format!("tc_{}", tool_calls.len());
                tool_calls.push(ToolCall::new(fc.name, fc.args).with_id(id));
            }
        }

        let usage = response
            .usage_metadata
            .map(|u| Usage {
                prompt_tokens: u.prompt_token_count.unwrap_or(0),
                completion_tokens: u.candidates_token_count.unwrap_or(0),
                total_tokens: u.total_token_count.unwrap_or(0),
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            tool_calls,
            finish_reason: candidate.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        tools: Option<&[ToolSpec]>,
    ) -> Result<LlmResponse> {
        let mut request = json!({
            "contents": Self::convert_messages(messages),
            "generationConfig": {
                "temperature": 0.7,
                "maxOutputTokens": 8192
            }
        });

        if let Some(system) = Self::get_system_instruction(messages) {
            request["systemInstruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        if let Some(tool_config) = tools.and_then(Self::convert_tools) {
            request["tools"] = tool_config;
        }

        let response = self.client.post(self.build_url(model)).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::LlmStatus {
                status: status.as_u16(),
                message,
            });
        }

        let gemini_response: GeminiResponse = response.json().await?;
        Self::parse_response(gemini_response)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_tool_result_uses_echoed_call_name() {
        let call = ToolCall::new("get_weather", json!({}));
        let messages = vec![
            Message::system("be brief"),
            Message::user("Weather?"),
            Message::assistant_with_tools("", vec![call.clone()]),
            Message::tool_result(call, &json!({"temp": 20})),
        ];

        let contents = GeminiClient::convert_messages(&messages);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[1]["role"], json!("model"));
        let response = &contents[2]["parts"][0]["functionResponse"];
        assert_eq!(response["name"], json!("get_weather"));
        assert_eq!(response["response"]["result"]["temp"], json!(20));
    }

    #[test]
    fn test_unanswered_calls_are_dropped() {
        let known = ToolCall::new("get_weather", json!({})).with_id("tc_1");
        let messages = vec![
            Message::user("Weather?"),
            Message::assistant_with_tools(
                "",
                vec![ToolCall::new("hack_the_planet", json!({})).with_id("tc_0"), known.clone()],
            ),
            Message::tool_result(known, &json!({"temp": 20})),
            Message::assistant("Sunny."),
        ];

        let contents = GeminiClient::convert_messages(&messages);
        assert_eq!(contents.len(), 4);
        let parts = contents[1]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0]["functionCall"]["name"], json!("get_weather"));
        assert_eq!(contents[2]["parts"][0]["functionResponse"]["name"], json!("get_weather"));
    }

    #[test]
    fn test_empty_model_turn_is_skipped() {
        let messages = vec![
            Message::user("Hi"),
            Message::assistant(""),
            Message::assistant_with_tools("", vec![ToolCall::new("hack_the_planet", json!({}))]),
            Message::assistant("Hello!"),
        ];

        let contents = GeminiClient::convert_messages(&messages);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1], json!({"role": "model", "parts": [{"text": "Hello!"}]}));
    }

    #[tokio::test]
    async fn test_chat_parses_function_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/gemini-pro:generateContent"))
            .and(query_param("key", "secret-key"))
            .and(body_partial_json(json!({"systemInstruction": {"parts": [{"text": "be brief"}]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"functionCall": {"name": "search_on_youtube", "args": {"query": "cats"}}}
                    ]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 5, "candidatesTokenCount": 2, "totalTokenCount": 7}
            })))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::with_base_url("secret-key", &mock_server.uri());
        let response = client
            .chat(
                "gemini-pro",
                &[Message::system("be brief"), Message::user("cats")],
                None,
            )
            .await
            .unwrap();

        assert_eq!(response.tool_calls.len(), 1);
        assert_eq!(response.tool_calls[0].name, "search_on_youtube");
        assert_eq!(response.tool_calls[0].arguments["query"], json!("cats"));
        assert_eq!(response.usage.total_tokens, 7);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&mock_server)
            .await;

        let client = GeminiClient::with_base_url("k", &mock_server.uri());
        let err = client.chat("m", &[Message::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, Error::LlmStatus { status: 429, .. }));
    }
}
