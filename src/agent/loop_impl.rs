//! Agent loop - one prompt/answer round trip with optional tool calls

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::tools::{Toolkit, ToolRegistry, ToolSpec};
use crate::Result;

use super::context::Context;
use super::llm::LlmClient;
use super::message::{Message, ToolCall};

/// The agent loop asks the LLM, runs the tools it requested and asks again.
///
/// At most two gateway calls happen per run:
/// - tools requested: `[M1, result_1, .., result_n, final]`
/// - nothing runnable: `[M1, plain]`, where the plain call has tools disabled
pub struct AgentLoop {
    client: Arc<dyn LlmClient>,
    registry: ToolRegistry,
}

impl AgentLoop {
    /// Create a new agent loop
    pub fn new(client: Arc<dyn LlmClient>, registry: ToolRegistry) -> Self {
        Self { client, registry }
    }

    /// Merge toolkits left to right and build a loop over them
    pub fn from_toolkits(client: Arc<dyn LlmClient>, toolkits: &[Toolkit]) -> Self {
        Self::new(client, ToolRegistry::from_toolkits(toolkits))
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    /// Run the loop over a history snapshot.
    ///
    /// Returns only the newly produced messages; the caller decides whether
    /// they are appended to the durable history.
    pub async fn run(&self, model: &str, history: &[Message], ctx: &Context) -> Result<Vec<Message>> {
        let specs: Vec<ToolSpec> = self.registry.specs();
        info!(model, messages = history.len(), tools = specs.len(), "Starting agent loop");

        let first = self.client.chat(model, history, Some(&specs)).await?;
        let m1 = first.into_message();

        let calls: Vec<ToolCall> = m1
            .tool_calls
            .iter()
            .filter(|call| {
                let known = self.registry.has(&call.name);
                if !known {
                    warn!(tool = %call.name, "LLM requested an unknown tool, dropping it");
                }
                known
            })
            .cloned()
            .collect();

        let mut produced = vec![m1];

        if calls.is_empty() {
            debug!("No runnable tool calls, asking for a plain answer");
            let plain = self.client.chat(model, history, None).await?;
            produced.push(plain.into_message());
            return Ok(produced);
        }

        for call in calls {
            if let Some(payload) = self.registry.dispatch(&call, ctx).await {
                produced.push(Message::tool_result(call, &payload));
            }
        }
        debug!(results = produced.len() - 1, "Tools executed, asking for the final answer");

        let mut transcript = Vec::with_capacity(history.len() + produced.len());
        transcript.extend_from_slice(history);
        transcript.extend_from_slice(&produced);

        let last = self.client.chat(model, &transcript, None).await?;
        produced.push(last.into_message());

        info!(produced = produced.len(), "Agent loop finished");
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{FakeLlmClient, LlmResponse};
    use crate::agent::{system_prompt, Metadata, Role};
    use crate::error::Error;
    use crate::tools::{DummyTool, Toolkit};
    use serde_json::json;

    fn toolkit() -> Toolkit {
        Toolkit::new("test")
            .with(DummyTool::new("get_weather", json!({"temp": 21})))
            .with(DummyTool::new("open_application", json!({"archetype": "frontend-capability"})))
    }

    fn history() -> Vec<Message> {
        vec![system_prompt(), Message::user("What's the weather?")]
    }

    fn call(name: &str) -> ToolCall {
        ToolCall::new(name, json!({}))
    }

    #[tokio::test]
    async fn test_no_tools_returns_two_messages() {
        let fake = Arc::new(FakeLlmClient::new(vec![
            LlmResponse::text(""),
            LlmResponse::text("It is sunny."),
        ]));
        let agent = AgentLoop::from_toolkits(fake.clone(), &[toolkit()]);
        let ctx = Context::new(Metadata::default());

        let produced = agent.run("qwen2.5", &history(), &ctx).await.unwrap();

        assert_eq!(produced.len(), 2);
        assert_eq!(produced[1].content, "It is sunny.");

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(
            calls[0].tools,
            Some(vec!["get_weather".to_string(), "open_application".to_string()])
        );
        assert!(calls[1].tools.is_none());
        // the plain re-ask sees the same snapshot, not M1
        assert_eq!(calls[1].messages, history());
    }

    #[tokio::test]
    async fn test_tool_calls_in_requested_order() {
        let fake = Arc::new(FakeLlmClient::new(vec![
            LlmResponse::with_tool_calls(vec![call("open_application"), call("get_weather")]),
            LlmResponse::text("Done."),
        ]));
        let agent = AgentLoop::from_toolkits(fake.clone(), &[toolkit()]);
        let ctx = Context::new(Metadata::default());

        let produced = agent.run("qwen2.5", &history(), &ctx).await.unwrap();

        let roles: Vec<Role> = produced.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::Tool, Role::Tool, Role::Assistant]);
        assert_eq!(produced[1].tool_calls[0].name, "open_application");
        assert_eq!(produced[2].tool_calls[0].name, "get_weather");
        assert_eq!(produced[2].content, json!({"temp": 21}).to_string());
        assert_eq!(produced[3].content, "Done.");

        let calls = fake.calls();
        assert!(calls[1].tools.is_none());
        assert_eq!(calls[1].messages.len(), history().len() + 3);
    }

    #[tokio::test]
    async fn test_unknown_tools_are_dropped() {
        let fake = Arc::new(FakeLlmClient::new(vec![
            LlmResponse::with_tool_calls(vec![call("hack_the_planet"), call("get_weather")]),
            LlmResponse::text("Warm."),
        ]));
        let agent = AgentLoop::from_toolkits(fake, &[toolkit()]);
        let ctx = Context::new(Metadata::default());

        let produced = agent.run("m", &history(), &ctx).await.unwrap();

        assert_eq!(produced.len(), 3);
        assert!(produced[1..]
            .iter()
            .all(|m| m.tool_calls.iter().all(|c| c.name != "hack_the_planet")));
    }

    #[tokio::test]
    async fn test_only_unknown_tools_falls_back_to_plain_call() {
        let fake = Arc::new(FakeLlmClient::new(vec![
            LlmResponse::with_tool_calls(vec![call("hack_the_planet")]),
            LlmResponse::text("I can't do that."),
        ]));
        let agent = AgentLoop::from_toolkits(fake.clone(), &[toolkit()]);
        let ctx = Context::new(Metadata::default());

        let produced = agent.run("m", &history(), &ctx).await.unwrap();

        assert_eq!(produced.len(), 2);
        assert_eq!(produced[1].content, "I can't do that.");
        assert!(fake.calls()[1].tools.is_none());
    }

    #[tokio::test]
    async fn test_tool_error_still_gets_final_answer() {
        let ctx = Context::new(Metadata::default());
        let fake = Arc::new(FakeLlmClient::new(vec![
            LlmResponse::with_tool_calls(vec![ToolCall::new("search_on_youtube", json!({}))]),
            LlmResponse::text("What should I search for?"),
        ]));
        let kit = Toolkit::new("strict").with(crate::tools::device::SearchOnYoutubeTool);
        let agent = AgentLoop::from_toolkits(fake, &[kit]);

        let produced = agent.run("m", &history(), &ctx).await.unwrap();
        assert_eq!(produced.len(), 3);
        let payload: serde_json::Value = serde_json::from_str(&produced[1].content).unwrap();
        assert_eq!(payload["error"], json!("agent-tool-error"));
        assert_eq!(produced[2].content, "What should I search for?");
    }

    #[tokio::test]
    async fn test_gateway_error_propagates() {
        let fake = Arc::new(FakeLlmClient::scripted(vec![Err(Error::LlmStatus {
            status: 500,
            message: "boom".to_string(),
        })]));
        let agent = AgentLoop::from_toolkits(fake, &[toolkit()]);
        let ctx = Context::new(Metadata::default());

        assert!(agent.run("m", &history(), &ctx).await.is_err());
    }

    #[tokio::test]
    async fn test_run_is_idempotent() {
        let script = || {
            vec![
                LlmResponse::with_tool_calls(vec![call("get_weather").with_id("tc_0")]),
                LlmResponse::text("Sunny, 21 degrees."),
            ]
        };
        let ctx = Context::new(Metadata::default());

        let first = AgentLoop::from_toolkits(Arc::new(FakeLlmClient::new(script())), &[toolkit()])
            .run("m", &history(), &ctx)
            .await
            .unwrap();
        let second = AgentLoop::from_toolkits(Arc::new(FakeLlmClient::new(script())), &[toolkit()])
            .run("m", &history(), &ctx)
            .await
            .unwrap();

        assert_eq!(first, second);
    }
}
