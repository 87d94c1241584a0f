//! Tools module - agent capabilities
//!
//! Tools are actions the assistant can take on the user's behalf: opening
//! apps on the phone, preparing messages, fetching the weather, managing a
//! to-do list and managing the conversation itself. Tools are grouped into
//! [`Toolkit`]s and merged into one [`ToolRegistry`] per agent.

mod payload;
mod registry;
mod schema;
mod similarity;
mod toolkit;

pub mod conversation;
pub mod device;
pub mod todo;
pub mod weather;

pub use payload::{success, CapabilityKind, FrontendCapability, ToolError, AGENT_TOOL_ERROR};
pub use registry::{CollisionPolicy, ToolRegistry, ToolSpec};
pub use schema::{json_schema, Arguments, ParamKind, Parameter};
pub use similarity::{find_similar, ratio};
pub use toolkit::Toolkit;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::Context;
use crate::config::Config;

/// What a tool hands back: a JSON payload or a domain error for the LLM.
pub type ToolResult = std::result::Result<Value, ToolError>;

/// Tool trait - interface for all agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls
    fn name(&self) -> &str;

    /// Description the LLM uses to decide when the tool applies
    fn description(&self) -> &str;

    /// Declared parameters; used both for the schema and for validation
    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    /// Execute the tool with validated arguments
    async fn execute(&self, args: Arguments, ctx: &Context) -> ToolResult;

    /// Convert to tool spec for LLM
    fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: json_schema(self.parameters()),
        }
    }
}

/// The toolkits every assistant loads, in registration order.
pub fn builtin_toolkits(config: &Config, todos: todo::TodoList) -> Vec<Toolkit> {
    vec![
        todo::toolkit(todos),
        device::toolkit(),
        weather::toolkit(weather::WeatherTool::new(&config.weather_api_url)),
        conversation::toolkit(),
    ]
}

/// Dummy tool for testing
#[cfg(test)]
pub struct DummyTool {
    pub name: String,
    pub result: Value,
}

#[cfg(test)]
impl DummyTool {
    pub fn new(name: &str, result: Value) -> Self {
        Self { name: name.to_string(), result }
    }
}

#[cfg(test)]
#[async_trait]
impl Tool for DummyTool {
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> &str { "Dummy tool for testing" }

    async fn execute(&self, _args: Arguments, _ctx: &Context) -> ToolResult {
        Ok(self.result.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_toolkit_names() {
        let toolkits = builtin_toolkits(&Config::default(), todo::TodoList::new());
        let names: Vec<&str> = toolkits.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["to_do_list", "device", "weather", "conversation"]);

        let registry = ToolRegistry::from_toolkits(&toolkits);
        for tool in [
            "add_item_to_to_do_list",
            "open_application",
            "send_whatsapp_message",
            "search_on_youtube",
            "get_weather",
            "forget_conversation",
            "delegate_task_to_reasoning_model",
        ] {
            assert!(registry.has(tool), "missing {tool}");
        }
    }
}
