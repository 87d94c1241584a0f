//! Message types for agent communication

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One turn in a conversation. Never mutated once appended to a history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,

    /// Text content; empty when the message only carries tool calls
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant, or the call a tool result answers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create an assistant message with tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
        }
    }

    /// Create a tool result message.
    ///
    /// The payload is stored as JSON text and the originating call is echoed
    /// back so gateways can correlate the result with the request.
    pub fn tool_result(call: ToolCall, payload: &Value) -> Self {
        Self {
            role: Role::Tool,
            content: payload.to_string(),
            tool_calls: vec![call],
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A single request from the LLM to invoke a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider-assigned id, when the provider has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments keyed by parameter name
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            arguments: arguments_map(arguments),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Normalise the argument shapes providers send into a JSON object.
///
/// Some models encode arguments as a JSON string; anything that is not an
/// object after decoding becomes an empty map.
pub fn arguments_map(arguments: Value) -> Map<String, Value> {
    match arguments {
        Value::Object(map) => map,
        Value::String(raw) => match serde_json::from_str(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(!msg.has_tool_calls());
    }

    #[test]
    fn test_tool_result_echoes_call() {
        let call = ToolCall::new("get_weather", json!({})).with_id("tc_0");
        let msg = Message::tool_result(call.clone(), &json!({"origin": "get_weather", "success": true}));

        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_calls, vec![call]);
        let parsed: Value = serde_json::from_str(&msg.content).unwrap();
        assert_eq!(parsed["success"], json!(true));
    }

    #[test]
    fn test_role_wire_format() {
        let msg = Message::assistant("hi");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_arguments_from_string() {
        let map = arguments_map(json!("{\"item\": \"milk\"}"));
        assert_eq!(map.get("item"), Some(&json!("milk")));

        assert!(arguments_map(json!("not json")).is_empty());
        assert!(arguments_map(json!([1, 2])).is_empty());
    }
}
