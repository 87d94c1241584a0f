//! Structured tool results as the LLM reads them.

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Tag every tool-domain error carries on the wire.
pub const AGENT_TOOL_ERROR: &str = "agent-tool-error";

/// A tool could not complete its intent.
///
/// Serialized into a normal tool-result message so the LLM can explain the
/// failure to the user; it never aborts the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{origin}: {message}")]
pub struct ToolError {
    pub origin: String,
    pub message: String,
}

impl ToolError {
    pub fn new(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "error": AGENT_TOOL_ERROR,
            "origin": self.origin,
            "message": self.message,
        })
    }
}

/// Success marker for tools with nothing else to report.
pub fn success(origin: &str) -> Value {
    json!({ "origin": origin, "success": true })
}

/// Action the mobile front end performs after reading the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityKind {
    OpenApp,
    OpenAppWithIntent,
}

/// Payload consumed by the front end rather than by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontendCapability {
    archetype: &'static str,
    pub kind: CapabilityKind,
    pub data: Value,
}

impl FrontendCapability {
    pub fn new(kind: CapabilityKind, data: Value) -> Self {
        Self {
            archetype: "frontend-capability",
            kind,
            data,
        }
    }

    pub fn open_app(package: &str) -> Self {
        Self::new(CapabilityKind::OpenApp, json!({ "url": package }))
    }

    pub fn open_app_with_intent(package: &str, url: &str) -> Self {
        Self::new(
            CapabilityKind::OpenAppWithIntent,
            json!({ "package": package, "url": url }),
        )
    }

    pub fn into_value(self) -> Value {
        json!({
            "archetype": self.archetype,
            "kind": self.kind,
            "data": self.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_wire_format() {
        let err = ToolError::new("get_weather", "no GPS");
        assert_eq!(
            err.to_value(),
            json!({"error": "agent-tool-error", "origin": "get_weather", "message": "no GPS"})
        );
    }

    #[test]
    fn test_capability_wire_format() {
        let value = FrontendCapability::open_app_with_intent("com.whatsapp", "https://x").into_value();
        assert_eq!(value["archetype"], json!("frontend-capability"));
        assert_eq!(value["kind"], json!("open-app-with-intent"));
        assert_eq!(value["data"]["package"], json!("com.whatsapp"));
    }
}
