//! Parameter schemas and argument extraction.
//!
//! Each tool declares its parameters once. The same declaration produces the
//! JSON schema advertised to the LLM and validates the arguments the LLM sends
//! back, so a malformed call turns into a [`ToolError`] instead of reaching
//! the tool body.

use serde_json::{json, Map, Value};

use super::payload::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Boolean,
    Number,
}

impl ParamKind {
    fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Boolean => "boolean",
            ParamKind::Number => "number",
        }
    }
}

/// One named, typed tool argument
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

impl Parameter {
    pub const fn string(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParamKind::String, description, required: true }
    }

    pub const fn boolean(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParamKind::Boolean, description, required: true }
    }

    pub const fn number(name: &'static str, description: &'static str) -> Self {
        Self { name, kind: ParamKind::Number, description, required: true }
    }

    pub const fn optional(self) -> Self {
        Self { required: false, ..self }
    }
}

/// JSON schema object for a parameter list
pub fn json_schema(params: &[Parameter]) -> Value {
    let mut properties = Map::new();
    for p in params {
        properties.insert(
            p.name.to_string(),
            json!({ "type": p.kind.json_type(), "description": p.description }),
        );
    }
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Arguments that passed validation against a tool's parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    /// Validate raw call arguments. `null` counts as absent; extra keys are dropped.
    pub fn extract(
        origin: &str,
        params: &[Parameter],
        raw: &Map<String, Value>,
    ) -> Result<Self, ToolError> {
        let mut values = Map::new();

        for p in params {
            let value = match raw.get(p.name) {
                None | Some(Value::Null) => {
                    if p.required {
                        return Err(ToolError::new(
                            origin,
                            format!("Missing required argument '{}'.", p.name),
                        ));
                    }
                    continue;
                }
                Some(v) => v,
            };

            let coerced = coerce(p.kind, value).ok_or_else(|| {
                ToolError::new(
                    origin,
                    format!("Argument '{}' must be a {}.", p.name, p.kind.json_type()),
                )
            })?;
            values.insert(p.name.to_string(), coerced);
        }

        Ok(Self { values })
    }

    /// String argument, empty when an optional argument was omitted
    pub fn str(&self, name: &str) -> &str {
        self.values.get(name).and_then(Value::as_str).unwrap_or("")
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Local models frequently quote booleans and numbers.
fn coerce(kind: ParamKind, value: &Value) -> Option<Value> {
    match (kind, value) {
        (ParamKind::String, Value::String(_)) => Some(value.clone()),
        (ParamKind::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (ParamKind::Boolean, Value::Bool(_)) => Some(value.clone()),
        (ParamKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (ParamKind::Number, Value::Number(_)) => Some(value.clone()),
        (ParamKind::Number, Value::String(s)) => {
            s.trim()
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
        }
        _ => None,
    }
}
