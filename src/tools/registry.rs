//! Tool registry - merges toolkits and dispatches tool calls

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::agent::{Context, ToolCall};
use crate::error::Error;
use crate::Result;

use super::schema::Arguments;
use super::toolkit::Toolkit;
use super::Tool;

/// Tool declaration offered to the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object
    pub parameters: Value,
}

/// What to do when two toolkits declare the same tool name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later registration replaces the earlier one in place
    #[default]
    Overwrite,
    /// Registration fails with [`Error::Registry`]
    Reject,
}

/// Name-keyed table of tools.
///
/// Specs are listed in first-registration order; an overwritten tool keeps
/// its original slot so the order stays deterministic.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold toolkits left to right; later toolkits win on name collisions
    pub fn from_toolkits(toolkits: &[Toolkit]) -> Self {
        let mut registry = Self::new();
        for toolkit in toolkits {
            for tool in toolkit.tools() {
                registry.insert(tool.clone());
            }
        }
        registry
    }

    /// Fold toolkits left to right under an explicit collision policy
    pub fn from_toolkits_with(toolkits: &[Toolkit], policy: CollisionPolicy) -> Result<Self> {
        let mut registry = Self::new();
        for toolkit in toolkits {
            for tool in toolkit.tools() {
                registry.register(tool.clone(), policy).map_err(|e| {
                    Error::Registry(format!("{e} (toolkit '{}')", toolkit.name()))
                })?;
            }
        }
        Ok(registry)
    }

    /// Register a tool
    pub fn register(&mut self, tool: Arc<dyn Tool>, policy: CollisionPolicy) -> Result<()> {
        if policy == CollisionPolicy::Reject && self.has(tool.name()) {
            return Err(Error::Registry(format!("Duplicate tool name: {}", tool.name())));
        }
        self.insert(tool);
        Ok(())
    }

    fn insert(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                warn!(tool = %name, "Tool registered twice, keeping the later one");
                self.tools[slot] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get tool specs for LLM
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.to_spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    /// Check if a tool exists
    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// List registered tool names
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate arguments and run the named tool.
    ///
    /// Returns `None` for unknown tools. Argument and domain failures come
    /// back as the serialized [`super::ToolError`] payload.
    pub async fn dispatch(&self, call: &ToolCall, ctx: &Context) -> Option<Value> {
        let tool = self.get(&call.name)?;
        let args = Value::Object(call.arguments.clone());
        debug!(tool = %call.name, args = %args, "Executing tool");

        let outcome = match Arguments::extract(tool.name(), tool.parameters(), &call.arguments) {
            Ok(args) => tool.execute(args, ctx).await,
            Err(e) => Err(e),
        };

        Some(match outcome {
            Ok(payload) => {
                debug!(tool = %call.name, "Tool succeeded");
                payload
            }
            Err(e) => {
                debug!(tool = %call.name, error = %e.message, "Tool reported an error");
                e.to_value()
            }
        })
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .finish()
    }
}
