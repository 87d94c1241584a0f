//! Toolkit - a named bundle of tools, the unit of composition.

use std::sync::Arc;

use super::Tool;

#[derive(Clone)]
pub struct Toolkit {
    name: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl Toolkit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    /// Add a tool (builder style)
    pub fn with<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit")
            .field("name", &self.name)
            .field("tools", &self.tool_names())
            .finish()
    }
}
