//! Conversation management tools

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::agent::{Context, Message};

use super::{success, Arguments, Parameter, Tool, ToolError, ToolResult, Toolkit};

/// Erase the session history once the current exchange completes
pub struct ForgetConversationTool;

#[async_trait]
impl Tool for ForgetConversationTool {
    fn name(&self) -> &str { "forget_conversation" }

    fn description(&self) -> &str {
        "Forgets the conversation with the user. \
         NOTE: Only use this tool if the user **explicitely** asks for the conversation to be erased or forgotten."
    }

    async fn execute(&self, _args: Arguments, ctx: &Context) -> ToolResult {
        ctx.request_forget();
        Ok(success(self.name()))
    }
}

/// Hand a hard reasoning task to the configured reasoning model
pub struct DelegateTaskTool;

#[async_trait]
impl Tool for DelegateTaskTool {
    fn name(&self) -> &str { "delegate_task_to_reasoning_model" }

    fn description(&self) -> &str {
        "Delegates a task to a different language model, designed to solve complex reasoning tasks. \
         For example, if the user asks for a logic puzzle to be solved, the reasoning language model \
         will be asked to provide the solution. \
         NOTE: You will have to rephrase the task in such a way that it is clear for \
         the reasoning model what needs to be done!"
    }

    fn parameters(&self) -> &[Parameter] {
        const PARAMS: &[Parameter] = &[Parameter::string(
            "task",
            "The task at hand. E.g. \"If I have 5 apples and Jimmy takes 2, how many apples do I have left?\"",
        )];
        PARAMS
    }

    async fn execute(&self, args: Arguments, ctx: &Context) -> ToolResult {
        let task = args.str("task");
        if task.is_empty() {
            return Err(ToolError::new(self.name(), "No task provided to reasoning model."));
        }

        let reasoning = ctx.reasoning().ok_or_else(|| {
            ToolError::new(self.name(), "No reasoning model is configured.")
        })?;

        let response = reasoning
            .client
            .chat(&reasoning.model, &[Message::user(task)], None)
            .await
            .map_err(|e| {
                warn!(model = %reasoning.model, error = %e, "Reasoning model request failed");
                ToolError::new(self.name(), "Reasoning model request failed.")
            })?;

        match response.content.filter(|c| !c.trim().is_empty()) {
            Some(answer) => Ok(json!(answer)),
            None => Err(ToolError::new(
                self.name(),
                "Reasoning model didn't respond with anything.",
            )),
        }
    }
}

pub fn toolkit() -> Toolkit {
    Toolkit::new("conversation")
        .with(ForgetConversationTool)
        .with(DelegateTaskTool)
}
