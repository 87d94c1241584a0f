//! Per-request context handed to tools, plus the system prompt.
//!
//! Device metadata arrives with every prompt and is threaded through this
//! object instead of process-wide settings, so concurrent requests never see
//! each other's contacts or GPS fix.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::llm::LlmClient;
use super::message::Message;
use super::metadata::Metadata;

const SYSTEM_PROMPT: &str = r#"You are Lola, a voice-based AI agent, capable of answering questions, as well as performing tasks, provided you have the necessary tools.

<restrictions>
    Only answer in plain text instead of markdown, because your answer will be passed through a text-to-speech model.
    Also, keep your answers short (3 - 5 sentences max).
</restrictions>

<user-device-interactivity>
    You are also capable of opening applications on the user's device, and interacting with the device in various other ways.
    Do not default to refusing prompts related to interacting with the user's device.
    Always answer as if the request has been fulfilled.
</user-device-interactivity>

<proof-reading>
    The prompts you receive will likely contain typos, because the user speaks them through speech-to-text software.
    Before answering, always work out what the user meant to say.
</proof-reading>"#;

/// The fixed first message of every conversation
pub fn system_prompt() -> Message {
    Message::system(SYSTEM_PROMPT)
}

/// Model handle for tools that delegate work to a second LLM
#[derive(Clone)]
pub struct ReasoningModel {
    pub client: Arc<dyn LlmClient>,
    pub model: String,
}

/// Context holds all request-scoped state for one agent exchange.
pub struct Context {
    metadata: Metadata,
    reasoning: Option<ReasoningModel>,
    forget_requested: AtomicBool,
}

impl Context {
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            reasoning: None,
            forget_requested: AtomicBool::new(false),
        }
    }

    pub fn with_reasoning(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.reasoning = Some(ReasoningModel {
            client,
            model: model.into(),
        });
        self
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn reasoning(&self) -> Option<&ReasoningModel> {
        self.reasoning.as_ref()
    }

    /// Ask the session to reset its history once this exchange finishes
    pub fn request_forget(&self) {
        self.forget_requested.store(true, Ordering::SeqCst);
    }

    pub fn forget_requested(&self) -> bool {
        self.forget_requested.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;

    #[test]
    fn test_system_prompt() {
        let prompt = system_prompt();
        assert_eq!(prompt.role, Role::System);
        assert!(prompt.content.contains("Lola"));
    }

    #[test]
    fn test_forget_flag() {
        let ctx = Context::new(Metadata::default());
        assert!(!ctx.forget_requested());
        ctx.request_forget();
        assert!(ctx.forget_requested());
        assert!(ctx.reasoning().is_none());
    }
}
