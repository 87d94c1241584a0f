//! Assistant - sessions plus the agent loop behind one call

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::tools::{builtin_toolkits, todo::TodoList, Toolkit};
use crate::Result;

use super::context::Context;
use super::conversation::{Conversation, SessionStore};
use super::llm::{LlmClient, ProviderRegistry};
use super::loop_impl::AgentLoop;
use super::message::Message;
use super::metadata::Metadata;

pub struct Assistant {
    agent: AgentLoop,
    llm: String,
    reasoning_llm: String,
    sessions: SessionStore,
    session_idle: Option<Duration>,
}

/// Prompt already appended to a conversation whose exchange has not finished.
///
/// Dropping it uncommitted, on an error return or while a panic unwinds,
/// truncates the conversation back to where it was.
struct PendingExchange<'a> {
    conversation: &'a mut Conversation,
    restore_len: usize,
    committed: bool,
}

impl<'a> PendingExchange<'a> {
    fn begin(conversation: &'a mut Conversation, user: Message) -> Self {
        let restore_len = conversation.len();
        conversation.push(user);
        Self {
            conversation,
            restore_len,
            committed: false,
        }
    }

    fn commit(mut self, produced: &[Message], forget: bool) {
        if forget {
            self.conversation.forget();
        } else {
            self.conversation.extend(produced.iter().cloned());
        }
        self.committed = true;
    }
}

impl Drop for PendingExchange<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.conversation.truncate(self.restore_len);
        }
    }
}

impl Assistant {
    pub fn new(
        client: Arc<dyn LlmClient>,
        toolkits: &[Toolkit],
        llm: impl Into<String>,
        reasoning_llm: impl Into<String>,
    ) -> Self {
        Self {
            agent: AgentLoop::from_toolkits(client, toolkits),
            llm: llm.into(),
            reasoning_llm: reasoning_llm.into(),
            sessions: SessionStore::new(),
            session_idle: None,
        }
    }

    /// Drop sessions left unused for `max_age` whenever a new exchange starts
    pub fn with_session_idle_timeout(mut self, max_age: Duration) -> Self {
        self.session_idle = Some(max_age);
        self
    }

    /// Build the provider and the built-in toolkits from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ProviderRegistry::create(config)?;
        let toolkits = builtin_toolkits(config, TodoList::new());
        let assistant = Self::new(client, &toolkits, &config.llm, &config.reasoning_llm);
        Ok(match config.server.session_idle_secs {
            0 => assistant,
            secs => assistant.with_session_idle_timeout(Duration::from_secs(secs)),
        })
    }

    pub fn agent(&self) -> &AgentLoop {
        &self.agent
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn model(&self) -> &str {
        &self.llm
    }

    /// One exchange: append the prompt, run the loop, record the turns.
    ///
    /// Returns the user message followed by everything the loop produced.
    /// If the exchange does not complete the session is left as it was
    /// before the call.
    pub async fn converse(&self, session_id: &str, prompt: &str, metadata: Metadata) -> Result<Vec<Message>> {
        if let Some(max_age) = self.session_idle {
            let evicted = self.sessions.evict_idle(max_age).await;
            if evicted > 0 {
                debug!(evicted, "Evicted idle sessions");
            }
        }

        let session = self.sessions.get_or_create(session_id).await;
        let mut conversation = session.lock().await;

        let user = Message::user(prompt);
        let exchange = PendingExchange::begin(&mut conversation, user.clone());
        let history = exchange.conversation.snapshot();

        let ctx = Context::new(metadata)
            .with_reasoning(self.agent.client().clone(), self.reasoning_llm.clone());

        let produced = match self.agent.run(&self.llm, &history, &ctx).await {
            Ok(produced) => produced,
            Err(e) => {
                warn!(session = session_id, error = %e, "Agent run failed, rolling back prompt");
                return Err(e);
            }
        };

        let forget = ctx.forget_requested();
        if forget {
            info!(session = session_id, "Conversation forgotten");
        }
        exchange.commit(&produced, forget);

        let mut turns = Vec::with_capacity(produced.len() + 1);
        turns.push(user);
        turns.extend(produced);
        Ok(turns)
    }
}
