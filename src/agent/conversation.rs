//! Conversations and the per-session store

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::context::system_prompt;
use super::message::Message;

/// Session used when the caller does not name one
pub const DEFAULT_SESSION: &str = "default";

/// Append-only history that always starts with the system prompt
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    updated_at: DateTime<Utc>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: vec![system_prompt()],
            updated_at: Utc::now(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        self.messages.extend(messages);
        self.updated_at = Utc::now();
    }

    /// Copy of the history for one agent run
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Drop everything after the first `len` messages; the system prompt stays
    pub fn truncate(&mut self, len: usize) {
        self.messages.truncate(len.max(1));
    }

    /// Reset to exactly the system prompt
    pub fn forget(&mut self) {
        self.messages.truncate(1);
        self.updated_at = Utc::now();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Conversations keyed by session id.
///
/// Each conversation sits behind its own lock; a request holds it for the
/// whole exchange so turns of one session never interleave.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_create(&self, session_id: &str) -> Arc<Mutex<Conversation>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone()
    }

    /// Drop sessions untouched for at least `max_age`; returns how many went.
    ///
    /// A session some request still holds is kept whatever its age.
    pub async fn evict_idle(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();

        sessions.retain(|_, conversation| {
            if Arc::strong_count(conversation) > 1 {
                return true;
            }
            match conversation.try_lock() {
                Ok(conversation) => (now - conversation.updated_at())
                    .to_std()
                    .map_or(true, |idle| idle < max_age),
                Err(_) => true,
            }
        });

        before - sessions.len()
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Role;

    #[test]
    fn test_starts_with_system_prompt() {
        let conversation = Conversation::new();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
    }

    #[test]
    fn test_forget_resets_to_system_prompt() {
        let mut conversation = Conversation::new();
        for i in 0..10 {
            conversation.push(Message::user(format!("prompt {i}")));
            conversation.push(Message::assistant("ok"));
        }
        assert_eq!(conversation.len(), 21);

        conversation.forget();
        assert_eq!(conversation.snapshot(), vec![system_prompt()]);

        // forgetting an already fresh conversation is a no-op
        conversation.forget();
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn test_truncate_keeps_system_prompt() {
        let mut conversation = Conversation::new();
        conversation.push(Message::user("hi"));
        conversation.truncate(0);
        assert_eq!(conversation.len(), 1);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = SessionStore::new();

        let a = store.get_or_create("a").await;
        a.lock().await.push(Message::user("only in a"));

        let b = store.get_or_create("b").await;
        assert_eq!(b.lock().await.len(), 1);

        let a_again = store.get_or_create("a").await;
        assert_eq!(a_again.lock().await.len(), 2);
        assert_eq!(store.len().await, 2);

        assert!(store.remove("a").await);
        assert!(!store.remove("a").await);
    }

    #[tokio::test]
    async fn test_evict_idle_drops_only_unused_sessions() {
        let store = SessionStore::new();
        store.get_or_create("idle").await;
        let held = store.get_or_create("held").await;

        // nothing is an hour old yet
        assert_eq!(store.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(store.len().await, 2);

        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        assert_eq!(store.len().await, 1);

        // the held session survives and is the one handed out again
        held.lock().await.push(Message::user("still here"));
        assert_eq!(store.get_or_create("held").await.lock().await.len(), 2);

        drop(held);
        assert_eq!(store.evict_idle(Duration::ZERO).await, 1);
        assert!(store.is_empty().await);
    }
}
