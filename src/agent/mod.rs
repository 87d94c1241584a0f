//! Agent module: core agent logic.
//!
//! This module contains:
//! - Message types and device metadata
//! - LLM client trait and implementations
//! - Agent loop for one prompt/answer round trip
//! - Conversations, sessions and the [`Assistant`] facade
//!
//! # Adding a New LLM Provider
//!
//! See [`llm::ProviderRegistry`] for instructions.

mod assistant;
mod context;
mod conversation;
mod loop_impl;
mod message;
mod metadata;

// LLM providers in submodule
pub mod llm;

// Re-exports for convenience
pub use assistant::Assistant;
pub use context::{system_prompt, Context, ReasoningModel};
pub use conversation::{Conversation, SessionStore, DEFAULT_SESSION};
pub use llm::{GeminiClient, LlmClient, LlmResponse, OllamaClient, ProviderRegistry, RetryingClient, Usage};
pub use loop_impl::AgentLoop;
pub use message::{arguments_map, Message, Role, ToolCall};
pub use metadata::{GpsPosition, Metadata};
