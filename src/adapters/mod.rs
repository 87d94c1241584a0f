//! Adapters module: caller-facing surfaces.
//!
//! Each adapter implements the [`Channel`] trait for uniform handling.
//!
//! # Supported Channels
//!
//! - **HTTP**: Conversation endpoint for the mobile front end
//! - **CLI**: Interactive prompter for local testing
//!
//! # Adding a New Channel
//!
//! 1. Create a new file (e.g., `websocket.rs`)
//! 2. Implement the [`Channel`] trait
//! 3. Add to [`ChannelRegistry`]

pub mod cli;
pub mod http;

use crate::config::Config;

/// Channel trait for caller-facing adapters.
///
/// All channel implementations must be [`Send`] + [`Sync`] for async compatibility.
pub trait Channel: Send + Sync {
    /// Channel name (e.g., "http", "cli").
    fn name(&self) -> &str;

    /// Start serving.
    fn start(&self) -> impl std::future::Future<Output = crate::Result<()>> + Send;

    /// Stop the channel.
    fn stop(&self) -> impl std::future::Future<Output = crate::Result<()>> + Send;
}

/// Channel registry: metadata about available channels.
pub struct ChannelRegistry;

impl ChannelRegistry {
    /// List all available channel names.
    pub fn available() -> &'static [&'static str] {
        &["http", "cli"]
    }

    /// Check if a channel can run with the given config.
    pub fn is_enabled(name: &str, config: &Config) -> bool {
        match name {
            "http" => !config.secret.is_empty(),
            "cli" => true,
            _ => false,
        }
    }

    /// Get a human-readable description of a channel.
    pub fn description(name: &str) -> &'static str {
        match name {
            "http" => "Conversation endpoint for the mobile app",
            "cli" => "Interactive command line prompter",
            _ => "Unknown channel",
        }
    }
}
