//! CLI adapter: interactive prompter for trying the assistant locally.
//!
//! Every prompt is sent with the same device metadata, so tools that need
//! contacts, apps or a GPS fix behave as they would on a phone.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::agent::{Assistant, Message, Metadata, Role};
use crate::ui;
use crate::Result;

use super::Channel;

/// Device metadata used when no phone is attached
pub fn sample_metadata() -> Metadata {
    Metadata::default()
        .with_contact("John Doe", "+99012345678")
        .with_app("com.whatsapp")
        .with_app("com.google.android.youtube")
        .with_app("com.spotify.music")
        .with_gps(52.37, 4.90)
}

/// Names of the tools that answered during one exchange, in call order
pub fn tools_used(turns: &[Message]) -> Vec<&str> {
    turns
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_calls.first().map(|c| c.name.as_str()))
        .collect()
}

/// The spoken answer of an exchange: the last assistant message
pub fn answer(turns: &[Message]) -> &str {
    turns
        .iter()
        .rev()
        .find(|m| m.role == Role::Assistant)
        .map_or("", |m| m.content.as_str())
}

/// CLI channel for interactive sessions.
pub struct CliChannel {
    assistant: Arc<Assistant>,
    session: String,
    metadata: Metadata,
    stopped: AtomicBool,
}

impl CliChannel {
    /// Create a new CLI channel.
    pub fn new(assistant: Arc<Assistant>, session: impl Into<String>) -> Self {
        Self {
            assistant,
            session: session.into(),
            metadata: sample_metadata(),
            stopped: AtomicBool::new(false),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Run a single prompt and return the turns it produced.
    pub async fn run_once(&self, prompt: &str) -> Result<Vec<Message>> {
        self.assistant
            .converse(&self.session, prompt, self.metadata.clone())
            .await
    }

    /// Run interactive REPL loop.
    pub async fn run_interactive(&self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        while !self.stopped.load(Ordering::SeqCst) {
            print!("\n> ");
            stdout.flush()?;

            let mut line = String::new();
            if stdin.lock().read_line(&mut line)? == 0 {
                // EOF
                break;
            }

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
                println!("Goodbye! 👋");
                break;
            }

            ui::print_thinking("Thinking");
            match self.run_once(input).await {
                Ok(turns) => {
                    let tools = tools_used(&turns);
                    if !tools.is_empty() {
                        ui::print_step(&format!("Tools: {}", tools.join(", ")));
                    }
                    println!("\n{}", answer(&turns));
                }
                Err(e) => ui::print_error(&e.to_string()),
            }
        }

        Ok(())
    }
}

impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<()> {
        self.run_interactive().await
    }

    async fn stop(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}
