//! Lola CLI entry point

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lola::adapters::{cli::CliChannel, http::HttpChannel, Channel, ChannelRegistry};
use lola::agent::{Assistant, ProviderRegistry};
use lola::config::{self, Config};
use lola::ui;

#[derive(Parser)]
#[command(name = "lola")]
#[command(about = "🎙️ Lola - voice assistant backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Serve the conversation endpoint
    Serve {
        /// Listen host
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat with the assistant from the terminal
    Chat {
        /// Session ID
        #[arg(short, long, default_value = "cli")]
        session: String,
    },

    /// Show Lola status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            let path = config::config_path();
            if path.exists() && !force {
                ui::print_warning(&format!("{} already exists (use --force to overwrite)", path.display()));
                return Ok(());
            }
            config::save(&Config::default())?;
            ui::print_success(&format!("Wrote {}", path.display()));
            println!("\nNext steps:");
            println!("  1. Set \"secret\" in the config (or LOLA_SECRET)");
            println!("  2. Pull the models: ollama pull qwen2.5 && ollama pull deepseek-r1");
            println!("  3. Serve: lola serve");
        }

        Commands::Serve { host, port } => {
            let mut config = config::load()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            if config.secret.is_empty() {
                ui::print_warning("No secret configured, every conversation request will be rejected");
            }

            ui::print_lola_header(&config.llm, &config.provider);
            let assistant = Arc::new(Assistant::from_config(&config)?);
            let channel = HttpChannel::new(&config, assistant);
            ui::print_step(&format!(
                "Listening on http://{}:{}",
                config.server.host, config.server.port
            ));
            channel.start().await?;
        }

        Commands::Chat { session } => {
            let config = config::load()?;
            config.validate()?;

            ui::print_lola_header(&config.llm, &config.provider);
            println!("Interactive mode (type 'exit' to quit)");
            let assistant = Arc::new(Assistant::from_config(&config)?);
            CliChannel::new(assistant, session).start().await?;
        }

        Commands::Status => {
            let config = config::load()?;
            println!("🎙️ Lola Status\n");
            ui::print_field("Config", &config::config_path().display().to_string());
            ui::print_field("Provider", &config.provider);
            ui::print_field("Model", &config.llm);
            ui::print_field("Reasoning model", &config.reasoning_llm);

            match config.provider.as_str() {
                "ollama" => ui::print_field("Ollama host", &config.ollama_host),
                "gemini" => ui::print_field(
                    "Gemini API",
                    if config.gemini_api_key.is_empty() { "not set" } else { "✓" },
                ),
                other => ui::print_field("Provider", &format!("unknown ({other})")),
            }
            ui::print_field("Secret", if config.secret.is_empty() { "not set" } else { "✓" });

            println!("\nProviders: {}", ProviderRegistry::available().join(", "));
            for name in ChannelRegistry::available() {
                let state = if ChannelRegistry::is_enabled(name, &config) { "✓" } else { "✗" };
                println!("  {} {:<6} {}", state, name, ChannelRegistry::description(name));
            }

            if let Err(e) = config.validate() {
                ui::print_error(&e.to_string());
            }
        }
    }

    Ok(())
}
