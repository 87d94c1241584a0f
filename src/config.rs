//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::Result;
use crate::error::Error;

/// Providers understood by [`crate::agent::ProviderRegistry`].
pub const PROVIDERS: &[&str] = &["ollama", "gemini"];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use ("ollama" or "gemini")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the Ollama server
    #[serde(default = "default_ollama_host")]
    pub ollama_host: String,

    /// Gemini API key (used when provider is "gemini")
    #[serde(default)]
    pub gemini_api_key: String,

    /// Model answering conversation turns
    #[serde(default = "default_llm")]
    pub llm: String,

    /// Model used by the reasoning delegation tool
    #[serde(default = "default_reasoning_llm")]
    pub reasoning_llm: String,

    /// Shared secret expected in the `x-secret` header
    #[serde(default)]
    pub secret: String,

    /// Base URL of the Open-Meteo forecast API
    #[serde(default = "default_weather_api_url")]
    pub weather_api_url: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Seconds a session may sit unused before it is dropped (0 keeps sessions forever)
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

/// Backoff settings for gateway calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry; doubles on every further attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_ollama_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm() -> String {
    "qwen2.5".to_string()
}

fn default_reasoning_llm() -> String {
    "deepseek-r1".to_string()
}

fn default_weather_api_url() -> String {
    "https://api.open-meteo.com".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_session_idle_secs() -> u64 {
    3600
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            ollama_host: default_ollama_host(),
            gemini_api_key: String::new(),
            llm: default_llm(),
            reasoning_llm: default_reasoning_llm(),
            secret: String::new(),
            weather_api_url: default_weather_api_url(),
            server: ServerConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Override fields from environment-style variables.
    ///
    /// Takes a lookup function so tests don't have to touch the process env.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LOLA_PROVIDER") {
            self.provider = v;
        }
        if let Some(v) = lookup("LOLA_LLM") {
            self.llm = v;
        }
        if let Some(v) = lookup("LOLA_REASONING_LLM") {
            self.reasoning_llm = v;
        }
        if let Some(v) = lookup("LOLA_SECRET") {
            self.secret = v;
        }
        if let Some(v) = lookup("OLLAMA_HOST") {
            self.ollama_host = v;
        }
        if let Some(v) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = v;
        }
    }

    /// Check that the configuration can drive a conversation.
    pub fn validate(&self) -> Result<()> {
        if !PROVIDERS.contains(&self.provider.as_str()) {
            return Err(Error::Config(format!(
                "Unknown provider '{}' (expected one of: {})",
                self.provider,
                PROVIDERS.join(", ")
            )));
        }
        if self.llm.trim().is_empty() {
            return Err(Error::Config("No model configured for 'llm'".to_string()));
        }
        if self.reasoning_llm.trim().is_empty() {
            return Err(Error::Config("No model configured for 'reasoning_llm'".to_string()));
        }
        if self.provider == "gemini" && self.gemini_api_key.is_empty() {
            return Err(Error::Config("Provider 'gemini' needs 'gemini_api_key'".to_string()));
        }
        Ok(())
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lola")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default path, then apply env overrides
pub fn load() -> Result<Config> {
    let mut config = load_from(&config_path())?;
    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

/// Load configuration from a file; a missing file yields the defaults
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("No config at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}

/// Save configuration to the default path
pub fn save(config: &Config) -> Result<()> {
    save_to(config, &config_path())
}

/// Save configuration to a file
pub fn save_to(config: &Config, path: &Path) -> Result<()> {
    // Create parent directory
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.retry.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"llm": "llama3.1", "server": {"port": 9000}}"#).unwrap();
        assert_eq!(config.llm, "llama3.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.session_idle_secs, 3600);
        assert_eq!(config.reasoning_llm, "deepseek-r1");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("LOLA_SECRET", "s3cret"), ("LOLA_LLM", "mistral")]
            .into_iter()
            .collect();

        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.secret, "s3cret");
        assert_eq!(config.llm, "mistral");
        assert_eq!(config.ollama_host, "http://localhost:11434");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.provider = "openai".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.llm = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reasoning_llm = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.provider = "gemini".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.secret = "abc".to_string();
        save_to(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.secret, "abc");
    }

    #[test]
    fn test_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_from(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(loaded.llm, Config::default().llm);
    }
}
