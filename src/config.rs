//! Runtime configuration
//!
//! Built once at startup from defaults, an optional TOML file, environment
//! variables and CLI flags (in increasing precedence), then passed by
//! reference to every component that talks to the network.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:8741";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Environment variable holding the Anthropic credential
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
pub const DAEMON_URL_ENV: &str = "CLAUDE_DAEMON_URL";
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";

/// Pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory daemon base URL
    pub daemon_url: String,
    /// Local Ollama base URL
    pub ollama_url: String,
    /// Anthropic messages endpoint
    pub anthropic_url: String,
    pub anthropic_model: String,
    /// Output token cap for both providers
    pub max_tokens: u32,
    /// Transcripts longer than this (in characters) are truncated
    pub max_transcript_chars: usize,
    /// Enforce the learning taxonomy and confidence range before submission
    pub strict_validation: bool,
    pub timeouts: Timeouts,
    /// Never read from or written to the config file
    #[serde(skip)]
    pub anthropic_api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_url: DEFAULT_DAEMON_URL.to_string(),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            anthropic_url: DEFAULT_ANTHROPIC_URL.to_string(),
            anthropic_model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            max_tokens: 4096,
            max_transcript_chars: 100_000,
            strict_validation: false,
            timeouts: Timeouts::default(),
            anthropic_api_key: None,
        }
    }
}

/// Per call-class timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub health_secs: u64,
    pub store_secs: u64,
    pub stats_secs: u64,
    pub ollama_tags_secs: u64,
    pub anthropic_secs: u64,
    /// Local models are much slower than the remote API
    pub ollama_generate_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health_secs: 2,
            store_secs: 10,
            stats_secs: 10,
            ollama_tags_secs: 5,
            anthropic_secs: 120,
            ollama_generate_secs: 300,
        }
    }
}

impl Timeouts {
    pub fn health(&self) -> Duration {
        Duration::from_secs(self.health_secs)
    }

    pub fn store(&self) -> Duration {
        Duration::from_secs(self.store_secs)
    }

    pub fn stats(&self) -> Duration {
        Duration::from_secs(self.stats_secs)
    }

    pub fn ollama_tags(&self) -> Duration {
        Duration::from_secs(self.ollama_tags_secs)
    }

    pub fn anthropic(&self) -> Duration {
        Duration::from_secs(self.anthropic_secs)
    }

    pub fn ollama_generate(&self) -> Duration {
        Duration::from_secs(self.ollama_generate_secs)
    }
}

/// Overrides taken from the command line
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub daemon_url: Option<String>,
    pub strict: bool,
}

impl Config {
    /// Assemble the configuration for this process
    pub fn load(overrides: CliOverrides) -> Result<Self> {
        let path = overrides.config_path.clone().or_else(find_config_file);
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        if let Some(url) = overrides.daemon_url {
            config.daemon_url = url;
        }
        if overrides.strict {
            config.strict_validation = true;
        }

        config.daemon_url = trim_url(&config.daemon_url);
        config.ollama_url = trim_url(&config.ollama_url);

        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var(DAEMON_URL_ENV).filter(|v| !v.is_empty()) {
            self.daemon_url = url;
        }
        if let Some(url) = var(OLLAMA_URL_ENV).filter(|v| !v.is_empty()) {
            self.ollama_url = url;
        }
        self.anthropic_api_key = var(API_KEY_ENV).filter(|v| !v.trim().is_empty());
    }
}

fn find_config_file() -> Option<PathBuf> {
    // Project-local config wins over the user config
    if let Ok(cwd) = std::env::current_dir() {
        let local = cwd.join(".distill").join("config.toml");
        if local.exists() {
            return Some(local);
        }
    }

    let user = dirs::config_dir()?.join("distill").join("config.toml");
    user.exists().then_some(user)
}

fn trim_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
