//! User configuration for the `boil` command
//!
//! Values come from `~/.boil/config.toml` (or `--config`), then environment
//! variables, then command-line flags, each layer overriding the previous.

use anyhow::{Context, Result};
use boil_core::engine::DEFAULT_QUEUE_CAPACITY;
use boil_core::llm::is_claude_model;
use boil_core::request::DEFAULT_MODEL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoilConfig {
    /// Model used when `--model` is not given
    pub model: String,

    /// API key for the configured provider
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub openai_base_url: Option<String>,

    /// Per-call HTTP timeout
    pub request_timeout_secs: Option<u64>,

    /// Number of concurrent pipeline workers
    pub workers: usize,

    pub queue_capacity: usize,

    /// How long to wait for busy workers on exit
    pub shutdown_timeout_secs: u64,

    /// Directory projects are written into
    pub output_dir: PathBuf,

    /// Write `.zip` archives instead of directories
    pub archive: bool,

    /// Optional components enabled without passing their flags
    pub defaults: ComponentDefaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentDefaults {
    pub git_repo: bool,
    pub git_ignore: bool,
    pub readme: bool,
    pub dockerfile: bool,
}

impl Default for BoilConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            openai_base_url: None,
            request_timeout_secs: None,
            workers: 4,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            shutdown_timeout_secs: 30,
            output_dir: PathBuf::from("."),
            archive: false,
            defaults: ComponentDefaults::default(),
        }
    }
}

impl BoilConfig {
    /// `~/.boil/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".boil").join("config.toml"))
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Load the explicit file, or the default file when it exists, then apply
    /// environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => {
                    debug!("Using config file {}", path.display());
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `BOIL_MODEL` and `BOIL_API_KEY`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("BOIL_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(key) = lookup("BOIL_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    /// API key for `model`: the configured key, else the provider's usual
    /// environment variable
    pub fn api_key_for(&self, model: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if let Some(key) = &self.api_key {
            return Some(key.clone());
        }

        let variable = if is_claude_model(model) { "ANTHROPIC_API_KEY" } else { "OPENAI_API_KEY" };
        lookup(variable).filter(|v| !v.trim().is_empty())
    }

    /// Configuration as TOML with the API key masked
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.api_key.is_some() {
            shown.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&shown).context("Failed to serialize config")
    }
}
