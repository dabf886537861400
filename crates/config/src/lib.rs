//! Configuration loading, validation, and management for hearth.
//!
//! Loads configuration from `~/.hearth/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.hearth/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default content-generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Providers tried, in order, when the default provider fails
    #[serde(default)]
    pub fallback: Vec<String>,

    /// Reasoning loop budgets
    #[serde(default)]
    pub agent: AgentConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.4
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("fallback", &self.fallback)
            .field("agent", &self.agent)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

/// Step and wall-clock budgets for one agent run.
///
/// All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Hard ceiling on reasoning steps (generation calls) per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Whole-run budget; exceeding it hands the work to a follow-up run
    #[serde(default = "default_loop_timeout_ms")]
    pub loop_timeout_ms: u64,

    /// Longest wait for the first chunk of a stream, and between chunks
    #[serde(default = "default_stream_timeout_ms")]
    pub stream_timeout_ms: u64,

    /// Budget for one critic call
    #[serde(default = "default_critic_timeout_ms")]
    pub critic_timeout_ms: u64,

    /// Budget for one tool invocation
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,

    /// Structured tool outcomes are cut to this many characters
    #[serde(default = "default_observation_max_chars")]
    pub observation_max_chars: usize,

    /// Minimum gap between two "thinking" progress updates
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

fn default_max_steps() -> u32 {
    10
}
fn default_loop_timeout_ms() -> u64 {
    28_000
}
fn default_stream_timeout_ms() -> u64 {
    20_000
}
fn default_critic_timeout_ms() -> u64 {
    10_000
}
fn default_tool_timeout_ms() -> u64 {
    15_000
}
fn default_observation_max_chars() -> usize {
    2_000
}
fn default_progress_interval_ms() -> u64 {
    200
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            loop_timeout_ms: default_loop_timeout_ms(),
            stream_timeout_ms: default_stream_timeout_ms(),
            critic_timeout_ms: default_critic_timeout_ms(),
            tool_timeout_ms: default_tool_timeout_ms(),
            observation_max_chars: default_observation_max_chars(),
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.hearth/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `HEARTH_API_KEY`, then `OPENAI_API_KEY`, then `OPENROUTER_API_KEY`
    /// - `HEARTH_PROVIDER`, `HEARTH_MODEL`
    /// - `HEARTH_MAX_STEPS`, `HEARTH_LOOP_TIMEOUT_MS`, `HEARTH_STREAM_TIMEOUT_MS`,
    ///   `HEARTH_CRITIC_TIMEOUT_MS`, `HEARTH_TOOL_TIMEOUT_MS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("HEARTH_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .or_else(|| lookup("OPENROUTER_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(provider) = lookup("HEARTH_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("HEARTH_MODEL") {
            self.default_model = model;
        }

        if let Some(v) = parse_override(&lookup, "HEARTH_MAX_STEPS")? {
            self.agent.max_steps = v;
        }
        if let Some(v) = parse_override(&lookup, "HEARTH_LOOP_TIMEOUT_MS")? {
            self.agent.loop_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "HEARTH_STREAM_TIMEOUT_MS")? {
            self.agent.stream_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "HEARTH_CRITIC_TIMEOUT_MS")? {
            self.agent.critic_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "HEARTH_TOOL_TIMEOUT_MS")? {
            self.agent.tool_timeout_ms = v;
        }

        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hearth")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        let agent = &self.agent;
        if agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("loop_timeout_ms", agent.loop_timeout_ms),
            ("stream_timeout_ms", agent.stream_timeout_ms),
            ("critic_timeout_ms", agent.critic_timeout_ms),
            ("tool_timeout_ms", agent.tool_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "agent.{name} must be greater than 0"
                )));
            }
        }
        if agent.observation_max_chars == 0 {
            return Err(ConfigError::ValidationError(
                "agent.observation_max_chars must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::ValidationError(format!("{key} must be a non-negative integer, got '{raw}'"))
        }),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            fallback: vec![],
            agent: AgentConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
