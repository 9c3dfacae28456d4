//! Application settings and configuration
//!
//! Settings are layered: an optional configuration file (YAML or TOML),
//! then environment variables with the `CHATPOOL_` prefix, with `.env`
//! honored for local development. Model profiles live under `llm.<name>`
//! and supply each pool's target list and per-target parameters.

use crate::error::ConfigError;
use crate::pool::DEFAULT_COOLDOWN;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default response token budget
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Default cooldown after a transient failure, in seconds
pub const DEFAULT_COOLDOWN_SECS: u64 = DEFAULT_COOLDOWN.as_secs();

/// Default attempt budget per logical call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

// ============================================================================
// Model Profile
// ============================================================================

/// Configuration record for one model profile
///
/// `base_url`, `model`, and a non-empty `api_keys` list are required for the
/// profile to produce any targets; a profile missing them constructs zero
/// targets (logged and rejected at client construction). The remaining
/// fields have working defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelProfile {
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: Option<String>,

    /// Upstream model identifier
    pub model: Option<String>,

    /// API keys; one rotation target is built per key
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Seconds a target stays out of rotation after a transient failure
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Upper bound on upstream attempts per call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_cooldown_secs() -> u64 {
    DEFAULT_COOLDOWN_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

// ============================================================================
// Settings
// ============================================================================

/// Main application settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Profile used when the caller does not name one
    #[serde(default)]
    pub default_model: Option<String>,

    /// Model profiles, keyed by profile name
    #[serde(default)]
    pub llm: HashMap<String, ModelProfile>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    /// Load settings from an optional file plus environment overrides
    ///
    /// Environment variables use the `CHATPOOL_` prefix with `__` as the
    /// nesting separator, e.g. `CHATPOOL_LOG_LEVEL=debug`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignored in production typically)
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(Environment::with_prefix("CHATPOOL").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Look up a model profile by name
    pub fn profile(&self, name: &str) -> Result<&ModelProfile, ConfigError> {
        self.llm
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_string()))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_model: None,
            llm: HashMap::new(),
        }
    }
}
