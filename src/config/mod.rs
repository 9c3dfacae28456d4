//! Configuration management module
//!
//! This module handles loading and validating application configuration
//! from files, environment variables, and .env files.

pub mod settings;

pub use settings::{
    ModelProfile, Settings, DEFAULT_COOLDOWN_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_TOKENS,
    DEFAULT_TEMPERATURE,
};
