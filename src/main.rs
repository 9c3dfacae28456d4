//! Chatpool CLI
//!
//! Sends one prompt through a rotating multi-key chat client and prints the
//! response text.

use anyhow::{Context, Result};
use chatpool::{
    config::Settings,
    error::ConfigError,
    logging::init_tracing,
    transport::OpenAiTransport,
    ChatClient,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Chatpool
///
/// A chat completion client with API key rotation, cooldown, and failover.
#[derive(Parser, Debug)]
#[command(name = "chatpool")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The prompt to send
    prompt: String,

    /// Configuration file with model profiles (YAML or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model profile to use (overrides default_model from the config)
    #[arg(short, long)]
    model: Option<String>,

    /// System prompt sent before the user prompt
    #[arg(short, long)]
    system: Option<String>,

    /// Maximum upstream attempts for this call (overrides the profile)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,

    /// Log level: trace, debug, info, warn, error (overrides LOG_LEVEL from the config)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit JSON logs instead of human-readable output
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration first (before logging, so we can use log_level)
    let settings = Settings::load(args.config.as_deref())?;

    let log_level = args
        .log_level
        .unwrap_or_else(|| settings.log_level.clone());
    init_tracing(&log_level, args.json_logs);

    let profile_name = args
        .model
        .or_else(|| settings.default_model.clone())
        .ok_or(ConfigError::NoProfileSelected)?;
    let mut profile = settings.profile(&profile_name)?.clone();
    if let Some(max_attempts) = args.max_attempts {
        profile.max_attempts = max_attempts;
    }

    tracing::info!(
        profile = %profile_name,
        keys = profile.api_keys.len(),
        "Starting chatpool"
    );

    let transport = OpenAiTransport::new(Duration::from_secs(args.timeout))
        .context("Failed to build HTTP client")?;
    let client = ChatClient::from_profile(&profile_name, &profile, Arc::new(transport))
        .with_context(|| format!("Cannot serve any call for profile '{profile_name}'"))?;

    let response = match args.system.as_deref() {
        Some(system) => client.call_with_system(&args.prompt, system).await,
        None => client.call(&args.prompt).await,
    };

    println!("{response}");

    Ok(())
}
