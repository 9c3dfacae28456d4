//! Logging initialization
//!
//! Console tracing with an env-filter: `RUST_LOG` wins when set, otherwise
//! the configured log level applies. JSON output is opt-in for machine
//! consumption.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the tracing subscriber
///
/// # Arguments
/// * `log_level` - Fallback filter directive when RUST_LOG is not set
/// * `json` - Emit JSON lines instead of human-readable output
pub fn init_tracing(log_level: &str, json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    if json {
        let layer = fmt::layer().json().with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    } else {
        let layer = fmt::layer().with_filter(filter);
        tracing_subscriber::registry().with(layer).init();
    }
}
