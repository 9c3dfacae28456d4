//! Chatpool: a multi-key chat completion client
//!
//! Manages a rotating pool of endpoint + API key targets for one upstream
//! model: round-robin selection, cooldown on rate limits and transient
//! failures, and permanent removal of rejected keys.

// Public modules
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod schemas;
pub mod transport;

// Re-export commonly used types
pub use client::{ChatClient, CALL_FAILED, DEFAULT_SYSTEM_PROMPT};
pub use config::{ModelProfile, Settings};
pub use error::{ConfigError, PoolError};
pub use pool::{PoolStats, TargetParams, TargetPool};
pub use transport::{ChatRequest, ChatTransport, OpenAiTransport, TransportError};
