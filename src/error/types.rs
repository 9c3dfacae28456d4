//! Library error types

use thiserror::Error;

/// Errors raised while building a target pool
///
/// Per-target problems (blank keys, incomplete profiles) are logged and
/// skipped during construction; only ending up with zero usable targets is
/// escalated, since a pool with nothing to rotate over can never serve a
/// call.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("no usable targets survived pool construction")]
    NoUsableTargets,
}

/// Errors raised while loading or resolving configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("unknown model profile: {0}")]
    UnknownProfile(String),

    #[error("no model profile selected (pass --model or set default_model)")]
    NoProfileSelected,
}
