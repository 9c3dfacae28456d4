//! Error types for the library

mod types;

pub use types::{ConfigError, PoolError};
