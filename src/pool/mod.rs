//! Rotating Client Pool
//!
//! This module provides the rotating pool of endpoint + API key targets that
//! backs the chat client: round-robin selection under a single lock, cooldown
//! bookkeeping for transient failures, and permanent removal for targets that
//! can never succeed again.
//!
//! # Example
//! ```ignore
//! use chatpool::pool::{TargetParams, TargetPool};
//! use std::time::Duration;
//!
//! let targets = vec![
//!     TargetParams::new("primary", "https://api.example.com/v1", "key1", "model-x"),
//!     TargetParams::new("backup", "https://api.example.com/v1", "key2", "model-x"),
//! ];
//!
//! let pool = TargetPool::new(targets, Duration::from_secs(300))?;
//! if let Some(target) = pool.select_next() {
//!     println!("Using target: {}", target.name);
//! }
//! ```

mod pool;
mod target;

pub use pool::{PoolStats, TargetPool};
pub use target::{TargetParams, DEFAULT_COOLDOWN};
