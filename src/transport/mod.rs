//! Upstream transport boundary
//!
//! The pool treats the network as an opaque operation that either succeeds or
//! fails with one of a closed set of classifications. The client switches on
//! the classification to decide between cooldown, permanent removal, and
//! plain retry; nothing else about the failure matters to the rotation logic.

mod openai;

pub use openai::{OpenAiTransport, DEFAULT_TIMEOUT};

use crate::pool::TargetParams;
use crate::schemas::ChatMessage;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Failure Classification
// ============================================================================

/// Classified upstream failure
///
/// A closed tagged variant set, matched explicitly by the caller:
/// - `TransientCapacity`: the target is over quota right now; back off for
///   `retry_after` when the server supplied one, else the pool default.
/// - `Permanent`: the target can never succeed again (e.g., a rejected key)
///   and must be removed rather than cooled down.
/// - `Transient`: anything else (connect/timeout/body/parse failures);
///   recoverable after the default cooldown.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("rate limited: {message}")]
    TransientCapacity {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("permanent upstream rejection ({status}): {message}")]
    Permanent { status: u16, message: String },

    #[error("transient transport failure: {message}")]
    Transient { message: String },
}

// ============================================================================
// Request & Trait
// ============================================================================

/// One logical chat request, independent of any particular target
///
/// The transport combines this with a selected target's parameters to form
/// the wire request.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Build a request from a user prompt and an optional system context
    pub fn new(prompt: &str, system_prompt: &str, temperature: f32, max_tokens: u32) -> Self {
        let mut messages = Vec::with_capacity(2);
        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }
        messages.push(ChatMessage::user(prompt));
        Self {
            messages,
            temperature,
            max_tokens,
        }
    }
}

/// The upstream call invoked once per attempt
///
/// Implementations classify every failure into a `TransportError` variant;
/// the rotation logic never inspects anything beyond the variant and its
/// optional retry delay.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Invoke the upstream with one target's parameters
    ///
    /// Returns the response text on success.
    async fn invoke(
        &self,
        target: &TargetParams,
        request: &ChatRequest,
    ) -> Result<String, TransportError>;
}
