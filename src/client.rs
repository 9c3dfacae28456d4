//! Rotating chat client
//!
//! `ChatClient` binds one model profile's target pool to a transport and
//! drives the bounded attempt loop: select the next healthy target, invoke
//! the upstream outside the pool lock, and apply the failure classification
//! (cooldown, permanent removal, or plain retry) before trying again.

use crate::config::ModelProfile;
use crate::error::PoolError;
use crate::pool::{PoolStats, TargetParams, TargetPool};
use crate::transport::{ChatRequest, ChatTransport, TransportError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Sentinel returned when every attempt failed
///
/// `call` reports total failure by value rather than by error; callers
/// compare against this constant.
pub const CALL_FAILED: &str = "Error: Could not generate content after multiple attempts.";

/// System prompt used when the caller does not supply one
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

// ============================================================================
// Chat Client
// ============================================================================

/// A chat completion client with key rotation, cooldown, and failover
///
/// Cheap to clone; clones share the same pool and transport, so any number
/// of concurrent tasks can call through one client.
pub struct ChatClient {
    pool: Arc<TargetPool>,
    transport: Arc<dyn ChatTransport>,
    temperature: f32,
    max_tokens: u32,
    max_attempts: u32,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The transport is a trait object and has no useful Debug output
        f.debug_struct("ChatClient")
            .field("pool", &self.pool)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl Clone for ChatClient {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
            transport: Arc::clone(&self.transport),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            max_attempts: self.max_attempts,
        }
    }
}

impl ChatClient {
    /// Build a client from a model profile
    ///
    /// One target is built per API key, named `{profile}-{index}@{base_url}`.
    /// A profile missing `base_url`, `model`, or keys yields zero targets;
    /// blank keys are logged and skipped. Zero surviving targets is fatal:
    /// there is no way to serve any call.
    pub fn from_profile(
        profile_name: &str,
        profile: &ModelProfile,
        transport: Arc<dyn ChatTransport>,
    ) -> Result<Self, PoolError> {
        let targets = build_targets(profile_name, profile);
        let pool = TargetPool::new(targets, Duration::from_secs(profile.cooldown_secs))?;

        tracing::info!(
            profile = %profile_name,
            targets = pool.len(),
            cooldown_secs = profile.cooldown_secs,
            max_attempts = profile.max_attempts,
            "Initialized chat client with target pool"
        );

        Ok(Self {
            pool: Arc::new(pool),
            transport,
            temperature: profile.temperature,
            max_tokens: profile.max_tokens,
            max_attempts: profile.max_attempts,
        })
    }

    /// Make a chat call with the default system prompt
    pub async fn call(&self, prompt: &str) -> String {
        self.call_with_system(prompt, DEFAULT_SYSTEM_PROMPT).await
    }

    /// Make a chat call, rotating through targets until one succeeds
    ///
    /// Runs at most `max_attempts` upstream invocations, fewer if selection
    /// comes up empty or the pool loses its last target. Never returns an
    /// error: total failure is reported as the [`CALL_FAILED`] sentinel.
    pub async fn call_with_system(&self, prompt: &str, system_prompt: &str) -> String {
        let request = ChatRequest::new(prompt, system_prompt, self.temperature, self.max_tokens);

        for attempt in 1..=self.max_attempts {
            let Some(target) = self.pool.select_next() else {
                tracing::warn!(
                    attempt,
                    "All targets are currently unavailable, giving up early"
                );
                break;
            };

            tracing::debug!(
                target = %target.name,
                attempt,
                max_attempts = self.max_attempts,
                "Attempting upstream call"
            );

            match self.transport.invoke(&target, &request).await {
                Ok(text) => return text,
                Err(TransportError::TransientCapacity {
                    retry_after,
                    message,
                }) => {
                    tracing::warn!(
                        target = %target.name,
                        error = %message,
                        "Target reached its rate limit"
                    );
                    self.pool.mark_cooldown(&target.name, retry_after);
                }
                Err(TransportError::Permanent { status, message }) => {
                    tracing::error!(
                        target = %target.name,
                        status,
                        error = %message,
                        "Permanent upstream rejection, removing target"
                    );
                    if self.pool.remove(&target.name) == 0 {
                        tracing::error!("Every target has been permanently removed");
                        break;
                    }
                }
                Err(TransportError::Transient { message }) => {
                    tracing::error!(
                        target = %target.name,
                        error = %message,
                        "Transient upstream failure"
                    );
                    self.pool.mark_cooldown(&target.name, None);
                }
            }
        }

        tracing::error!(
            max_attempts = self.max_attempts,
            "All available targets failed, returning failure sentinel"
        );
        CALL_FAILED.to_string()
    }

    /// Snapshot of the underlying pool's health
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }
}

/// Build the surviving target list for one profile
///
/// Incomplete profiles and blank keys are logged and dropped rather than
/// failing construction outright; the caller decides whether zero survivors
/// is fatal.
fn build_targets(profile_name: &str, profile: &ModelProfile) -> Vec<TargetParams> {
    let (Some(base_url), Some(model)) = (profile.base_url.as_deref(), profile.model.as_deref())
    else {
        tracing::warn!(
            profile = %profile_name,
            "Incomplete configuration, skipping: missing base_url or model"
        );
        return Vec::new();
    };

    if profile.api_keys.is_empty() {
        tracing::warn!(profile = %profile_name, "No api_keys configured, skipping");
        return Vec::new();
    }

    profile
        .api_keys
        .iter()
        .enumerate()
        .filter_map(|(idx, key)| {
            if key.trim().is_empty() {
                tracing::warn!(
                    profile = %profile_name,
                    index = idx,
                    "Skipping blank API key"
                );
                return None;
            }
            Some(TargetParams::new(
                format!("{profile_name}-{idx}@{base_url}"),
                base_url,
                key.clone(),
                model,
            ))
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Outcome script for one transport invocation
    enum Step {
        Ok(&'static str),
        RateLimited { retry_after: Option<u64> },
        Rejected,
        ConnectionError,
    }

    /// Transport that replays a scripted sequence of outcomes and records
    /// which target served each attempt
    struct ScriptedTransport {
        script: Mutex<VecDeque<Step>>,
        invocations: AtomicU32,
        served_by: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                invocations: AtomicU32::new(0),
                served_by: Mutex::new(Vec::new()),
            })
        }

        fn invocations(&self) -> u32 {
            self.invocations.load(Ordering::SeqCst)
        }

        fn served_by(&self) -> Vec<String> {
            self.served_by.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn invoke(
            &self,
            target: &TargetParams,
            _request: &ChatRequest,
        ) -> Result<String, TransportError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            self.served_by.lock().unwrap().push(target.name.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(Step::Ok(text)) => Ok(text.to_string()),
                Some(Step::RateLimited { retry_after }) => {
                    Err(TransportError::TransientCapacity {
                        retry_after: retry_after.map(Duration::from_secs),
                        message: "rate limited".to_string(),
                    })
                }
                Some(Step::Rejected) => Err(TransportError::Permanent {
                    status: 401,
                    message: "invalid key".to_string(),
                }),
                Some(Step::ConnectionError) => Err(TransportError::Transient {
                    message: "connection reset".to_string(),
                }),
                None => panic!("transport invoked past the end of its script"),
            }
        }
    }

    fn test_profile(keys: usize) -> ModelProfile {
        ModelProfile {
            base_url: Some("https://api.example.com/v1".to_string()),
            model: Some("model-x".to_string()),
            api_keys: (0..keys).map(|i| format!("sk-{i}")).collect(),
            temperature: 0.7,
            max_tokens: 256,
            cooldown_secs: 300,
            max_attempts: 5,
        }
    }

    fn build_client(keys: usize, transport: Arc<ScriptedTransport>) -> ChatClient {
        ChatClient::from_profile("test", &test_profile(keys), transport).unwrap()
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let transport = ScriptedTransport::new(vec![Step::Ok("hello")]);
        let client = build_client(3, transport.clone());

        assert_eq!(client.call("hi").await, "hello");
        assert_eq!(transport.invocations(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_fails_over_to_next_target() {
        // Target 0 is rate limited with retry-after=10s; target 1 succeeds.
        let transport = ScriptedTransport::new(vec![
            Step::RateLimited {
                retry_after: Some(10),
            },
            Step::Ok("from the second target"),
        ]);
        let client = build_client(3, transport.clone());

        assert_eq!(client.call("hi").await, "from the second target");
        assert_eq!(transport.invocations(), 2);

        let served = transport.served_by();
        assert!(served[0].starts_with("test-0@"));
        assert!(served[1].starts_with("test-1@"));

        // The rate-limited target sits out its 10s cooldown
        let stats = client.pool_stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.cooling_down, 1);
    }

    #[tokio::test]
    async fn test_permanent_failures_empty_the_pool_and_abort_early() {
        let transport = ScriptedTransport::new(vec![Step::Rejected, Step::Rejected]);
        let client = build_client(2, transport.clone());

        // Both targets are rejected; the loop aborts once the pool empties
        // instead of consuming the remaining attempt budget.
        assert_eq!(client.call("hi").await, CALL_FAILED);
        assert_eq!(transport.invocations(), 2);
        assert_eq!(client.pool_stats().total, 0);
    }

    #[tokio::test]
    async fn test_removed_target_never_serves_again() {
        let transport = ScriptedTransport::new(vec![
            Step::Rejected,
            Step::Ok("first"),
            Step::Ok("second"),
            Step::Ok("third"),
        ]);
        let client = build_client(2, transport.clone());

        assert_eq!(client.call("hi").await, "first");
        assert_eq!(client.call("hi").await, "second");
        assert_eq!(client.call("hi").await, "third");

        let served = transport.served_by();
        assert!(served[0].starts_with("test-0@"));
        for name in &served[1..] {
            assert!(name.starts_with("test-1@"), "removed target served: {name}");
        }
    }

    #[tokio::test]
    async fn test_transient_failures_stop_once_no_target_is_selectable() {
        // Two targets, budget of five: after both cool down, selection
        // returns none and the loop stops at two invocations.
        let transport =
            ScriptedTransport::new(vec![Step::ConnectionError, Step::ConnectionError]);
        let client = build_client(2, transport.clone());

        assert_eq!(client.call("hi").await, CALL_FAILED);
        assert_eq!(transport.invocations(), 2);
        assert_eq!(client.pool_stats().cooling_down, 2);
    }

    #[tokio::test]
    async fn test_attempt_budget_bounds_invocations() {
        let mut script: Vec<Step> = Vec::new();
        for _ in 0..5 {
            script.push(Step::ConnectionError);
        }
        let transport = ScriptedTransport::new(script);
        // Six targets but a budget of five: exactly five invocations.
        let client = build_client(6, transport.clone());

        assert_eq!(client.call("hi").await, CALL_FAILED);
        assert_eq!(transport.invocations(), 5);
    }

    #[tokio::test]
    async fn test_call_with_all_targets_cooling_makes_no_invocation() {
        let transport = ScriptedTransport::new(vec![Step::ConnectionError]);
        let client = build_client(1, transport.clone());

        assert_eq!(client.call("hi").await, CALL_FAILED);
        assert_eq!(transport.invocations(), 1);

        // The only target is cooling down; the next call invokes nothing.
        assert_eq!(client.call("hi").await, CALL_FAILED);
        assert_eq!(transport.invocations(), 1);
    }

    #[test]
    fn test_profile_without_keys_is_fatal() {
        let transport = ScriptedTransport::new(Vec::new());
        let profile = ModelProfile {
            api_keys: Vec::new(),
            ..test_profile(0)
        };
        let err = ChatClient::from_profile("test", &profile, transport).unwrap_err();
        assert!(matches!(err, PoolError::NoUsableTargets));
    }

    #[test]
    fn test_profile_missing_base_url_is_fatal() {
        let transport = ScriptedTransport::new(Vec::new());
        let profile = ModelProfile {
            base_url: None,
            ..test_profile(2)
        };
        let err = ChatClient::from_profile("test", &profile, transport).unwrap_err();
        assert!(matches!(err, PoolError::NoUsableTargets));
    }

    #[test]
    fn test_client_debug_output_skips_transport() {
        // `Result<ChatClient, _>::unwrap_err` in tests needs this impl
        let transport = ScriptedTransport::new(Vec::new());
        let client = build_client(2, transport);
        let rendered = format!("{client:?}");
        assert!(rendered.starts_with("ChatClient"));
        assert!(rendered.contains("max_attempts"));
        assert!(!rendered.contains("sk-0"));
    }

    #[test]
    fn test_blank_keys_are_skipped() {
        let transport = ScriptedTransport::new(Vec::new());
        let mut profile = test_profile(2);
        profile.api_keys.insert(1, "   ".to_string());
        let client = ChatClient::from_profile("test", &profile, transport).unwrap();
        assert_eq!(client.pool_stats().total, 2);
    }
}
