//! End-to-end failover behavior through the public API

use async_trait::async_trait;
use chatpool::{
    ChatClient, ChatRequest, ChatTransport, ModelProfile, TargetParams, TransportError,
    CALL_FAILED,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that replays a fixed sequence of upstream outcomes
struct ReplayTransport {
    outcomes: Mutex<VecDeque<Result<String, TransportError>>>,
}

impl ReplayTransport {
    fn new(outcomes: Vec<Result<String, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
        })
    }
}

#[async_trait]
impl ChatTransport for ReplayTransport {
    async fn invoke(
        &self,
        _target: &TargetParams,
        _request: &ChatRequest,
    ) -> Result<String, TransportError> {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport invoked more times than scripted")
    }
}

fn profile(keys: usize) -> ModelProfile {
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

#[tokio::test]
async fn rate_limited_key_fails_over_and_cools_down() {
    let transport = ReplayTransport::new(vec![
        Err(TransportError::TransientCapacity {
            retry_after: Some(Duration::from_secs(10)),
            message: "over quota".to_string(),
        }),
        Ok("served by the backup key".to_string()),
    ]);
    let client = ChatClient::from_profile("demo", &profile(3), transport).unwrap();

    assert_eq!(client.call("hello").await, "served by the backup key");

    let stats = client.pool_stats();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.cooling_down, 1);
    assert!(stats.is_healthy());
}

#[tokio::test]
async fn rejected_keys_empty_the_pool_and_yield_the_sentinel() {
    let rejected = || {
        Err(TransportError::Permanent {
            status: 401,
            message: "invalid key".to_string(),
        })
    };
    let transport = ReplayTransport::new(vec![rejected(), rejected()]);
    let client = ChatClient::from_profile("demo", &profile(2), transport).unwrap();

    assert_eq!(client.call("hello").await, CALL_FAILED);
    assert_eq!(client.pool_stats().total, 0);

    // A later call finds nothing to select and fails without any invocation
    assert_eq!(client.call("hello").await, CALL_FAILED);
}
