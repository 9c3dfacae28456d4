//! OpenAI-compatible chat completion transport
//!
//! Speaks `POST {base_url}/chat/completions` with bearer auth against any
//! OpenAI-compatible endpoint and maps HTTP outcomes onto the closed failure
//! classification:
//!
//! - 429 => `TransientCapacity`, honoring a `retry-after` header when present
//! - any other non-2xx status => `Permanent` (auth/authz rejections are the
//!   canonical case; the key is pulled from rotation)
//! - connection, timeout, and body/parse failures => `Transient`

use super::{ChatRequest, ChatTransport, TransportError};
use crate::pool::TargetParams;
use crate::schemas::{ChatCompletionRequest, ChatCompletionResponse};
use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

// ============================================================================
// Transport
// ============================================================================

/// Transport for OpenAI-compatible chat completion endpoints
#[derive(Debug, Clone)]
pub struct OpenAiTransport {
    client: Client,
}

impl OpenAiTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create a transport with the default timeout
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(DEFAULT_TIMEOUT)
    }

    fn completions_url(base_url: &str) -> String {
        format!("{}/chat/completions", base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatTransport for OpenAiTransport {
    async fn invoke(
        &self,
        target: &TargetParams,
        request: &ChatRequest,
    ) -> Result<String, TransportError> {
        let url = Self::completions_url(&target.base_url);
        let body = ChatCompletionRequest {
            model: target.model.clone(),
            messages: request.messages.clone(),
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
        };

        tracing::debug!(
            target = %target.name,
            url = %url,
            model = %target.model,
            "Calling chat completions API"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&target.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Transient {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers());
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, retry_after, message));
        }

        let completion: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| TransportError::Transient {
                    message: format!("failed to parse response: {e}"),
                })?;

        extract_text(completion)
    }
}

// ============================================================================
// Classification Helpers
// ============================================================================

/// Map a non-success HTTP status onto a failure classification
fn classify_status(
    status: StatusCode,
    retry_after: Option<Duration>,
    message: String,
) -> TransportError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        TransportError::TransientCapacity {
            retry_after,
            message,
        }
    } else {
        TransportError::Permanent {
            status: status.as_u16(),
            message,
        }
    }
}

/// Parse a `retry-after` header given in whole seconds
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pull the first choice's trimmed text out of a completion
fn extract_text(completion: ChatCompletionResponse) -> Result<String, TransportError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|text| text.trim().to_string())
        .ok_or_else(|| TransportError::Transient {
            message: "response contained no text content".to_string(),
        })
}

// ============================================================================
// Tests
// ============================================================================
