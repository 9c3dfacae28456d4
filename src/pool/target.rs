//! Target types for the rotating client pool
//!
//! A target is one endpoint + API key combination eligible to serve a call.
//! Connection parameters are immutable; availability bookkeeping is mutated
//! in place by the owning pool under its lock.

use std::fmt;
use std::time::{Duration, Instant};

/// Default cooldown applied after a transient failure (5 minutes)
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

// ============================================================================
// Target Parameters
// ============================================================================

/// Immutable connection parameters for one target
///
/// Handed out by `TargetPool::select_next` as an owned clone so the upstream
/// call can run outside the pool lock.
#[derive(Clone, PartialEq, Eq)]
pub struct TargetParams {
    /// Opaque label, e.g. `deepseek-0@https://api.deepseek.com/v1`
    pub name: String,
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// API key presented as bearer auth
    pub api_key: String,
    /// Upstream model identifier sent with each request
    pub model: String,
}

impl TargetParams {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

/// Keys stay out of log and debug output
impl fmt::Debug for TargetParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetParams")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

// ============================================================================
// Target
// ============================================================================

/// One pool entry: connection parameters plus availability state
///
/// Lifecycle: Available -> CoolingDown on any transient failure,
/// CoolingDown -> Available once the cooldown elapses (applied lazily during
/// selection), removed from the pool entirely on a permanent failure.
#[derive(Debug)]
pub(crate) struct Target {
    /// Connection parameters
    pub params: TargetParams,
    /// Whether the target is currently in rotation
    pub available: bool,
    /// When the last failure was recorded, if any
    pub last_failure: Option<Instant>,
    /// How long the target stays out of rotation after a failure
    pub cooldown: Duration,
}

impl Target {
    pub fn new(params: TargetParams, cooldown: Duration) -> Self {
        Self {
            params,
            available: true,
            last_failure: None,
            cooldown,
        }
    }

    /// Check whether a cooled-down target is due to re-enter rotation
    pub fn cooldown_elapsed(&self) -> bool {
        match self.last_failure {
            Some(at) => at.elapsed() > self.cooldown,
            None => true,
        }
    }
}
