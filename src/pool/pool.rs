//! Rotating target pool
//!
//! This module provides the `TargetPool` that hands out the next healthy
//! target in round-robin order, re-admits cooled-down targets, and drops
//! permanently failed ones from rotation.

use super::target::{Target, TargetParams};
use crate::error::PoolError;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

// ============================================================================
// Pool State
// ============================================================================

/// State guarded by the pool lock: ordered targets plus rotation cursor
///
/// Invariant: `cursor` indexes into `targets`, or `targets` is empty.
#[derive(Debug)]
struct PoolInner {
    targets: Vec<Target>,
    cursor: usize,
}

// ============================================================================
// Target Pool
// ============================================================================

/// A pool of interchangeable upstream targets with round-robin selection
///
/// A single mutex serializes cursor movement and availability bookkeeping.
/// The upstream call itself happens outside the lock, so concurrent callers
/// can have requests in flight against the same target; selection is not a
/// reservation.
#[derive(Debug)]
pub struct TargetPool {
    inner: Mutex<PoolInner>,
    /// Cooldown applied when a failure carries no server-supplied delay
    default_cooldown: Duration,
}

impl TargetPool {
    /// Create a pool from the targets that survived construction
    ///
    /// An empty target list is the one fatal condition in the system: with
    /// nothing to rotate over, no call can ever be served.
    pub fn new(params: Vec<TargetParams>, default_cooldown: Duration) -> Result<Self, PoolError> {
        if params.is_empty() {
            return Err(PoolError::NoUsableTargets);
        }
        let targets = params
            .into_iter()
            .map(|p| Target::new(p, default_cooldown))
            .collect();
        Ok(Self {
            inner: Mutex::new(PoolInner { targets, cursor: 0 }),
            default_cooldown,
        })
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        // Bookkeeping under the lock never panics, so poisoning is unreachable
        self.inner.lock().unwrap()
    }

    /// Select the next available target in rotation order
    ///
    /// Scans at most one full pass starting at the cursor, advancing the
    /// cursor on every step regardless of outcome so repeated calls rotate
    /// fairly even across failures. Cooled-down targets whose cooldown has
    /// elapsed are flipped back to available during the scan. Returns `None`
    /// immediately (no waiting) when no target is available.
    pub fn select_next(&self) -> Option<TargetParams> {
        let mut inner = self.lock();
        let len = inner.targets.len();
        if len == 0 {
            return None;
        }

        for _ in 0..len {
            let idx = inner.cursor;
            inner.cursor = (inner.cursor + 1) % len;

            let target = &mut inner.targets[idx];
            if !target.available && target.cooldown_elapsed() {
                target.available = true;
                target.last_failure = None;
                tracing::info!(
                    target = %target.params.name,
                    "Cooldown period over, target back in rotation"
                );
            }

            if target.available {
                return Some(target.params.clone());
            }
        }

        None
    }

    /// Mark a target unavailable after a transient failure
    ///
    /// `retry_after` overrides the pool-wide default cooldown when the server
    /// supplied an explicit delay. Targets removed by a concurrent permanent
    /// failure are ignored.
    pub fn mark_cooldown(&self, name: &str, retry_after: Option<Duration>) {
        let mut inner = self.lock();
        let cooldown = retry_after.unwrap_or(self.default_cooldown);
        if let Some(target) = inner.targets.iter_mut().find(|t| t.params.name == name) {
            target.available = false;
            target.last_failure = Some(Instant::now());
            target.cooldown = cooldown;
            tracing::warn!(
                target = %name,
                cooldown_secs = cooldown.as_secs(),
                "Target marked unavailable, cooling down"
            );
        }
    }

    /// Remove a permanently failed target from the pool
    ///
    /// Returns the number of targets remaining. The cursor is re-normalized
    /// so it stays a valid index into the shrunken set; rotation fairness
    /// across the removal is best-effort only.
    pub fn remove(&self, name: &str) -> usize {
        let mut inner = self.lock();
        if let Some(pos) = inner.targets.iter().position(|t| t.params.name == name) {
            inner.targets.remove(pos);
            if pos < inner.cursor {
                inner.cursor -= 1;
            }
            match inner.targets.len() {
                0 => inner.cursor = 0,
                len => inner.cursor %= len,
            }
            tracing::error!(
                target = %name,
                remaining = inner.targets.len(),
                "Target permanently removed from pool"
            );
        }
        inner.targets.len()
    }

    /// Number of targets still in the pool (available or cooling down)
    pub fn len(&self) -> usize {
        self.lock().targets.len()
    }

    /// Check if every target has been permanently removed
    pub fn is_empty(&self) -> bool {
        self.lock().targets.is_empty()
    }

    /// Snapshot of pool health
    pub fn stats(&self) -> PoolStats {
        let inner = self.lock();
        let available = inner.targets.iter().filter(|t| t.available).count();
        PoolStats {
            total: inner.targets.len(),
            available,
            cooling_down: inner.targets.len() - available,
        }
    }
}

// ============================================================================
// Pool Statistics
// ============================================================================

/// Statistics about a target pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of targets still in the pool
    pub total: usize,
    /// Number of targets currently in rotation
    pub available: usize,
    /// Number of targets waiting out a cooldown
    pub cooling_down: usize,
}

impl PoolStats {
    /// Check if at least one target is in rotation
    pub fn is_healthy(&self) -> bool {
        self.available > 0
    }
}

// ============================================================================
// Tests
// ============================================================================
