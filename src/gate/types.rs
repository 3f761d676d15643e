//! Admission decision and quota status types

use crate::config::ApiPriority;
use serde::Serialize;
use std::time::Duration;

/// Result of one rate-limit check
///
/// Bundles the allow/deny outcome with the cache and fallback advisories. The
/// advisory flags are informational: the caller decides whether to use the
/// alternative path, and the flags never affect the quota counters.
#[derive(Debug, Clone)]
pub struct AdmissionDecision {
    /// Whether the call may proceed now
    pub allowed: bool,
    /// Remaining requests in the endpoint's current minute window
    pub remaining: u32,
    /// Time until the governing minute window resets
    pub reset_after: Duration,
    /// How long to wait before retrying (only set when not allowed)
    pub retry_after: Option<Duration>,
    /// Whether a quota (endpoint or global) blocked the call
    pub quota_exceeded: bool,
    /// Suggested wait before the next check; zero when allowed
    pub wait: Duration,
    /// Whether a fallback endpoint is registered for this endpoint
    pub fallback_available: bool,
    /// Whether a fresh cached response exists for this endpoint
    pub cache_hit: bool,
    /// Priority of the endpoint's budget profile
    pub priority: ApiPriority,
}

impl AdmissionDecision {
    pub(crate) fn allow(remaining: u32, reset_after: Duration, priority: ApiPriority) -> Self {
        Self {
            allowed: true,
            remaining,
            reset_after,
            retry_after: None,
            quota_exceeded: false,
            wait: Duration::ZERO,
            fallback_available: false,
            cache_hit: false,
            priority,
        }
    }

    pub(crate) fn deny(retry_after: Duration, priority: ApiPriority) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            reset_after: retry_after,
            retry_after: Some(retry_after),
            quota_exceeded: true,
            wait: retry_after,
            fallback_available: false,
            cache_hit: false,
            priority,
        }
    }

    /// Whether the caller can proceed without waiting, either because the
    /// check was allowed or because an alternative path is advertised
    pub fn can_proceed(&self) -> bool {
        self.allowed || self.fallback_available || self.cache_hit
    }
}

/// Snapshot of one quota scope (an endpoint or the global budget)
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    /// Endpoint identifier, or `"global"` for the shared budget
    pub endpoint: String,
    pub minute: WindowStatus,
    pub hour: WindowStatus,
    pub day: WindowStatus,
}

/// Snapshot of a single fixed window
#[derive(Debug, Clone, Serialize)]
pub struct WindowStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    /// Seconds until this window's counter resets
    pub resets_in_secs: u64,
}
