//! Fixed-window quota bookkeeping
//!
//! Counters reset at fixed period boundaries rather than sliding: a burst just
//! before a boundary followed by a burst just after can total up to twice the
//! nominal limit within an arbitrary one-minute span. This matches the
//! behavior of the systems this library fronts and is intentional.

use super::types::{AdmissionDecision, QuotaStatus, WindowStatus};
use crate::config::{ApiLimitConfig, GlobalLimits, DEFAULT_PROFILE};
use crate::error::{GateError, Result};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3_600);
const DAY: Duration = Duration::from_secs(86_400);

/// One fixed window: a counter and the instant its current period began
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

impl Window {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            started_at: now,
        }
    }

    /// Zero the counter if the period has elapsed. Resets at most once per
    /// elapsed period; the counter never goes negative.
    fn roll(&mut self, now: Instant, period: Duration) {
        if now.duration_since(self.started_at) >= period {
            self.count = 0;
            self.started_at = now;
        }
    }

    fn resets_in(&self, now: Instant, period: Duration) -> Duration {
        period.saturating_sub(now.duration_since(self.started_at))
    }

    /// Count as it would appear after a roll, without mutating
    fn effective_count(&self, now: Instant, period: Duration) -> u32 {
        if now.duration_since(self.started_at) >= period {
            0
        } else {
            self.count
        }
    }
}

/// Minute/hour/day windows for one quota scope
#[derive(Debug, Clone, Copy)]
struct QuotaWindows {
    minute: Window,
    hour: Window,
    day: Window,
}

impl QuotaWindows {
    fn new(now: Instant) -> Self {
        Self {
            minute: Window::new(now),
            hour: Window::new(now),
            day: Window::new(now),
        }
    }

    fn roll(&mut self, now: Instant) {
        self.minute.roll(now, MINUTE);
        self.hour.roll(now, HOUR);
        self.day.roll(now, DAY);
    }

    fn consume(&mut self) {
        self.minute.count += 1;
        self.hour.count += 1;
        self.day.count += 1;
    }

    fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    fn status(&self, endpoint: &str, limits: [u32; 3], now: Instant) -> QuotaStatus {
        let window_status = |window: &Window, limit: u32, period: Duration| {
            let used = window.effective_count(now, period);
            WindowStatus {
                limit,
                used,
                remaining: limit.saturating_sub(used),
                resets_in_secs: if used == 0 {
                    period.as_secs()
                } else {
                    window.resets_in(now, period).as_secs()
                },
            }
        };
        QuotaStatus {
            endpoint: endpoint.to_string(),
            minute: window_status(&self.minute, limits[0], MINUTE),
            hour: window_status(&self.hour, limits[1], HOUR),
            day: window_status(&self.day, limits[2], DAY),
        }
    }
}

/// Per-endpoint budget: configured limits plus live window counters
#[derive(Debug, Clone)]
struct EndpointQuota {
    limits: ApiLimitConfig,
    windows: QuotaWindows,
}

impl EndpointQuota {
    fn new(limits: ApiLimitConfig, now: Instant) -> Self {
        Self {
            limits,
            windows: QuotaWindows::new(now),
        }
    }
}

#[derive(Debug)]
struct TrackerState {
    global_limits: GlobalLimits,
    global: QuotaWindows,
    /// Configured budgets, including the `"default"` profile
    configs: HashMap<String, ApiLimitConfig>,
    /// Live counters, created lazily on first reference to an endpoint
    endpoints: HashMap<String, EndpointQuota>,
}

/// Tracks request counts against the global and per-endpoint budgets
///
/// One lock covers the global windows and the endpoint map, so the
/// global-then-endpoint check and the increment happen in a single critical
/// section; concurrent callers on different endpoints cannot race past the
/// shared budget.
pub struct QuotaTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl QuotaTracker {
    pub fn new(global: GlobalLimits, configs: HashMap<String, ApiLimitConfig>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TrackerState {
                global_limits: global,
                global: QuotaWindows::new(Instant::now()),
                configs,
                endpoints: HashMap::new(),
            })),
        }
    }

    /// Check the global and endpoint budgets and, if allowed, consume one
    /// request from both — atomically relative to concurrent callers.
    ///
    /// Only minute limits gate admission; hour and day counts are tracked for
    /// status reporting. Endpoints without explicit configuration are
    /// bootstrapped from the `"default"` profile and thereafter keep their own
    /// counters.
    pub async fn check_and_consume(&self, endpoint: &str) -> Result<AdmissionDecision> {
        let now = Instant::now();
        let mut state = self.state.write().await;
        let TrackerState {
            global_limits,
            global,
            configs,
            endpoints,
        } = &mut *state;

        let quota = match endpoints.entry(endpoint.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                let limits = configs
                    .get(endpoint)
                    .or_else(|| configs.get(DEFAULT_PROFILE))
                    .cloned()
                    .ok_or_else(|| GateError::EndpointNotConfigured(endpoint.to_string()))?;
                vacant.insert(EndpointQuota::new(limits, now))
            }
        };

        global.roll(now);
        quota.windows.roll(now);

        // The shared budget gates first: when it is exhausted every endpoint
        // is blocked, regardless of its own remaining quota.
        if global.minute.count >= global_limits.requests_per_minute {
            let retry_after = global.minute.resets_in(now, MINUTE);
            debug!(
                endpoint,
                retry_after_ms = retry_after.as_millis() as u64,
                "global rate limit exhausted"
            );
            return Ok(AdmissionDecision::deny(retry_after, quota.limits.priority));
        }

        if quota.windows.minute.count >= quota.limits.requests_per_minute {
            let retry_after = quota.windows.minute.resets_in(now, MINUTE);
            debug!(
                endpoint,
                count = quota.windows.minute.count,
                limit = quota.limits.requests_per_minute,
                "endpoint rate limit exhausted"
            );
            return Ok(AdmissionDecision::deny(retry_after, quota.limits.priority));
        }

        quota.windows.consume();
        global.consume();

        let remaining = quota
            .limits
            .requests_per_minute
            .saturating_sub(quota.windows.minute.count);
        Ok(AdmissionDecision::allow(
            remaining,
            quota.windows.minute.resets_in(now, MINUTE),
            quota.limits.priority,
        ))
    }

    /// Current quota snapshot for an endpoint, or `None` if it has never been
    /// checked. Does not bootstrap the endpoint.
    pub async fn status(&self, endpoint: &str) -> Option<QuotaStatus> {
        let now = Instant::now();
        let state = self.state.read().await;
        state.endpoints.get(endpoint).map(|quota| {
            quota.windows.status(
                endpoint,
                [
                    quota.limits.requests_per_minute,
                    quota.limits.requests_per_hour,
                    quota.limits.requests_per_day,
                ],
                now,
            )
        })
    }

    /// Snapshot of the process-wide budget
    pub async fn global_status(&self) -> QuotaStatus {
        let now = Instant::now();
        let state = self.state.read().await;
        state.global.status(
            "global",
            [
                state.global_limits.requests_per_minute,
                state.global_limits.requests_per_hour,
                state.global_limits.requests_per_day,
            ],
            now,
        )
    }

    /// Zero an endpoint's counters and restart its windows. Idempotent; a
    /// subsequent check behaves as if the endpoint were freshly created.
    pub async fn reset(&self, endpoint: &str) {
        let now = Instant::now();
        let mut state = self.state.write().await;
        if let Some(quota) = state.endpoints.get_mut(endpoint) {
            quota.windows.reset(now);
        }
    }

    /// Zero the global counters and restart the global windows
    pub async fn reset_global(&self) {
        let now = Instant::now();
        let mut state = self.state.write().await;
        state.global.reset(now);
    }

    /// Add or replace an endpoint's budget. A live quota picks up the new
    /// limits but keeps its current counters.
    pub async fn add_config(&self, endpoint: &str, config: ApiLimitConfig) {
        let mut state = self.state.write().await;
        state
            .configs
            .insert(endpoint.to_string(), config.clone());
        if let Some(quota) = state.endpoints.get_mut(endpoint) {
            quota.limits = config;
        }
    }

    /// Remove an endpoint's budget and its live counters. The endpoint will
    /// fall back to the default profile on its next check, if one exists.
    pub async fn remove_config(&self, endpoint: &str) {
        let mut state = self.state.write().await;
        state.configs.remove(endpoint);
        state.endpoints.remove(endpoint);
    }

    /// The budget an endpoint is (or would be) tracked with, including the
    /// advisory retry metadata for the caller's own HTTP retry policy
    pub async fn config_for(&self, endpoint: &str) -> Option<ApiLimitConfig> {
        let state = self.state.read().await;
        state
            .configs
            .get(endpoint)
            .or_else(|| state.configs.get(DEFAULT_PROFILE))
            .cloned()
    }
}

impl Clone for QuotaTracker {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}
