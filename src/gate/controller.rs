//! Admission controller: the entry points callers use before outbound I/O

use super::quota::QuotaTracker;
use super::types::{AdmissionDecision, QuotaStatus};
use crate::cache::ResponseCache;
use crate::config::{ApiLimitConfig, GateConfig};
use crate::error::{GateError, Result};
use crate::fallback::FallbackRegistry;
use crate::monitoring::{Alert, AlertHandler, ApiMetrics, UsageMonitor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Lower bound on the wait-loop sleep, so a check landing exactly on a window
/// boundary cannot spin.
const MIN_WAIT: Duration = Duration::from_millis(100);

/// Gates outbound calls against the global and per-endpoint budgets
///
/// Owns the quota tracker, the fallback registry, the response cache, and the
/// usage monitor as explicit instances; pass the controller (or clones of it)
/// to every caller rather than holding it in a process-wide singleton.
///
/// The expected call pattern around one outbound request:
/// [`check_rate_limit`](Self::check_rate_limit) (or
/// [`wait_for_rate_limit`](Self::wait_for_rate_limit)) before the request, and
/// [`record_api_call`](Self::record_api_call) after the response or failure.
pub struct AdmissionController {
    tracker: QuotaTracker,
    fallbacks: Arc<FallbackRegistry>,
    cache: Arc<ResponseCache>,
    monitor: Arc<UsageMonitor>,
}

impl AdmissionController {
    /// Create a controller from a configuration
    pub fn new(config: GateConfig) -> Self {
        let monitor = Arc::new(UsageMonitor::new(config.monitor.clone()));
        let tracker = QuotaTracker::new(config.global.clone(), config.apis.clone());
        Self {
            tracker,
            fallbacks: Arc::new(FallbackRegistry::new()),
            cache: Arc::new(ResponseCache::new()),
            monitor,
        }
    }

    /// Check whether one call to `endpoint` may proceed now, consuming quota
    /// if so
    ///
    /// The fallback and cache advisories are attached regardless of the
    /// allow/deny outcome and never touch the quota counters. Every decision
    /// is forwarded to the usage monitor.
    ///
    /// Fails only with [`GateError::EndpointNotConfigured`] when neither the
    /// endpoint nor a default profile is configured.
    pub async fn check_rate_limit(&self, endpoint: &str) -> Result<AdmissionDecision> {
        let mut decision = self.tracker.check_and_consume(endpoint).await?;
        decision.fallback_available = self.fallbacks.has_fallback(endpoint);
        decision.cache_hit = self.cache.has_cached_response(endpoint);
        self.monitor.record_check(endpoint, &decision).await;
        Ok(decision)
    }

    /// Block until `endpoint` is admitted or an alternative path is available
    ///
    /// Returns immediately when a check is allowed, or when a fallback
    /// endpoint or fresh cached response is advertised (the caller is expected
    /// to take the alternative instead of the primary endpoint). Otherwise
    /// sleeps for the decision's suggested wait and retries; the quota lock is
    /// never held while sleeping.
    ///
    /// No retry cap is enforced here — bound the call with `deadline`, which
    /// produces [`GateError::Cancelled`] once it elapses, even mid-sleep.
    pub async fn wait_for_rate_limit(
        &self,
        endpoint: &str,
        deadline: Option<Instant>,
    ) -> Result<()> {
        loop {
            let decision = self.check_rate_limit(endpoint).await?;
            if decision.can_proceed() {
                return Ok(());
            }

            let wait = decision.wait.max(MIN_WAIT);
            match deadline {
                Some(deadline) => {
                    tokio::select! {
                        _ = time::sleep(wait) => {}
                        _ = time::sleep_until(deadline) => {
                            return Err(GateError::Cancelled(endpoint.to_string()));
                        }
                    }
                }
                None => time::sleep(wait).await,
            }
        }
    }

    /// Record the outcome of the actual outbound call. Never fails.
    pub async fn record_api_call(
        &self,
        endpoint: &str,
        success: bool,
        latency: Duration,
        error: Option<&str>,
    ) {
        self.monitor
            .record_api_call(endpoint, success, latency, error)
            .await;
    }

    /// Add or replace an endpoint's budget configuration
    pub async fn add_api_config(&self, endpoint: &str, config: ApiLimitConfig) {
        self.tracker.add_config(endpoint, config).await;
    }

    /// Remove an endpoint's budget configuration and live counters
    pub async fn remove_api_config(&self, endpoint: &str) {
        self.tracker.remove_config(endpoint).await;
    }

    /// The budget and advisory retry policy an endpoint is tracked with
    pub async fn get_api_config(&self, endpoint: &str) -> Option<ApiLimitConfig> {
        self.tracker.config_for(endpoint).await
    }

    /// Quota snapshot for an endpoint, `None` if it has never been checked
    pub async fn get_rate_limit_status(&self, endpoint: &str) -> Option<QuotaStatus> {
        self.tracker.status(endpoint).await
    }

    /// Snapshot of the process-wide budget
    pub async fn get_global_rate_limit_status(&self) -> QuotaStatus {
        self.tracker.global_status().await
    }

    /// Zero an endpoint's counters, as if it were freshly created
    pub async fn reset_rate_limit(&self, endpoint: &str) {
        self.tracker.reset(endpoint).await;
    }

    /// Zero the global counters
    pub async fn reset_global_rate_limit(&self) {
        self.tracker.reset_global().await;
    }

    /// Metrics snapshot for one endpoint
    pub async fn get_metrics(&self, endpoint: &str) -> Option<ApiMetrics> {
        self.monitor.get_metrics(endpoint).await
    }

    /// Metrics snapshots for every endpoint seen so far
    pub async fn get_all_metrics(&self) -> HashMap<String, ApiMetrics> {
        self.monitor.get_all_metrics().await
    }

    /// All retained alerts, newest first
    pub async fn get_alerts(&self) -> Vec<Alert> {
        self.monitor.get_alerts().await
    }

    /// Unresolved alerts, newest first
    pub async fn get_active_alerts(&self) -> Vec<Alert> {
        self.monitor.get_active_alerts().await
    }

    /// Mark an alert as acknowledged by an operator
    pub async fn acknowledge_alert(&self, id: &str) -> Result<()> {
        self.monitor.acknowledge_alert(id).await
    }

    /// Mark an alert as resolved
    pub async fn resolve_alert(&self, id: &str) -> Result<()> {
        self.monitor.resolve_alert(id).await
    }

    /// Register a handler notified (fire-and-forget) for every new alert
    pub async fn add_alert_handler(&self, handler: Arc<dyn AlertHandler>) {
        self.monitor.add_handler(handler).await;
    }

    /// Start the background retention/summary sweep
    pub async fn start(&self) {
        self.monitor.start().await;
    }

    /// Stop the background sweep
    pub async fn stop(&self) {
        self.monitor.stop().await;
    }

    /// The fallback registry, for wiring alternate endpoints
    pub fn fallbacks(&self) -> &Arc<FallbackRegistry> {
        &self.fallbacks
    }

    /// The advisory response cache
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    /// The usage monitor
    pub fn monitor(&self) -> &Arc<UsageMonitor> {
        &self.monitor
    }
}

impl Clone for AdmissionController {
    fn clone(&self) -> Self {
        Self {
            tracker: self.tracker.clone(),
            fallbacks: self.fallbacks.clone(),
            cache: self.cache.clone(),
            monitor: self.monitor.clone(),
        }
    }
}
