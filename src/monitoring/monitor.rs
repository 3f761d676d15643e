//! Usage monitor: decision/outcome recording and alert evaluation

use super::handlers::AlertHandler;
use super::types::{Alert, AlertKind, AlertSeverity, ApiMetrics, TimeWindowMetrics};
use crate::config::{AlertThresholds, MonitorConfig};
use crate::error::{GateError, Result};
use crate::gate::AdmissionDecision;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::warn;

/// Per-endpoint monitor state: the public metrics snapshot, finished
/// time-window buckets awaiting retention, and the alert cooldown marker
pub(super) struct MetricsEntry {
    pub(super) metrics: ApiMetrics,
    pub(super) history: Vec<TimeWindowMetrics>,
    pub(super) last_alert_at: Option<DateTime<Utc>>,
}

impl MetricsEntry {
    fn new(endpoint: &str, now: DateTime<Utc>) -> Self {
        Self {
            metrics: ApiMetrics::new(endpoint, now),
            history: Vec::new(),
            last_alert_at: None,
        }
    }
}

/// Records admission decisions and call outcomes, evaluates alert rules, and
/// retains alerts for operator action
///
/// Holds its own locks, independent of the quota tracker; `record_check` and
/// `record_api_call` are safe to call from many tasks concurrently.
pub struct UsageMonitor {
    pub(super) config: MonitorConfig,
    pub(super) entries: Arc<RwLock<HashMap<String, MetricsEntry>>>,
    pub(super) alerts: Arc<RwLock<HashMap<String, Alert>>>,
    handlers: Arc<RwLock<Vec<Arc<dyn AlertHandler>>>>,
    pub(super) active: Arc<RwLock<bool>>,
}

impl UsageMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            entries: Arc::new(RwLock::new(HashMap::new())),
            alerts: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(Vec::new())),
            active: Arc::new(RwLock::new(false)),
        }
    }

    /// Record one admission decision and evaluate the alert rules
    ///
    /// At most one alert fires per call; a new alert for the same endpoint is
    /// suppressed until the cooldown has elapsed since its last alert.
    pub async fn record_check(&self, endpoint: &str, decision: &AdmissionDecision) {
        let now = Utc::now();
        let cooldown = ChronoDuration::seconds(self.config.alert_cooldown_secs as i64);

        let raised = {
            let mut entries = self.entries.write().await;
            let entry = entries
                .entry(endpoint.to_string())
                .or_insert_with(|| MetricsEntry::new(endpoint, now));
            let MetricsEntry {
                metrics,
                history,
                last_alert_at,
            } = entry;

            metrics.total_checks += 1;
            if decision.allowed {
                metrics.allowed += 1;
            } else {
                metrics.blocked += 1;
            }
            if decision.quota_exceeded {
                metrics.quota_exceeded += 1;
            }
            metrics.success_rate = metrics.allowed as f64 / metrics.total_checks as f64;

            for bucket in [&mut metrics.minute, &mut metrics.hour, &mut metrics.day] {
                roll_bucket(bucket, history, now);
                bucket.checks += 1;
                if decision.allowed {
                    bucket.allowed += 1;
                } else {
                    bucket.blocked += 1;
                }
            }

            let cooled_down = last_alert_at.is_none_or(|at| now - at >= cooldown);
            if cooled_down {
                let violation = evaluate_rules(&self.config.thresholds, metrics, decision);
                if let Some((kind, severity, message)) = violation {
                    *last_alert_at = Some(now);
                    Some(Alert::new(endpoint, kind, severity, message, now))
                } else {
                    None
                }
            } else {
                None
            }
        };

        if let Some(alert) = raised {
            self.alerts
                .write()
                .await
                .insert(alert.id.clone(), alert.clone());
            self.dispatch(alert).await;
        }
    }

    /// Record the outcome of one completed outbound call. Never fails.
    ///
    /// The running latency figure is a two-sample blend — each new sample is
    /// averaged with the previous value — not a mean over all samples.
    pub async fn record_api_call(
        &self,
        endpoint: &str,
        success: bool,
        latency: Duration,
        error: Option<&str>,
    ) {
        let now = Utc::now();
        let latency_ms = latency.as_secs_f64() * 1_000.0;

        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(endpoint.to_string())
            .or_insert_with(|| MetricsEntry::new(endpoint, now));
        let metrics = &mut entry.metrics;

        metrics.total_calls += 1;
        metrics.avg_response_time_ms = if metrics.total_calls == 1 {
            latency_ms
        } else {
            (metrics.avg_response_time_ms + latency_ms) / 2.0
        };

        if success {
            metrics.last_success_at = Some(now);
        } else {
            metrics.failed_calls += 1;
            metrics.last_failure_at = Some(now);
            metrics.last_error = error.map(str::to_string);
            warn!(
                endpoint,
                error = error.unwrap_or("unknown"),
                "outbound call failed"
            );
        }
        metrics.error_rate = metrics.failed_calls as f64 / metrics.total_calls as f64;
    }

    /// Metrics snapshot for one endpoint
    pub async fn get_metrics(&self, endpoint: &str) -> Option<ApiMetrics> {
        let entries = self.entries.read().await;
        entries.get(endpoint).map(|entry| entry.metrics.clone())
    }

    /// Metrics snapshots for every endpoint seen so far
    pub async fn get_all_metrics(&self) -> HashMap<String, ApiMetrics> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .map(|(endpoint, entry)| (endpoint.clone(), entry.metrics.clone()))
            .collect()
    }

    /// Finished time-window buckets retained for an endpoint, oldest first
    pub async fn window_history(&self, endpoint: &str) -> Vec<TimeWindowMetrics> {
        let entries = self.entries.read().await;
        entries
            .get(endpoint)
            .map(|entry| entry.history.clone())
            .unwrap_or_default()
    }

    /// All retained alerts, newest first
    pub async fn get_alerts(&self) -> Vec<Alert> {
        let alerts = self.alerts.read().await;
        let mut all: Vec<Alert> = alerts.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        all
    }

    /// Unresolved alerts, newest first
    pub async fn get_active_alerts(&self) -> Vec<Alert> {
        self.get_alerts()
            .await
            .into_iter()
            .filter(|alert| !alert.resolved)
            .collect()
    }

    /// Mark an alert as acknowledged by an operator
    pub async fn acknowledge_alert(&self, id: &str) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .get_mut(id)
            .ok_or_else(|| GateError::AlertNotFound(id.to_string()))?;
        alert.acknowledged = true;
        Ok(())
    }

    /// Mark an alert as resolved
    pub async fn resolve_alert(&self, id: &str) -> Result<()> {
        let mut alerts = self.alerts.write().await;
        let alert = alerts
            .get_mut(id)
            .ok_or_else(|| GateError::AlertNotFound(id.to_string()))?;
        alert.resolved = true;
        alert.resolved_at = Some(Utc::now());
        Ok(())
    }

    /// Register a handler notified for every new alert
    pub async fn add_handler(&self, handler: Arc<dyn AlertHandler>) {
        self.handlers.write().await.push(handler);
    }

    /// Notify every handler, one detached task each. Handler failures are
    /// logged and never reach the caller that triggered the alert.
    async fn dispatch(&self, alert: Alert) {
        let handlers = self.handlers.read().await.clone();
        for handler in handlers {
            let alert = alert.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&alert).await {
                    warn!(handler = handler.name(), "alert handler failed: {}", e);
                }
            });
        }
    }
}

impl Clone for UsageMonitor {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            entries: self.entries.clone(),
            alerts: self.alerts.clone(),
            handlers: self.handlers.clone(),
            active: self.active.clone(),
        }
    }
}

/// Push a finished bucket into history and start a new one once its span has
/// elapsed
fn roll_bucket(
    bucket: &mut TimeWindowMetrics,
    history: &mut Vec<TimeWindowMetrics>,
    now: DateTime<Utc>,
) {
    if now - bucket.window_start >= ChronoDuration::seconds(bucket.span_secs as i64) {
        if bucket.checks > 0 {
            history.push(bucket.clone());
        }
        *bucket = TimeWindowMetrics::new(now, bucket.span_secs);
    }
}

/// Evaluate the alert rules against the endpoint's current metrics. Returns
/// the first violated rule; `record_check` fires at most one alert per call.
fn evaluate_rules(
    thresholds: &AlertThresholds,
    metrics: &ApiMetrics,
    decision: &AdmissionDecision,
) -> Option<(AlertKind, AlertSeverity, String)> {
    let total = metrics.total_checks as f64;

    let quota_ratio = metrics.quota_exceeded as f64 / total;
    if quota_ratio > thresholds.quota_exceeded_ratio {
        return Some((
            AlertKind::QuotaExceeded,
            AlertSeverity::Warning,
            format!(
                "quota exceeded on {:.1}% of checks (threshold {:.1}%)",
                quota_ratio * 100.0,
                thresholds.quota_exceeded_ratio * 100.0
            ),
        ));
    }

    let blocked_ratio = metrics.blocked as f64 / total;
    if blocked_ratio > thresholds.blocked_ratio {
        return Some((
            AlertKind::HighUsage,
            AlertSeverity::Warning,
            format!(
                "{:.1}% of checks blocked (threshold {:.1}%)",
                blocked_ratio * 100.0,
                thresholds.blocked_ratio * 100.0
            ),
        ));
    }

    if metrics.success_rate < thresholds.min_success_rate {
        return Some((
            AlertKind::LowSuccessRate,
            AlertSeverity::Critical,
            format!(
                "check success rate {:.1}% below floor {:.1}%",
                metrics.success_rate * 100.0,
                thresholds.min_success_rate * 100.0
            ),
        ));
    }

    if metrics.total_calls > 0 && metrics.avg_response_time_ms > thresholds.max_avg_latency_ms {
        return Some((
            AlertKind::HighLatency,
            AlertSeverity::Warning,
            format!(
                "average response time {:.0}ms above ceiling {:.0}ms",
                metrics.avg_response_time_ms, thresholds.max_avg_latency_ms
            ),
        ));
    }

    if !decision.allowed && decision.fallback_available {
        return Some((
            AlertKind::FallbackUsed,
            AlertSeverity::Info,
            "blocked check advertised a fallback endpoint".to_string(),
        ));
    }

    if !decision.allowed && !decision.cache_hit {
        return Some((
            AlertKind::CacheMiss,
            AlertSeverity::Info,
            "blocked check had no fresh cached response".to_string(),
        ));
    }

    None
}
