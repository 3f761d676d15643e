//! Metric and alert types

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Info => write!(f, "INFO"),
            AlertSeverity::Warning => write!(f, "WARNING"),
            AlertSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The rule that raised an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Quota-exceeded checks above the configured share of total checks
    QuotaExceeded,
    /// Blocked checks above the configured share of total checks
    HighUsage,
    /// Check success rate below the configured floor
    LowSuccessRate,
    /// Average response time above the configured ceiling
    HighLatency,
    /// A blocked decision advertised a fallback endpoint
    FallbackUsed,
    /// A blocked decision had no fresh cached response
    CacheMiss,
}

/// A raised condition tied to one endpoint and one rule
///
/// Once created, an alert only changes through operator action
/// (acknowledge/resolve). Re-firing for the same endpoint is suppressed until
/// the cooldown elapses.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub endpoint: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub acknowledged: bool,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub(crate) fn new(
        endpoint: &str,
        kind: AlertKind,
        severity: AlertSeverity,
        message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            endpoint: endpoint.to_string(),
            kind,
            severity,
            message,
            timestamp,
            acknowledged: false,
            resolved: false,
            resolved_at: None,
        }
    }
}

/// Check counts within one fixed time window
#[derive(Debug, Clone, Serialize)]
pub struct TimeWindowMetrics {
    pub window_start: DateTime<Utc>,
    pub span_secs: u64,
    pub checks: u64,
    pub allowed: u64,
    pub blocked: u64,
}

impl TimeWindowMetrics {
    pub(crate) fn new(window_start: DateTime<Utc>, span_secs: u64) -> Self {
        Self {
            window_start,
            span_secs,
            checks: 0,
            allowed: 0,
            blocked: 0,
        }
    }
}

/// Per-endpoint aggregate of admission decisions and call outcomes
#[derive(Debug, Clone, Serialize)]
pub struct ApiMetrics {
    pub endpoint: String,

    /// Total admission checks recorded
    pub total_checks: u64,
    pub allowed: u64,
    pub blocked: u64,
    /// Checks blocked because a quota was exhausted
    pub quota_exceeded: u64,
    /// allowed / total_checks; 0 until the first check
    pub success_rate: f64,

    /// Completed outbound calls recorded
    pub total_calls: u64,
    pub failed_calls: u64,
    /// failed_calls / total_calls; 0 until the first call
    pub error_rate: f64,
    /// Two-sample latency blend: each new sample is averaged with the
    /// previous value, `avg = (avg_prev + latency) / 2`
    pub avg_response_time_ms: f64,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,

    pub minute: TimeWindowMetrics,
    pub hour: TimeWindowMetrics,
    pub day: TimeWindowMetrics,
}

impl ApiMetrics {
    pub(crate) fn new(endpoint: &str, now: DateTime<Utc>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            total_checks: 0,
            allowed: 0,
            blocked: 0,
            quota_exceeded: 0,
            success_rate: 0.0,
            total_calls: 0,
            failed_calls: 0,
            error_rate: 0.0,
            avg_response_time_ms: 0.0,
            last_success_at: None,
            last_failure_at: None,
            last_error: None,
            minute: TimeWindowMetrics::new(now, 60),
            hour: TimeWindowMetrics::new(now, 3_600),
            day: TimeWindowMetrics::new(now, 86_400),
        }
    }
}
