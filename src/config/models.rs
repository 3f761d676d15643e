//! Configuration model types

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Name of the profile applied to endpoints without an explicit entry in
/// [`GateConfig::apis`]. An endpoint bootstrapped from this profile keeps its
/// own counters afterwards.
pub const DEFAULT_PROFILE: &str = "default";

/// Top-level configuration for the admission controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Process-wide budget shared by all endpoints
    #[serde(default)]
    pub global: GlobalLimits,
    /// Per-endpoint budgets, keyed by endpoint identifier. The key
    /// `"default"` acts as the profile for unconfigured endpoints.
    #[serde(default)]
    pub apis: HashMap<String, ApiLimitConfig>,
    /// Monitoring and alerting configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        let mut apis = HashMap::new();
        apis.insert(DEFAULT_PROFILE.to_string(), ApiLimitConfig::default());
        Self {
            global: GlobalLimits::default(),
            apis,
            monitor: MonitorConfig::default(),
        }
    }
}

impl GateConfig {
    /// Parse a configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// The profile used for endpoints without an explicit entry, if configured
    pub fn default_profile(&self) -> Option<&ApiLimitConfig> {
        self.apis.get(DEFAULT_PROFILE)
    }
}

/// Process-wide request budget, checked before any per-endpoint budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalLimits {
    #[serde(default = "default_global_rpm")]
    pub requests_per_minute: u32,
    #[serde(default = "default_global_rph")]
    pub requests_per_hour: u32,
    #[serde(default = "default_global_rpd")]
    pub requests_per_day: u32,
}

impl Default for GlobalLimits {
    fn default() -> Self {
        Self {
            requests_per_minute: default_global_rpm(),
            requests_per_hour: default_global_rph(),
            requests_per_day: default_global_rpd(),
        }
    }
}

fn default_global_rpm() -> u32 {
    600
}

fn default_global_rph() -> u32 {
    10_000
}

fn default_global_rpd() -> u32 {
    100_000
}

/// Per-endpoint budget and advisory retry metadata
///
/// `retry_attempts` and `backoff` describe the retry policy the *caller*
/// should apply to its own HTTP requests; the admission layer never retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiLimitConfig {
    #[serde(default = "default_rpm")]
    pub requests_per_minute: u32,
    #[serde(default = "default_rph")]
    pub requests_per_hour: u32,
    #[serde(default = "default_rpd")]
    pub requests_per_day: u32,
    #[serde(default)]
    pub priority: ApiPriority,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffStrategy,
}

impl Default for ApiLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_rpm(),
            requests_per_hour: default_rph(),
            requests_per_day: default_rpd(),
            priority: ApiPriority::default(),
            retry_attempts: default_retry_attempts(),
            backoff: BackoffStrategy::default(),
        }
    }
}

fn default_rpm() -> u32 {
    60
}

fn default_rph() -> u32 {
    1_000
}

fn default_rpd() -> u32 {
    10_000
}

fn default_retry_attempts() -> u32 {
    3
}

/// Relative importance of an endpoint, carried through admission decisions
/// so callers can prioritize contended budgets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiPriority {
    Low,
    #[default]
    Normal,
    High,
}

/// Backoff shape the caller should use between its own HTTP retries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    Fixed,
    Linear,
    #[default]
    Exponential,
}

/// Monitoring, alerting, and retention configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Minimum seconds between two alerts for the same endpoint
    #[serde(default = "default_alert_cooldown_secs")]
    pub alert_cooldown_secs: u64,
    /// Days of time-window metrics history to retain
    #[serde(default = "default_metrics_retention_days")]
    pub metrics_retention_days: u32,
    /// Days of alert history to retain, resolved or not
    #[serde(default = "default_alert_retention_days")]
    pub alert_retention_days: u32,
    /// Interval of the background retention/summary sweep, in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Thresholds for the alert rules
    #[serde(default)]
    pub thresholds: AlertThresholds,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            alert_cooldown_secs: default_alert_cooldown_secs(),
            metrics_retention_days: default_metrics_retention_days(),
            alert_retention_days: default_alert_retention_days(),
            sweep_interval_secs: default_sweep_interval_secs(),
            thresholds: AlertThresholds::default(),
        }
    }
}

impl MonitorConfig {
    pub fn alert_cooldown(&self) -> Duration {
        Duration::from_secs(self.alert_cooldown_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_alert_cooldown_secs() -> u64 {
    300
}

fn default_metrics_retention_days() -> u32 {
    7
}

fn default_alert_retention_days() -> u32 {
    30
}

fn default_sweep_interval_secs() -> u64 {
    300
}

/// Thresholds at which the alert rules fire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertThresholds {
    /// Quota-exceeded checks / total checks above which to warn
    #[serde(default = "default_quota_exceeded_ratio")]
    pub quota_exceeded_ratio: f64,
    /// Blocked checks / total checks above which to warn
    #[serde(default = "default_blocked_ratio")]
    pub blocked_ratio: f64,
    /// Success rate below which to raise a critical alert
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,
    /// Average response time (milliseconds) above which to warn
    #[serde(default = "default_max_avg_latency_ms")]
    pub max_avg_latency_ms: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            quota_exceeded_ratio: default_quota_exceeded_ratio(),
            blocked_ratio: default_blocked_ratio(),
            min_success_rate: default_min_success_rate(),
            max_avg_latency_ms: default_max_avg_latency_ms(),
        }
    }
}

fn default_quota_exceeded_ratio() -> f64 {
    0.10
}

fn default_blocked_ratio() -> f64 {
    0.80
}

fn default_min_success_rate() -> f64 {
    0.90
}

fn default_max_avg_latency_ms() -> f64 {
    5_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_has_default_profile() {
        let config = GateConfig::default();
        let profile = config.default_profile().expect("default profile");
        assert_eq!(profile.requests_per_minute, 60);
        assert_eq!(profile.priority, ApiPriority::Normal);
        assert_eq!(profile.backoff, BackoffStrategy::Exponential);
    }

    #[test]
    fn test_threshold_defaults() {
        let thresholds = AlertThresholds::default();
        assert_eq!(thresholds.quota_exceeded_ratio, 0.10);
        assert_eq!(thresholds.blocked_ratio, 0.80);
        assert_eq!(thresholds.min_success_rate, 0.90);
        assert_eq!(thresholds.max_avg_latency_ms, 5_000.0);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
global:
  requests_per_minute: 100
apis:
  default:
    requests_per_minute: 30
  whois:
    requests_per_minute: 10
    priority: high
    backoff: linear
monitor:
  alert_cooldown_secs: 60
"#;
        let config = GateConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.global.requests_per_minute, 100);
        // Omitted fields fall back to their serde defaults
        assert_eq!(config.global.requests_per_hour, 10_000);
        assert_eq!(config.apis["whois"].requests_per_minute, 10);
        assert_eq!(config.apis["whois"].priority, ApiPriority::High);
        assert_eq!(config.apis["whois"].backoff, BackoffStrategy::Linear);
        assert_eq!(config.default_profile().unwrap().requests_per_minute, 30);
        assert_eq!(config.monitor.alert_cooldown(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let result = GateConfig::from_yaml_str("apis: [not, a, map]");
        assert!(result.is_err());
    }
}
