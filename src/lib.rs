//! # callgate
//!
//! Admission control and usage monitoring for outbound calls to third-party
//! data providers (WHOIS, security scanners, reputation services, financial
//! feeds). For every outbound call, callgate decides whether it may proceed
//! now, how long to wait if not, and whether an alternative path — a cached
//! response or a fallback endpoint — exists, while tracking usage against a
//! global budget and per-endpoint budgets and raising operator alerts when
//! usage patterns degrade.
//!
//! This is an in-process library: it never performs the outbound call itself,
//! and all state is process-local. Quotas use fixed reset windows
//! (minute/hour/day), not sliding windows.
//!
//! ## Quick start
//!
//! ```rust
//! use callgate::{AdmissionController, GateConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> callgate::Result<()> {
//!     let controller = AdmissionController::new(GateConfig::default());
//!
//!     let decision = controller.check_rate_limit("whois").await?;
//!     if decision.allowed {
//!         // ... perform the outbound request ...
//!         controller
//!             .record_api_call("whois", true, Duration::from_millis(120), None)
//!             .await;
//!     } else if decision.cache_hit {
//!         let _cached = controller.cache().get("whois");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod gate;
pub mod monitoring;

pub use cache::ResponseCache;
pub use config::{
    AlertThresholds, ApiLimitConfig, ApiPriority, BackoffStrategy, GateConfig, GlobalLimits,
    MonitorConfig,
};
pub use error::{GateError, Result};
pub use fallback::FallbackRegistry;
pub use gate::{AdmissionController, AdmissionDecision, QuotaStatus, QuotaTracker, WindowStatus};
pub use monitoring::{
    Alert, AlertHandler, AlertKind, AlertSeverity, ApiMetrics, LogAlertHandler, TimeWindowMetrics,
    UsageMonitor,
};
