//! Usage monitoring and alerting
//!
//! Records every admission decision and every completed call outcome,
//! maintains per-endpoint metrics over minute/hour/day windows, evaluates
//! alert rules with a per-endpoint cooldown, and runs a background
//! retention/summary sweep.

mod background;
mod handlers;
mod monitor;
mod types;


pub use handlers::{AlertHandler, LogAlertHandler};
pub use monitor::UsageMonitor;
pub use types::{Alert, AlertKind, AlertSeverity, ApiMetrics, TimeWindowMetrics};
