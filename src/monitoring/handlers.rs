//! Alert handler trait and the built-in log handler

use super::types::{Alert, AlertSeverity};
use crate::error::Result;
use tracing::{error, info, warn};

/// Callback notified for every newly raised alert
///
/// Handlers run detached, one task per handler per alert; a slow or failing
/// handler never blocks the recording path. Failures are logged by the
/// monitor and not propagated.
#[async_trait::async_trait]
pub trait AlertHandler: Send + Sync {
    /// Deliver one alert
    async fn handle(&self, alert: &Alert) -> Result<()>;

    /// Handler name, used in failure logs
    fn name(&self) -> &str;
}

/// Handler that writes alerts to the tracing log at a level matching their
/// severity
#[derive(Debug, Default)]
pub struct LogAlertHandler;

#[async_trait::async_trait]
impl AlertHandler for LogAlertHandler {
    async fn handle(&self, alert: &Alert) -> Result<()> {
        match alert.severity {
            AlertSeverity::Critical => error!(
                endpoint = %alert.endpoint,
                kind = ?alert.kind,
                "{}",
                alert.message
            ),
            AlertSeverity::Warning => warn!(
                endpoint = %alert.endpoint,
                kind = ?alert.kind,
                "{}",
                alert.message
            ),
            AlertSeverity::Info => info!(
                endpoint = %alert.endpoint,
                kind = ?alert.kind,
                "{}",
                alert.message
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
