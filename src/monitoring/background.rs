//! Background retention sweep for the usage monitor

use chrono::{Duration as ChronoDuration, Utc};
use tracing::info;

use super::monitor::UsageMonitor;

impl UsageMonitor {
    /// Start the periodic retention/summary sweep. Idempotent; the loop runs
    /// until [`stop`](Self::stop) is called.
    pub async fn start(&self) {
        {
            let mut active = self.active.write().await;
            if *active {
                return;
            }
            *active = true;
        }

        let monitor = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.config.sweep_interval());
            loop {
                interval.tick().await;

                if !*monitor.active.read().await {
                    break;
                }

                monitor.sweep().await;
            }
        });
    }

    /// Stop the background sweep. The loop exits on its next tick.
    pub async fn stop(&self) {
        *self.active.write().await = false;
    }

    /// One retention pass: trim window history and alerts past their
    /// retention periods, then log a summary. Takes each monitor lock only
    /// for a short section, so concurrent recording calls are never blocked
    /// for the duration of the sweep.
    pub(crate) async fn sweep(&self) {
        let now = Utc::now();

        let metrics_cutoff = now - ChronoDuration::days(self.config.metrics_retention_days as i64);
        let endpoints = {
            let mut entries = self.entries.write().await;
            for entry in entries.values_mut() {
                entry.history.retain(|window| window.window_start >= metrics_cutoff);
            }
            entries.len()
        };

        let alert_cutoff = now - ChronoDuration::days(self.config.alert_retention_days as i64);
        let (active_alerts, total_alerts) = {
            let mut alerts = self.alerts.write().await;
            // Age-based purge applies to resolved and unresolved alerts alike
            alerts.retain(|_, alert| alert.timestamp >= alert_cutoff);
            (
                alerts.values().filter(|alert| !alert.resolved).count(),
                alerts.len(),
            )
        };

        info!(
            endpoints,
            active_alerts, total_alerts, "usage monitor sweep complete"
        );
    }
}
