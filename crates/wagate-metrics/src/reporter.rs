// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic snapshot logging and alert checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info};

use crate::registry::{AlertThresholds, MetricsRegistry};

/// Log a snapshot and run the alert check every `interval` until `cancel`
/// fires.
pub fn spawn_reporter(
    registry: Arc<MetricsRegistry>,
    interval: Duration,
    thresholds: AlertThresholds,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => report(&registry, &thresholds),
                _ = cancel.cancelled() => {
                    debug!("metrics reporter stopped");
                    break;
                }
            }
        }
    }
    .in_current_span())
}

fn report(registry: &MetricsRegistry, thresholds: &AlertThresholds) {
    let snap = registry.snapshot();
    info!(
        sent = snap.sent,
        delivered = snap.delivered,
        read = snap.read,
        failed = snap.failed,
        avg_time_ms = snap.avg_time_ms,
        success_rate = %snap.success_rate,
        "metrics snapshot"
    );
    registry.check_alerts(thresholds);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn reports_on_each_interval_and_stops_on_cancel() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.record_send(Duration::from_millis(7000));
        let cancel = CancellationToken::new();
        let handle = spawn_reporter(
            registry,
            Duration::from_secs(60),
            AlertThresholds::default(),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(logs_contain("metrics snapshot"));
        assert!(logs_contain("high average send latency"));

        cancel.cancel();
        handle.await.unwrap();
        assert!(logs_contain("metrics reporter stopped"));
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn nothing_logged_before_first_interval() {
        let cancel = CancellationToken::new();
        let handle = spawn_reporter(
            Arc::new(MetricsRegistry::new()),
            Duration::from_secs(60),
            AlertThresholds::default(),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!logs_contain("metrics snapshot"));
        cancel.cancel();
        handle.await.unwrap();
    }
}
