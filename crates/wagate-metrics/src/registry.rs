// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory delivery counters and threshold alerts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::warn;
use wagate_config::model::MetricsConfig;
use wagate_core::MessageStatus;

use crate::recording;

/// Delivery counters shared by dispatch, webhook ingestion and the reporter.
///
/// Constructed explicitly and injected behind an `Arc`; there is no global
/// instance.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    sent: AtomicU64,
    delivered: AtomicU64,
    read: AtomicU64,
    failed: AtomicU64,
    total_time_ms: AtomicU64,
    count: AtomicU64,
}

/// Point-in-time copy of the registry with derived values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub sent: u64,
    pub delivered: u64,
    pub read: u64,
    pub failed: u64,
    pub total_time_ms: u64,
    pub count: u64,
    /// `total_time_ms / count`, 0 when nothing was timed.
    pub avg_time_ms: f64,
    /// `(delivered + read) / sent * 100` with two decimals.
    pub success_rate: String,
}

impl MetricsSnapshot {
    /// `failed / sent`, 0 when nothing was sent.
    pub fn failure_rate(&self) -> f64 {
        if self.sent == 0 {
            0.0
        } else {
            self.failed as f64 / self.sent as f64
        }
    }
}

/// Limits checked on every report tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertThresholds {
    /// Fraction of failed sends above which an alert fires.
    pub failure_rate: f64,
    pub avg_latency_ms: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            failure_rate: 0.10,
            avg_latency_ms: 5000.0,
        }
    }
}

impl From<&MetricsConfig> for AlertThresholds {
    fn from(config: &MetricsConfig) -> Self {
        Self {
            failure_rate: config.failure_rate_threshold,
            avg_latency_ms: config.latency_threshold_ms as f64,
        }
    }
}

/// A threshold breach. Alerts are logged, never escalated.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    HighFailureRate { rate: f64, threshold: f64 },
    HighLatency { avg_ms: f64, threshold_ms: f64 },
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful send and how long it took.
    pub fn record_send(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.total_time_ms.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        recording::record_sent(elapsed.as_secs_f64());
    }

    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        recording::record_status("delivered");
    }

    pub fn record_read(&self) {
        self.read.fetch_add(1, Ordering::Relaxed);
        recording::record_status("read");
    }

    /// Record a failed send or a `failed` delivery receipt.
    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        recording::record_failure();
    }

    /// Route a delivery receipt to its counter. `sent` receipts are not
    /// counted again: the send itself already was.
    pub fn record_status(&self, status: MessageStatus) {
        match status {
            MessageStatus::Sent => recording::record_status("sent"),
            MessageStatus::Delivered => self.record_delivered(),
            MessageStatus::Read => self.record_read(),
            MessageStatus::Failed => self.record_failed(),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let sent = self.sent.load(Ordering::Relaxed);
        let delivered = self.delivered.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let total_time_ms = self.total_time_ms.load(Ordering::Relaxed);
        let count = self.count.load(Ordering::Relaxed);

        let avg_time_ms = if count == 0 {
            0.0
        } else {
            total_time_ms as f64 / count as f64
        };
        let success_rate = if sent == 0 {
            0.0
        } else {
            (delivered + read) as f64 / sent as f64 * 100.0
        };

        MetricsSnapshot {
            sent,
            delivered,
            read,
            failed,
            total_time_ms,
            count,
            avg_time_ms,
            success_rate: format!("{success_rate:.2}"),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.sent,
            &self.delivered,
            &self.read,
            &self.failed,
            &self.total_time_ms,
            &self.count,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Compare the current snapshot against `thresholds`, logging a warning
    /// for each breach.
    pub fn check_alerts(&self, thresholds: &AlertThresholds) -> Vec<Alert> {
        let snapshot = self.snapshot();
        let mut alerts = Vec::new();

        let rate = snapshot.failure_rate();
        if rate > thresholds.failure_rate {
            warn!(
                failure_rate = rate,
                threshold = thresholds.failure_rate,
                sent = snapshot.sent,
                failed = snapshot.failed,
                "high failure rate"
            );
            alerts.push(Alert::HighFailureRate {
                rate,
                threshold: thresholds.failure_rate,
            });
        }

        if snapshot.avg_time_ms > thresholds.avg_latency_ms {
            warn!(
                avg_time_ms = snapshot.avg_time_ms,
                threshold_ms = thresholds.avg_latency_ms,
                "high average send latency"
            );
            alerts.push(Alert::HighLatency {
                avg_ms: snapshot.avg_time_ms,
                threshold_ms: thresholds.avg_latency_ms,
            });
        }

        alerts
    }
}
