// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder collects these.

use metrics::{describe_counter, describe_histogram};

/// Register all wagate metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("wagate_messages_sent_total", "Outbound messages accepted by the provider");
    describe_counter!(
        "wagate_message_status_total",
        "Delivery receipts received, by status"
    );
    describe_counter!("wagate_send_failures_total", "Outbound sends that failed");
    describe_counter!(
        "wagate_rate_limited_total",
        "Outbound sends refused by the per-recipient rate limit"
    );
    describe_counter!("wagate_inbound_messages_total", "Inbound text messages recorded");
    describe_histogram!(
        "wagate_send_latency_seconds",
        "Wall-clock time of a successful send and persist"
    );
}

/// Record a successful send and its latency.
pub fn record_sent(seconds: f64) {
    metrics::counter!("wagate_messages_sent_total").increment(1);
    metrics::histogram!("wagate_send_latency_seconds").record(seconds);
}

/// Record a delivery receipt.
pub fn record_status(status: &'static str) {
    metrics::counter!("wagate_message_status_total", "status" => status).increment(1);
}

/// Record a failed send.
pub fn record_failure() {
    metrics::counter!("wagate_send_failures_total").increment(1);
}

/// Record a send refused by the rate limiter.
pub fn record_rate_limited() {
    metrics::counter!("wagate_rate_limited_total").increment(1);
}

/// Record an inbound message.
pub fn record_inbound() {
    metrics::counter!("wagate_inbound_messages_total").increment(1);
}
