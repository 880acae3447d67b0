// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery metrics for the wagate gateway.
//!
//! [`MetricsRegistry`] holds the counters the gateway alerts on. Every record
//! is mirrored to the metrics-rs facade so the Prometheus exporter renders the
//! same numbers on `/metrics`.

pub mod exporter;
pub mod recording;
pub mod registry;
pub mod reporter;

pub use exporter::PrometheusExporter;
pub use registry::{Alert, AlertThresholds, MetricsRegistry, MetricsSnapshot};
pub use reporter::spawn_reporter;
