// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `wagate serve` command implementation.
//!
//! Wires SQLite storage, the rate limiter's counter store, the WhatsApp
//! sender, the delivery queue and the metrics reporter into the HTTP gateway,
//! then serves until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use wagate_config::WagateConfig;
use wagate_config::model::RateLimitConfig;
use wagate_core::{
    Clock, CounterStore, GatewayError, MessageSender, PluginAdapter, StorageAdapter, SystemClock,
};
use wagate_dispatch::{
    Dispatcher, MemoryCounterStore, RateLimiter, RedisCounterStore, SendPipeline, build_queue,
};
use wagate_gateway::{AppState, HealthState, ListenConfig, WebhookSecrets, start_server};
use wagate_metrics::{AlertThresholds, MetricsRegistry, PrometheusExporter, spawn_reporter};
use wagate_storage::{Persistence, SqliteStorage, TemplateLifecycle};
use wagate_whatsapp::WhatsAppClient;

use crate::shutdown;

/// Runs the `wagate serve` command.
pub async fn run_serve(config: WagateConfig) -> Result<(), GatewayError> {
    init_tracing(&config.server.log_level);

    info!("starting wagate serve");

    // Initialize storage.
    let storage: Arc<dyn StorageAdapter> = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let counter = counter_store(&config.rate_limit).await?;
    info!(backend = counter.name(), per_minute = config.rate_limit.per_minute, "rate limiter ready");

    let sender: Arc<dyn MessageSender> = Arc::new(WhatsAppClient::new(&config.whatsapp)?);

    let metrics = Arc::new(MetricsRegistry::new());
    let prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>> =
        match PrometheusExporter::install() {
            Ok(exporter) => Some(Arc::new(move || exporter.render())),
            Err(e) => {
                warn!(error = %e, "prometheus exporter unavailable");
                None
            }
        };

    let persistence = Persistence::new(
        storage.clone(),
        clock.clone(),
        config.conversation.window_minutes,
    );
    let templates = TemplateLifecycle::new(storage.clone(), clock.clone());
    let pipeline: Arc<dyn SendPipeline> = Arc::new(Dispatcher::new(
        RateLimiter::new(counter, clock, config.rate_limit.per_minute),
        sender,
        templates.clone(),
        persistence.clone(),
        metrics.clone(),
    ));

    let cancel = shutdown::install_signal_handler();

    let queue = build_queue(&config.queue, pipeline, cancel.child_token()).await?;
    info!(mode = ?queue.mode(), "delivery queue started");

    let reporter = spawn_reporter(
        metrics.clone(),
        Duration::from_secs(config.metrics.report_interval_secs),
        AlertThresholds::from(&config.metrics),
        cancel.child_token(),
    );

    let state = AppState {
        persistence,
        templates,
        queue: queue.clone(),
        metrics,
        secrets: WebhookSecrets::new(
            config.server.verify_token.clone(),
            config.server.app_secret.clone(),
        ),
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: storage.clone(),
            prometheus_render,
        },
    };

    let served = start_server(&ListenConfig::from(&config.server), state, cancel.clone()).await;

    // Whether the server stopped on a signal or an error, stop the background work too.
    cancel.cancel();
    queue.shutdown().await;
    if let Err(e) = reporter.await {
        warn!(error = %e, "metrics reporter task failed");
    }
    storage.close().await?;

    info!("wagate serve stopped");
    served
}

/// Shared Redis counters when configured, otherwise per-process memory.
async fn counter_store(config: &RateLimitConfig) -> Result<Arc<dyn CounterStore>, GatewayError> {
    match &config.redis_url {
        Some(url) => Ok(Arc::new(RedisCounterStore::connect(url).await?)),
        None => {
            warn!("no redis_url configured, rate limits only hold within this process");
            Ok(Arc::new(MemoryCounterStore::new()))
        }
    }
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wagate={log_level},warn")));

    // A second init (tests) is not an error worth failing on.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn memory_counter_store_warns_limits_are_per_process() {
        let counter = counter_store(&RateLimitConfig::default()).await.unwrap();
        assert_eq!(counter.name(), MemoryCounterStore::new().name());
        logs_assert(|lines: &[&str]| {
            match lines
                .iter()
                .find(|line| line.contains("rate limits only hold within this process"))
            {
                Some(line) if line.contains("WARN") => Ok(()),
                Some(line) => Err(format!("logged at the wrong level: {line}")),
                None => Err("per-process warning not logged".to_string()),
            }
        });
    }
}
