// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use wagate_core::{GatewayError, StorageAdapter};
use wagate_dispatch::DeliveryQueue;
use wagate_metrics::MetricsRegistry;
use wagate_storage::{Persistence, TemplateLifecycle};

use crate::handlers;
use crate::messages;
use crate::signature::{WebhookSecrets, signature_middleware};
use crate::templates;
use crate::webhook;

/// Health state for the unauthenticated health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Storage backend probed by `/health`.
    pub storage: Arc<dyn StorageAdapter>,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Contact, conversation and message persistence.
    pub persistence: Persistence,
    /// Template catalogue and review transitions.
    pub templates: TemplateLifecycle,
    /// Outbound delivery queue selected at startup.
    pub queue: Arc<dyn DeliveryQueue>,
    /// In-process delivery counters.
    pub metrics: Arc<MetricsRegistry>,
    /// Webhook verify token and signing secret.
    pub secrets: WebhookSecrets,
    /// Health state for unauthenticated endpoints.
    pub health: HealthState,
}

/// Listener address for the gateway.
#[derive(Debug, Clone)]
pub struct ListenConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl From<&wagate_config::model::ServerConfig> for ListenConfig {
    fn from(config: &wagate_config::model::ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Build the gateway router.
///
/// - GET /webhook (verification handshake)
/// - POST /webhook (signature checked by middleware)
/// - /api/templates CRUD and review transitions
/// - POST /api/messages
/// - GET /health, /metrics, /api/metrics
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_prometheus_metrics))
        .route("/api/metrics", get(handlers::get_metrics_snapshot))
        .route("/webhook", get(webhook::verify_handshake))
        .with_state(state.clone());

    // Signature is checked on the raw bytes before the handler parses anything.
    let webhook_routes = Router::new()
        .route("/webhook", post(webhook::receive_event))
        .route_layer(axum_middleware::from_fn_with_state(
            state.secrets.clone(),
            signature_middleware,
        ))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route(
            "/api/templates",
            post(templates::create_template).get(templates::list_templates),
        )
        .route("/api/templates/{template}", get(templates::get_template))
        .route(
            "/api/templates/{template}/approve",
            patch(templates::approve_template),
        )
        .route(
            "/api/templates/{template}/reject",
            patch(templates::reject_template),
        )
        .route("/api/messages", post(messages::post_message))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(webhook_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP server and serve until `cancel` fires.
pub async fn start_server(
    config: &ListenConfig,
    state: AppState,
    cancel: CancellationToken,
) -> Result<(), GatewayError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| GatewayError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| GatewayError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway server stopped");
    Ok(())
}
