// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use tower::ServiceExt;
use wagate_config::QueueMode;
use wagate_core::{GatewayError, OutboundRequest};
use wagate_dispatch::DeliveryQueue;
use wagate_gateway::{AppState, HealthState, WebhookSecrets, build_router};
use wagate_test_utils::TestHarness;
use wagate_test_utils::fixtures::{TEST_APP_SECRET, TEST_VERIFY_TOKEN, sign};

/// Queue that only records what it was given.
#[derive(Default)]
pub struct RecordingQueue {
    pub requests: Mutex<Vec<OutboundRequest>>,
    pub fail: bool,
}

impl RecordingQueue {
    pub fn failing() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryQueue for RecordingQueue {
    async fn enqueue_send(&self, request: OutboundRequest) -> Result<(), GatewayError> {
        if self.fail {
            return Err(GatewayError::Queue {
                message: "queue unavailable".into(),
                source: None,
            });
        }
        self.requests.lock().unwrap().push(request);
        Ok(())
    }

    fn mode(&self) -> QueueMode {
        QueueMode::Local
    }

    async fn shutdown(&self) {}
}

pub fn test_secrets() -> WebhookSecrets {
    WebhookSecrets::new(
        Some(TEST_VERIFY_TOKEN.to_string()),
        Some(TEST_APP_SECRET.to_string()),
    )
}

pub fn state_with(
    harness: &TestHarness,
    queue: Arc<dyn DeliveryQueue>,
    secrets: WebhookSecrets,
) -> AppState {
    AppState {
        persistence: harness.persistence.clone(),
        templates: harness.templates.clone(),
        queue,
        metrics: harness.metrics.clone(),
        secrets,
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: harness.storage.clone(),
            prometheus_render: Some(Arc::new(|| "wagate_messages_sent_total 0\n".to_string())),
        },
    }
}

/// Router over `harness` with a [`RecordingQueue`] and the fixture secrets.
pub fn app(harness: &TestHarness) -> (Router, Arc<RecordingQueue>) {
    let queue = Arc::new(RecordingQueue::default());
    let router = build_router(state_with(harness, queue.clone(), test_secrets()));
    (router, queue)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// A signed `POST /webhook` request for `payload`.
pub fn signed_webhook(payload: &serde_json::Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).unwrap();
    let signature = sign(TEST_APP_SECRET, &body);
    Request::post("/webhook")
        .header("content-type", "application/json")
        .header("x-hub-signature-256", signature)
        .body(Body::from(body))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}
