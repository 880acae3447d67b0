// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests across the HTTP gateway, delivery queue, sender and storage.
//!
//! Each test creates an isolated TestHarness with temp SQLite and mock
//! adapters. Tests are independent and order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;
use wagate_config::model::WhatsAppConfig;
use wagate_core::{Clock, Direction, MessageKind, MessageStatus, OutboundRequest};
use wagate_dispatch::{
    DeliveryEvent, DeliveryQueue, DeliveryState, Dispatcher, LocalRetryQueue, MemoryCounterStore,
    RateLimiter, SendPipeline,
};
use wagate_gateway::{AppState, HealthState, WebhookSecrets, build_router};
use wagate_test_utils::TestHarness;
use wagate_test_utils::fixtures::{
    TEST_APP_SECRET, TEST_VERIFY_TOKEN, inbound_text_event, sign, status_event,
};
use wagate_whatsapp::WhatsAppClient;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(harness: &TestHarness, queue: Arc<dyn DeliveryQueue>) -> Router {
    build_router(AppState {
        persistence: harness.persistence.clone(),
        templates: harness.templates.clone(),
        queue,
        metrics: harness.metrics.clone(),
        secrets: WebhookSecrets::new(
            Some(TEST_VERIFY_TOKEN.to_string()),
            Some(TEST_APP_SECRET.to_string()),
        ),
        health: HealthState {
            start_time: std::time::Instant::now(),
            storage: harness.storage.clone(),
            prometheus_render: None,
        },
    })
}

fn signed(payload: &serde_json::Value) -> Request<Body> {
    let body = serde_json::to_vec(payload).unwrap();
    Request::post("/webhook")
        .header("x-hub-signature-256", sign(TEST_APP_SECRET, &body))
        .body(Body::from(body))
        .unwrap()
}

async fn wait_for_terminal(events: &mut broadcast::Receiver<DeliveryEvent>) -> DeliveryEvent {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let event = events.recv().await.unwrap();
            if event.state.is_terminal() {
                return event;
            }
        }
    })
    .await
    .expect("delivery did not finish")
}

// ---- Inbound webhook to stored conversation ----

#[tokio::test]
async fn inbound_text_from_new_contact_opens_conversation() {
    let harness = TestHarness::new().await.unwrap();
    let cancel = CancellationToken::new();
    let queue = Arc::new(LocalRetryQueue::spawn(harness.dispatcher.clone(), cancel.clone()));
    let app = gateway(&harness, queue);

    let response = app
        .oneshot(signed(&inbound_text_event("1234567890", "hello")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let contact = harness.contact("1234567890").await.unwrap().unwrap();
    assert_eq!(contact.wa_id, "1234567890");

    let conversations = harness.conversations("1234567890").await.unwrap();
    assert_eq!(conversations.len(), 1);
    let expected_expiry = harness.clock.now() + harness.window;
    assert_eq!(conversations[0].window_expires_at, expected_expiry);
    assert!(conversations[0].is_open_at(harness.clock.now()));

    let messages = harness.messages("1234567890").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].direction, Direction::Inbound);
    assert_eq!(messages[0].body, "hello");

    cancel.cancel();
}

#[tokio::test]
async fn inbound_after_window_expiry_opens_new_conversation() {
    let harness = TestHarness::builder().with_window_minutes(60).build().await.unwrap();
    let cancel = CancellationToken::new();
    let queue = Arc::new(LocalRetryQueue::spawn(harness.dispatcher.clone(), cancel.clone()));
    let app = gateway(&harness, queue);

    app.clone()
        .oneshot(signed(&inbound_text_event("15550009999", "first")))
        .await
        .unwrap();
    harness.clock.advance(chrono::Duration::minutes(30));
    app.clone()
        .oneshot(signed(&inbound_text_event("15550009999", "second")))
        .await
        .unwrap();
    assert_eq!(harness.conversations("15550009999").await.unwrap().len(), 1);

    harness.clock.advance(chrono::Duration::minutes(61));
    app.oneshot(signed(&inbound_text_event("15550009999", "third")))
        .await
        .unwrap();
    let conversations = harness.conversations("15550009999").await.unwrap();
    assert_eq!(conversations.len(), 2);

    cancel.cancel();
}

// ---- Outbound intake through the local queue, then a delivery receipt ----

#[tokio::test]
async fn queued_message_is_sent_persisted_and_acknowledged() {
    let harness = TestHarness::new().await.unwrap();
    harness.sender.accept_with_id("wamid.E2E1");
    let cancel = CancellationToken::new();
    let queue = Arc::new(LocalRetryQueue::spawn(harness.dispatcher.clone(), cancel.clone()));
    let mut events = queue.subscribe();
    let app = gateway(&harness, queue);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/messages")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"to": "15550001111", "body": "your order shipped"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let done = wait_for_terminal(&mut events).await;
    assert_eq!(done.state, DeliveryState::PersistedSent);
    assert_eq!(harness.sender.call_count(), 1);

    let messages = harness.messages("15550001111").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].direction, Direction::Outbound);
    assert_eq!(messages[0].status, MessageStatus::Sent);
    assert_eq!(messages[0].wa_message_id.as_deref(), Some("wamid.E2E1"));

    let response = app
        .oneshot(signed(&status_event("wamid.E2E1", "read")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let messages = harness.messages("15550001111").await.unwrap();
    assert_eq!(messages[0].status, MessageStatus::Read);
    let snapshot = harness.metrics.snapshot();
    assert_eq!(snapshot.sent, 1);
    assert_eq!(snapshot.read, 1);
    assert_eq!(snapshot.success_rate, "100.00");

    cancel.cancel();
}

#[tokio::test]
async fn queued_template_for_pending_template_fails_permanently() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .templates
        .create(wagate_test_utils::fixtures::new_template("order_ready"))
        .await
        .unwrap();
    let cancel = CancellationToken::new();
    let queue = Arc::new(LocalRetryQueue::spawn(harness.dispatcher.clone(), cancel.clone()));
    let mut events = queue.subscribe();

    queue
        .enqueue_send(OutboundRequest::template(
            "15550001111",
            "order_ready",
            vec!["Ana".into()],
        ))
        .await
        .unwrap();

    let done = wait_for_terminal(&mut events).await;
    assert_eq!(done.state, DeliveryState::PermanentlyFailed);
    assert_eq!(done.attempt, 0);
    assert_eq!(harness.sender.call_count(), 0);

    cancel.cancel();
}

// ---- Real provider client against a mock Graph API ----

#[tokio::test]
async fn approved_template_reaches_provider_with_parameters() {
    let harness = TestHarness::new().await.unwrap();
    harness.approved_template("order_ready").await.unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v19.0/PN123/messages"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "messaging_product": "whatsapp",
            "to": "15550005555",
            "type": "template",
            "template": {
                "name": "order_ready",
                "language": {"code": "en_US"},
                "components": [{
                    "type": "body",
                    "parameters": [{"type": "text", "text": "Ana"}]
                }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messaging_product": "whatsapp",
            "contacts": [{"input": "15550005555", "wa_id": "15550005555"}],
            "messages": [{"id": "wamid.GRAPH1"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = WhatsAppClient::new(&WhatsAppConfig {
        token: Some("test-token".into()),
        phone_number_id: Some("PN123".into()),
        graph_version: "v19.0".into(),
        api_base_url: server.uri(),
    })
    .unwrap();
    let clock: Arc<dyn Clock> = harness.clock.clone();
    let dispatcher = Dispatcher::new(
        RateLimiter::new(Arc::new(MemoryCounterStore::new()), clock, 20),
        Arc::new(client),
        harness.templates.clone(),
        harness.persistence.clone(),
        harness.metrics.clone(),
    );

    let wa_id = dispatcher
        .send_and_persist(&OutboundRequest::template(
            "15550005555",
            "order_ready",
            vec!["Ana".into()],
        ))
        .await
        .unwrap();
    assert_eq!(wa_id, "wamid.GRAPH1");

    let messages = harness.messages("15550005555").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Template);
    assert_eq!(messages[0].template_name.as_deref(), Some("order_ready"));
    assert_eq!(messages[0].body, "Hello Ana, your order is ready.");
}
