// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template, message intake, health and metrics endpoints.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use wagate_core::OutboundRequest;
use wagate_gateway::build_router;
use wagate_test_utils::TestHarness;

use common::{
    RecordingQueue, app, body_bytes, body_json, empty_request, json_request, send, state_with,
    test_secrets,
};

fn welcome_template() -> serde_json::Value {
    json!({
        "name": "order_ready",
        "locale": "en_US",
        "category": "utility",
        "body": "Hello {{1}}, your order is ready.",
        "variables": ["first_name"]
    })
}

#[tokio::test]
async fn create_forces_pending_status() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);

    let mut input = welcome_template();
    input["status"] = json!("approved");
    let response = send(&app, json_request("POST", "/api/templates", input)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    assert_eq!(created["status"], "pending");
    assert_eq!(created["name"], "order_ready");
    assert!(created["id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn create_rejects_invalid_and_duplicate_templates() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);

    let response = send(
        &app,
        json_request("POST", "/api/templates", json!({"name": "x"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_name = welcome_template();
    bad_name["name"] = json!("Order Ready");
    let response = send(&app, json_request("POST", "/api/templates", bad_name)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let response = send(&app, json_request("POST", "/api/templates", welcome_template())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let response = send(&app, json_request("POST", "/api/templates", welcome_template())).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_by_name_and_missing_template() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);
    send(&app, json_request("POST", "/api/templates", welcome_template())).await;

    let response = send(&app, empty_request("GET", "/api/templates/order_ready")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["body"], "Hello {{1}}, your order is ready.");

    let response = send(&app, empty_request("GET", "/api/templates/nope")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn approve_and_reject_only_from_pending() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);

    let created = body_json(send(&app, json_request("POST", "/api/templates", welcome_template())).await).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = send(&app, empty_request("PATCH", &format!("/api/templates/{id}/approve"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "approved");

    let response = send(&app, empty_request("PATCH", &format!("/api/templates/{id}/reject"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, empty_request("PATCH", &format!("/api/templates/{id}/approve"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, empty_request("PATCH", "/api/templates/missing-id/approve")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_filters_by_status_and_locale() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);

    let first = body_json(send(&app, json_request("POST", "/api/templates", welcome_template())).await).await;
    let mut spanish = welcome_template();
    spanish["name"] = json!("pedido_listo");
    spanish["locale"] = json!("es_ES");
    send(&app, json_request("POST", "/api/templates", spanish)).await;

    let id = first["id"].as_str().unwrap();
    send(&app, empty_request("PATCH", &format!("/api/templates/{id}/approve"))).await;

    let all = body_json(send(&app, empty_request("GET", "/api/templates")).await).await;
    let names: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["order_ready", "pedido_listo"]);

    let approved =
        body_json(send(&app, empty_request("GET", "/api/templates?status=approved")).await).await;
    assert_eq!(approved.as_array().unwrap().len(), 1);
    assert_eq!(approved[0]["name"], "order_ready");

    let spanish =
        body_json(send(&app, empty_request("GET", "/api/templates?locale=es_ES")).await).await;
    assert_eq!(spanish.as_array().unwrap().len(), 1);
    assert_eq!(spanish[0]["status"], "pending");

    let response = send(&app, empty_request("GET", "/api/templates?status=bogus")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn message_intake_queues_valid_requests() {
    let harness = TestHarness::new().await.unwrap();
    let (app, queue) = app(&harness);

    let response = send(
        &app,
        json_request("POST", "/api/messages", json!({"to": "15550001111", "body": "hi"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(body_json(response).await, json!({"status": "queued"}));

    let response = send(
        &app,
        json_request(
            "POST",
            "/api/messages",
            json!({"to": "15550001111", "template": {"name": "order_ready", "variables": ["Ana"]}}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    assert_eq!(
        queue.requests(),
        vec![
            OutboundRequest::text("15550001111", "hi"),
            OutboundRequest::template("15550001111", "order_ready", vec!["Ana".into()]),
        ]
    );
    // Intake never sends directly.
    assert_eq!(harness.sender.call_count(), 0);
}

#[tokio::test]
async fn message_intake_rejects_invalid_requests() {
    let harness = TestHarness::new().await.unwrap();
    let (app, queue) = app(&harness);

    for body in [
        json!({"to": "", "body": "hi"}),
        json!({"to": "15550001111"}),
        json!({"to": "15550001111", "body": "hi", "template": {"name": "t"}}),
        json!({"to": "15550001111", "body": ""}),
        json!({"body": "no recipient"}),
    ] {
        let response = send(&app, json_request("POST", "/api/messages", body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
    assert!(queue.requests().is_empty());
}

#[tokio::test]
async fn message_intake_reports_queue_failure() {
    let harness = TestHarness::new().await.unwrap();
    let app = build_router(state_with(
        &harness,
        Arc::new(RecordingQueue::failing()),
        test_secrets(),
    ));

    let response = send(
        &app,
        json_request("POST", "/api/messages", json!({"to": "15550001111", "body": "hi"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "internal server error");
}

#[tokio::test]
async fn health_reports_storage() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);

    let response = send(&app, empty_request("GET", "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = body_json(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["storage"], "healthy");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn metrics_endpoints_render_prometheus_and_snapshot() {
    let harness = TestHarness::new().await.unwrap();
    let (app, _) = app(&harness);
    harness.metrics.record_send(std::time::Duration::from_millis(120));
    harness.metrics.record_delivered();

    let response = send(&app, empty_request("GET", "/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("wagate_messages_sent_total"));

    let snapshot = body_json(send(&app, empty_request("GET", "/api/metrics")).await).await;
    assert_eq!(snapshot["sent"], 1);
    assert_eq!(snapshot["delivered"], 1);
    assert_eq!(snapshot["avgTimeMs"], 120.0);
    assert_eq!(snapshot["successRate"], "100.00");
}

#[tokio::test]
async fn prometheus_endpoint_is_not_found_without_exporter() {
    let harness = TestHarness::new().await.unwrap();
    let mut state = state_with(&harness, Arc::new(RecordingQueue::default()), test_secrets());
    state.health.prometheus_render = None;
    let app = build_router(state);

    let response = send(&app, empty_request("GET", "/metrics")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
