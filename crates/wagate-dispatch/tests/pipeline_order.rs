// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordering guarantees of the send-and-persist pipeline.

use wagate_core::{
    Direction, GatewayError, MessageKind, MessageStatus, OutboundContent, OutboundRequest,
};
use wagate_dispatch::SendPipeline;
use wagate_test_utils::TestHarness;

const TO: &str = "15550001111";

#[tokio::test]
async fn rate_limit_failure_never_reaches_the_sender() {
    let harness = TestHarness::builder().with_rate_limit(0).build().await.unwrap();

    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::text(TO, "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::RateLimitExceeded { limit: 0, .. }));
    assert_eq!(harness.log.entries(), vec!["rate_limit"]);
    assert_eq!(harness.sender.call_count(), 0);
}

#[tokio::test]
async fn send_failure_is_never_persisted() {
    let harness = TestHarness::new().await.unwrap();
    harness.sender.fail_next(1, 500);

    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::text(TO, "hi"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ProviderSend { status: 500, .. }));
    assert_eq!(harness.log.entries(), vec!["rate_limit", "send"]);
    assert!(harness.contact(TO).await.unwrap().is_none());

    let snap = harness.metrics.snapshot();
    assert_eq!(snap.failed, 1);
    assert_eq!(snap.sent, 0);
}

#[tokio::test]
async fn success_runs_rate_limit_send_then_persist() {
    let harness = TestHarness::new().await.unwrap();
    harness.sender.accept_with_id("wamid.OK");

    let id = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::text(TO, "hello there"))
        .await
        .unwrap();
    assert_eq!(id, "wamid.OK");

    let log = harness.log.clone();
    let rate = log.position("rate_limit").unwrap();
    let send = log.position("send").unwrap();
    let upsert = log.position("upsert_contact").unwrap();
    let insert = log.position("insert_message").unwrap();
    assert!(rate < send && send < upsert && upsert < insert, "{:?}", log.entries());

    let messages = harness.messages(TO).await.unwrap();
    assert_eq!(messages.len(), 1);
    let msg = &messages[0];
    assert_eq!(msg.direction, Direction::Outbound);
    assert_eq!(msg.kind, MessageKind::Text);
    assert_eq!(msg.status, MessageStatus::Sent);
    assert_eq!(msg.wa_message_id.as_deref(), Some("wamid.OK"));
    assert_eq!(msg.body, "hello there");

    assert_eq!(harness.metrics.snapshot().sent, 1);
}

#[tokio::test]
async fn persistence_failure_after_send_is_sent_not_recorded() {
    let harness = TestHarness::new().await.unwrap();
    harness.sender.accept_with_id("wamid.LOST");
    harness.spy.fail_message_inserts(true);

    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::text(TO, "hi"))
        .await
        .unwrap_err();

    match &err {
        GatewayError::SentNotRecorded { wa_message_id, .. } => assert_eq!(wa_message_id, "wamid.LOST"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
    assert_eq!(harness.sender.call_count(), 1);
}

#[tokio::test]
async fn pending_template_is_refused_before_sending() {
    let harness = TestHarness::new().await.unwrap();
    harness
        .templates
        .create(wagate_test_utils::fixtures::new_template("order_ready"))
        .await
        .unwrap();

    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::template(TO, "order_ready", vec!["Ana".into()]))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::TemplateNotApproved { .. }));
    assert_eq!(harness.sender.call_count(), 0);
}

#[tokio::test]
async fn unknown_template_is_not_found() {
    let harness = TestHarness::new().await.unwrap();
    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::template(TO, "missing", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));
    assert_eq!(harness.sender.call_count(), 0);
}

#[tokio::test]
async fn approved_template_is_sent_and_rendered_body_recorded() {
    let harness = TestHarness::new().await.unwrap();
    harness.approved_template("order_ready").await.unwrap();

    harness
        .dispatcher
        .send_and_persist(&OutboundRequest::template(TO, "order_ready", vec!["Ana".into()]))
        .await
        .unwrap();

    let calls = harness.sender.calls();
    assert_eq!(
        calls[0].content,
        OutboundContent::Template {
            name: "order_ready".into(),
            language: "en_US".into(),
            parameters: vec!["Ana".into()],
        }
    );

    let messages = harness.messages(TO).await.unwrap();
    assert_eq!(messages[0].kind, MessageKind::Template);
    assert_eq!(messages[0].template_name.as_deref(), Some("order_ready"));
    assert_eq!(messages[0].body, "Hello Ana, your order is ready.");
}

#[tokio::test]
async fn wrong_variable_count_is_a_validation_error() {
    let harness = TestHarness::new().await.unwrap();
    harness.approved_template("order_ready").await.unwrap();

    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::template(TO, "order_ready", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
    assert_eq!(harness.sender.call_count(), 0);
}

#[tokio::test]
async fn invalid_request_touches_nothing() {
    let harness = TestHarness::new().await.unwrap();
    let err = harness
        .dispatcher
        .send_and_persist(&OutboundRequest::text("", "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Validation(_)));
    assert!(harness.log.entries().is_empty());
}

#[tokio::test]
async fn outbound_messages_share_the_open_conversation() {
    let harness = TestHarness::new().await.unwrap();
    for body in ["one", "two"] {
        harness
            .dispatcher
            .send_and_persist(&OutboundRequest::text(TO, body))
            .await
            .unwrap();
    }
    assert_eq!(harness.conversations(TO).await.unwrap().len(), 1);
    assert_eq!(harness.messages(TO).await.unwrap().len(), 2);
}
