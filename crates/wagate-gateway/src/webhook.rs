// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider webhook endpoints.
//!
//! `GET /webhook` answers the subscription handshake. `POST /webhook`
//! receives event deliveries that already passed
//! [`signature_middleware`](crate::signature::signature_middleware): the first
//! inbound text message is persisted and every delivery receipt is applied.
//! Redelivered events are stored again; there is no deduplication.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use wagate_metrics::recording;
use wagate_whatsapp::{WebhookPayload, first_inbound_text, status_updates};

use crate::error::{ApiError, parse_json};
use crate::server::AppState;

/// Query parameters of the verification handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

/// GET /webhook
///
/// Echoes `hub.challenge` when `hub.verify_token` matches the configured
/// token, 403 otherwise.
pub async fn verify_handshake(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let token = query.verify_token.as_deref().unwrap_or("");
    if state.secrets.verify_token_matches(token) {
        tracing::info!(mode = ?query.mode, "webhook verification accepted");
        return (StatusCode::OK, query.challenge.unwrap_or_default()).into_response();
    }
    tracing::warn!(mode = ?query.mode, "webhook verification rejected");
    StatusCode::FORBIDDEN.into_response()
}

/// POST /webhook
pub async fn receive_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let payload: WebhookPayload = parse_json(&body)?;

    if let Some(inbound) = first_inbound_text(&payload) {
        state.persistence.persist_inbound(&inbound).await?;
        recording::record_inbound();
    } else {
        tracing::debug!("webhook delivery without inbound text");
    }

    for update in status_updates(&payload) {
        if state.persistence.apply_status(&update).await? {
            state.metrics.record_status(update.status);
            tracing::debug!(
                wa_message_id = %update.wa_message_id,
                status = %update.status,
                "delivery receipt applied"
            );
        }
    }

    Ok(StatusCode::OK)
}
