// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound message intake.

use axum::{Json, body::Bytes, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use wagate_core::OutboundRequest;
use wagate_dispatch::pipeline::validate_request;

use crate::error::{ApiError, parse_json};
use crate::server::AppState;

/// Response body for POST /api/messages.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueuedResponse {
    pub status: String,
}

/// POST /api/messages
///
/// Validates the request and hands it to the delivery queue. The send itself
/// happens later; failures there surface in logs and metrics, not here.
pub async fn post_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<QueuedResponse>), ApiError> {
    let request: OutboundRequest = parse_json(&body)?;
    validate_request(&request)?;

    let to = request.to.clone();
    state.queue.enqueue_send(request).await?;
    tracing::info!(to = %to, mode = ?state.queue.mode(), "outbound message queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedResponse {
            status: "queued".to_string(),
        }),
    ))
}
