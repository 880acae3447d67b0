// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook authentication.
//!
//! `POST /webhook` carries `X-Hub-Signature-256: sha256=<hex>`, an
//! HMAC-SHA256 of the raw body keyed by the app secret. The middleware
//! buffers the body, checks the signature and hands the same bytes on to the
//! handler. When no app secret is configured every delivery is rejected
//! (fail-closed).

use std::sync::Arc;

use axum::{
    Json,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use wagate_whatsapp::{SIGNATURE_HEADER, verify_signature};

use crate::error::ErrorResponse;

/// Largest webhook body the gateway buffers.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 1024 * 1024;

/// Secrets shared with the provider for webhook handshakes and signatures.
#[derive(Clone, Default)]
pub struct WebhookSecrets {
    /// Token the provider echoes during the verification handshake.
    pub verify_token: Option<Arc<str>>,
    /// HMAC key for event signatures.
    pub app_secret: Option<Arc<str>>,
}

impl WebhookSecrets {
    pub fn new(verify_token: Option<String>, app_secret: Option<String>) -> Self {
        Self {
            verify_token: verify_token.filter(|t| !t.is_empty()).map(Arc::from),
            app_secret: app_secret.filter(|s| !s.is_empty()).map(Arc::from),
        }
    }

    /// Constant-time comparison against the configured verify token.
    /// Always false when no token is configured.
    pub fn verify_token_matches(&self, candidate: &str) -> bool {
        match &self.verify_token {
            Some(expected) => bool::from(expected.as_bytes().ct_eq(candidate.as_bytes())),
            None => false,
        }
    }
}

impl std::fmt::Debug for WebhookSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookSecrets")
            .field("verify_token", &self.verify_token.as_ref().map(|_| "[redacted]"))
            .field("app_secret", &self.app_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn unauthorized(reason: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(format!("webhook signature invalid: {reason}"))),
    )
        .into_response()
}

/// Middleware that rejects webhook deliveries whose signature does not match
/// the raw request body.
pub async fn signature_middleware(
    State(secrets): State<WebhookSecrets>,
    request: Request,
    next: Next,
) -> Response {
    let Some(secret) = secrets.app_secret.clone() else {
        tracing::error!("webhook app secret not configured -- rejecting delivery");
        return unauthorized("no app secret configured");
    };

    let (parts, body) = request.into_parts();

    let header = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let Some(header) = header else {
        tracing::warn!("webhook delivery without signature header");
        return unauthorized("missing header");
    };

    let bytes = match to_bytes(body, MAX_WEBHOOK_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "failed to buffer webhook body");
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorResponse::new("webhook body too large")),
            )
                .into_response();
        }
    };

    if !verify_signature(secret.as_bytes(), &bytes, header.trim()) {
        tracing::warn!(body_len = bytes.len(), "webhook signature mismatch");
        return unauthorized("mismatch");
    }

    let request = Request::from_parts(parts, Body::from(bytes));
    next.run(request).await
}
