// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping from [`GatewayError`] to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use wagate_core::GatewayError;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// A handler error rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        status_for(&self.0)
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

/// HTTP status for an error surfaced by a handler.
pub fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
        GatewayError::SignatureInvalid => StatusCode::UNAUTHORIZED,
        GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
        GatewayError::Conflict(_)
        | GatewayError::InvalidTransition { .. }
        | GatewayError::TemplateNotApproved { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the log.
        let message = if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
            "internal server error".to_string()
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// Decode a JSON request body, reporting malformed input as a validation error.
pub fn parse_json<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|e| ApiError(GatewayError::Validation(format!("invalid JSON body: {e}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wagate_core::TemplateStatus;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            status_for(&GatewayError::Validation("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&GatewayError::SignatureInvalid),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&GatewayError::NotFound {
                entity: "template",
                key: "welcome".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&GatewayError::InvalidTransition {
                id: "t".into(),
                from: TemplateStatus::Approved,
                to: TemplateStatus::Rejected,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&GatewayError::Conflict("dup".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&GatewayError::storage(std::io::Error::other("disk"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn parse_json_rejects_malformed_body_as_validation() {
        let err = parse_json::<serde_json::Value>(b"{not json").unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response =
            ApiError(GatewayError::storage(std::io::Error::other("disk on fire"))).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "internal server error");
    }

    #[test]
    fn error_response_serializes() {
        let json = serde_json::to_string(&ErrorResponse::new("something went wrong")).unwrap();
        assert_eq!(json, r#"{"error":"something went wrong"}"#);
    }
}
