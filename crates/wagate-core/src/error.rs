// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the wagate messaging gateway.

use thiserror::Error;

use crate::types::TemplateStatus;

/// The primary error type used across all wagate adapters and services.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration errors (invalid TOML, missing required values, bad env overrides).
    #[error("configuration error: {0}")]
    Config(String),

    /// Webhook signature missing, malformed, or not matching the raw body.
    #[error("webhook signature invalid")]
    SignatureInvalid,

    /// Recipient exceeded the per-minute send budget.
    #[error("rate limit exceeded for {recipient} ({limit}/min)")]
    RateLimitExceeded { recipient: String, limit: u32 },

    /// The messaging provider answered with a non-2xx status.
    #[error("provider rejected send with HTTP {status}: {body}")]
    ProviderSend { status: u16, body: String },

    /// Transport or decoding failure talking to the provider.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence backend errors (connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider accepted the message but recording it failed.
    #[error("message {wa_message_id} was sent but could not be recorded: {source}")]
    SentNotRecorded {
        wa_message_id: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Shared counter store (rate-limit buckets) unavailable.
    #[error("counter store error: {source}")]
    CounterStore {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Managed queue send/receive/delete failure.
    #[error("queue error: {message}")]
    Queue {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Local retries exhausted for an outbound send.
    #[error("send permanently failed after {attempts} attempts: {last_error}")]
    PermanentSendFailure { attempts: u32, last_error: String },

    /// Input rejected before any side effect.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Uniqueness violation (e.g. duplicate template name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Template status change not allowed from its current status.
    #[error("template {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: TemplateStatus,
        to: TemplateStatus,
    },

    /// Dispatch refused a template that is not approved.
    #[error("template `{name}` is {status}, only approved templates can be sent")]
    TemplateNotApproved { name: String, status: TemplateStatus },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Wrap any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        GatewayError::Storage {
            source: Box::new(err),
        }
    }

    /// Whether the local retry queue should schedule another attempt.
    ///
    /// Rate-limit, provider and infrastructure failures are transient.
    /// Input problems and sent-but-unrecorded messages are not: retrying the
    /// latter would deliver the message twice.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimitExceeded { .. }
            | GatewayError::ProviderSend { .. }
            | GatewayError::Provider { .. }
            | GatewayError::Storage { .. }
            | GatewayError::CounterStore { .. }
            | GatewayError::Queue { .. }
            | GatewayError::Internal(_) => true,
            GatewayError::Config(_)
            | GatewayError::SignatureInvalid
            | GatewayError::SentNotRecorded { .. }
            | GatewayError::PermanentSendFailure { .. }
            | GatewayError::Validation(_)
            | GatewayError::NotFound { .. }
            | GatewayError::Conflict(_)
            | GatewayError::InvalidTransition { .. }
            | GatewayError::TemplateNotApproved { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_error_is_distinguishable_from_provider_failure() {
        let limited = GatewayError::RateLimitExceeded {
            recipient: "15550001111".into(),
            limit: 20,
        };
        let provider = GatewayError::ProviderSend {
            status: 500,
            body: "oops".into(),
        };
        assert!(matches!(limited, GatewayError::RateLimitExceeded { .. }));
        assert!(!matches!(provider, GatewayError::RateLimitExceeded { .. }));
        assert_eq!(
            limited.to_string(),
            "rate limit exceeded for 15550001111 (20/min)"
        );
    }

    #[test]
    fn provider_send_error_carries_status_and_body() {
        let err = GatewayError::ProviderSend {
            status: 401,
            body: r#"{"error":{"message":"bad token"}}"#.into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("bad token"));
    }

    #[test]
    fn retry_classification() {
        assert!(GatewayError::ProviderSend {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(GatewayError::RateLimitExceeded {
            recipient: "x".into(),
            limit: 1
        }
        .is_retryable());
        assert!(GatewayError::storage(std::io::Error::other("disk")).is_retryable());

        assert!(!GatewayError::Validation("empty".into()).is_retryable());
        assert!(!GatewayError::SentNotRecorded {
            wa_message_id: "wamid.1".into(),
            source: Box::new(std::io::Error::other("locked")),
        }
        .is_retryable());
        assert!(!GatewayError::TemplateNotApproved {
            name: "welcome".into(),
            status: TemplateStatus::Pending,
        }
        .is_retryable());
    }

    #[test]
    fn invalid_transition_message_names_statuses() {
        let err = GatewayError::InvalidTransition {
            id: "t-1".into(),
            from: TemplateStatus::Approved,
            to: TemplateStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "template t-1 cannot move from approved to rejected"
        );
    }
}
