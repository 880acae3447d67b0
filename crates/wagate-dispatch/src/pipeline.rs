// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The send-and-persist pipeline.
//!
//! Order is fixed and each step short-circuits: validate, rate limit,
//! resolve template, send, persist, record metrics. A message is never
//! recorded as sent unless the provider accepted it, and the provider is
//! never called for a recipient over its limit.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use wagate_core::{
    GatewayError, MessageKind, MessageSender, OutboundContent, OutboundRecord, OutboundRequest,
};
use wagate_metrics::{MetricsRegistry, recording};
use wagate_storage::{Persistence, TemplateLifecycle, render};

use crate::rate_limit::RateLimiter;

/// Anything the queues can hand an outbound request to.
#[async_trait]
pub trait SendPipeline: Send + Sync + 'static {
    /// Deliver and record one request, returning the provider message id.
    async fn send_and_persist(&self, request: &OutboundRequest) -> Result<String, GatewayError>;
}

/// Resolved request, ready for the sender.
struct Prepared {
    content: OutboundContent,
    kind: MessageKind,
    body: String,
    template_name: Option<String>,
}

/// Production pipeline.
#[derive(Clone)]
pub struct Dispatcher {
    rate_limiter: RateLimiter,
    sender: Arc<dyn MessageSender>,
    templates: TemplateLifecycle,
    persistence: Persistence,
    metrics: Arc<MetricsRegistry>,
}

impl Dispatcher {
    pub fn new(
        rate_limiter: RateLimiter,
        sender: Arc<dyn MessageSender>,
        templates: TemplateLifecycle,
        persistence: Persistence,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            rate_limiter,
            sender,
            templates,
            persistence,
            metrics,
        }
    }

    async fn prepare(&self, request: &OutboundRequest) -> Result<Prepared, GatewayError> {
        match (&request.body, &request.template) {
            (Some(body), None) => Ok(Prepared {
                content: OutboundContent::Text { body: body.clone() },
                kind: MessageKind::Text,
                body: body.clone(),
                template_name: None,
            }),
            (None, Some(send)) => {
                let template = self.templates.resolve_approved(&send.name).await?;
                let body = render(&template, &send.variables)?;
                Ok(Prepared {
                    content: OutboundContent::Template {
                        name: template.name.clone(),
                        language: template.locale.clone(),
                        parameters: send.variables.clone(),
                    },
                    kind: MessageKind::Template,
                    body,
                    template_name: Some(template.name),
                })
            }
            _ => Err(GatewayError::Validation(
                "exactly one of `body` and `template` must be set".into(),
            )),
        }
    }
}

/// Checks that need no I/O.
pub fn validate_request(request: &OutboundRequest) -> Result<(), GatewayError> {
    if request.to.trim().is_empty() {
        return Err(GatewayError::Validation("recipient `to` must not be empty".into()));
    }
    match (&request.body, &request.template) {
        (Some(body), None) if body.is_empty() => {
            Err(GatewayError::Validation("message body must not be empty".into()))
        }
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(GatewayError::Validation(
            "exactly one of `body` and `template` must be set".into(),
        )),
    }
}

#[async_trait]
impl SendPipeline for Dispatcher {
    async fn send_and_persist(&self, request: &OutboundRequest) -> Result<String, GatewayError> {
        let started = Instant::now();
        validate_request(request)?;

        if let Err(e) = self.rate_limiter.enforce(&request.to).await {
            if matches!(e, GatewayError::RateLimitExceeded { .. }) {
                recording::record_rate_limited();
            }
            return Err(e);
        }

        let prepared = self.prepare(request).await?;

        let receipt = match self.sender.send_message(&request.to, &prepared.content).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(to = %request.to, error = %e, "outbound send failed");
                self.metrics.record_failed();
                return Err(e);
            }
        };

        let record = OutboundRecord {
            to: request.to.clone(),
            kind: prepared.kind,
            body: prepared.body,
            template_name: prepared.template_name,
            wa_message_id: receipt.wa_message_id.clone(),
        };
        if let Err(e) = self.persistence.persist_outbound(&record).await {
            error!(
                to = %request.to,
                wa_message_id = %receipt.wa_message_id,
                error = %e,
                "message sent but not recorded"
            );
            return Err(GatewayError::SentNotRecorded {
                wa_message_id: receipt.wa_message_id,
                source: Box::new(e),
            });
        }

        self.metrics.record_send(started.elapsed());
        debug!(
            to = %request.to,
            wa_message_id = %receipt.wa_message_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "outbound message delivered to provider"
        );
        Ok(receipt.wa_message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rules() {
        assert!(validate_request(&OutboundRequest::text("1", "hi")).is_ok());
        assert!(validate_request(&OutboundRequest::template("1", "welcome", vec![])).is_ok());

        assert!(validate_request(&OutboundRequest::text(" ", "hi")).is_err());
        assert!(validate_request(&OutboundRequest::text("1", "")).is_err());

        let neither = OutboundRequest {
            to: "1".into(),
            body: None,
            template: None,
        };
        assert!(matches!(validate_request(&neither), Err(GatewayError::Validation(_))));

        let mut both = OutboundRequest::text("1", "hi");
        both.template = OutboundRequest::template("1", "welcome", vec![]).template;
        assert!(matches!(validate_request(&both), Err(GatewayError::Validation(_))));
    }
}
