// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the WhatsApp Cloud API send endpoint.
//!
//! One call is one POST; retries are the dispatcher's concern, never the
//! client's.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};
use wagate_config::model::WhatsAppConfig;
use wagate_core::{
    AdapterType, GatewayError, HealthStatus, MessageSender, OutboundContent, PluginAdapter,
    SendReceipt,
};

use crate::types::{SendMessageRequest, SendMessageResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Sender backed by the Graph API.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    messages_url: String,
}

impl WhatsAppClient {
    /// Build a client from the `[whatsapp]` section.
    ///
    /// Fails with [`GatewayError::Config`] when the token or phone number id
    /// is missing.
    pub fn new(config: &WhatsAppConfig) -> Result<Self, GatewayError> {
        let token = config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| GatewayError::Config("whatsapp.token is required".into()))?;
        let phone_number_id = config
            .phone_number_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GatewayError::Config("whatsapp.phone_number_id is required".into()))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
            GatewayError::Config(format!("invalid WhatsApp token header value: {e}"))
        })?;
        auth.set_sensitive(true);
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let messages_url = format!(
            "{}/{}/{}/messages",
            config.api_base_url.trim_end_matches('/'),
            config.graph_version,
            phone_number_id
        );

        Ok(Self {
            client,
            messages_url,
        })
    }

    /// Endpoint every send posts to.
    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }

    async fn post(&self, request: &SendMessageRequest) -> Result<SendReceipt, GatewayError> {
        let response = self
            .client
            .post(&self.messages_url)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Provider {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "send response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "provider rejected send");
            return Err(GatewayError::ProviderSend {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| GatewayError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        let parsed: SendMessageResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Provider {
                message: format!("failed to parse send response: {e}"),
                source: Some(Box::new(e)),
            })?;

        parsed
            .messages
            .into_iter()
            .next()
            .map(|m| SendReceipt { wa_message_id: m.id })
            .ok_or_else(|| GatewayError::Provider {
                message: "send response contained no message id".into(),
                source: None,
            })
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Sender
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send_message(
        &self,
        to: &str,
        content: &OutboundContent,
    ) -> Result<SendReceipt, GatewayError> {
        self.post(&SendMessageRequest::new(to, content)).await
    }
}
