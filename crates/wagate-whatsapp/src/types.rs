// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response types for the WhatsApp Cloud API and its webhooks.

use serde::{Deserialize, Serialize};
use wagate_core::OutboundContent;

/// Body of `POST /{version}/{phone_number_id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub messaging_product: &'static str,
    pub recipient_type: &'static str,
    pub to: String,
    #[serde(flatten)]
    pub payload: MessagePayload,
}

impl SendMessageRequest {
    /// Build the wire request for one recipient.
    pub fn new(to: &str, content: &OutboundContent) -> Self {
        let payload = match content {
            OutboundContent::Text { body } => MessagePayload::Text {
                text: TextBody {
                    body: body.clone(),
                    preview_url: false,
                },
            },
            OutboundContent::Template {
                name,
                language,
                parameters,
            } => {
                let components = if parameters.is_empty() {
                    Vec::new()
                } else {
                    vec![TemplateComponent {
                        kind: "body",
                        parameters: parameters
                            .iter()
                            .map(|p| TemplateParameter {
                                kind: "text",
                                text: p.clone(),
                            })
                            .collect(),
                    }]
                };
                MessagePayload::Template {
                    template: TemplatePayload {
                        name: name.clone(),
                        language: Language {
                            code: language.clone(),
                        },
                        components,
                    },
                }
            }
        };
        Self {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: to.to_string(),
            payload,
        }
    }
}

/// Message content, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text { text: TextBody },
    Template { template: TemplatePayload },
}

#[derive(Debug, Clone, Serialize)]
pub struct TextBody {
    pub body: String,
    pub preview_url: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload {
    pub name: String,
    pub language: Language,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Language {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub parameters: Vec<TemplateParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateParameter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Successful send response.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub messages: Vec<SentMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

// --- Webhook payloads ---

/// Top-level webhook event body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub statuses: Vec<StatusEntry>,
}

/// One inbound message. Only text content is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<TextContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub body: Option<String>,
}

/// One delivery receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusEntry {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub recipient_id: Option<String>,
    #[serde(default)]
    pub errors: Vec<StatusError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusError {
    /// Numeric in practice; kept loose so a string code still parses.
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
}

impl StatusError {
    /// The error code rendered as text.
    pub fn code_text(&self) -> Option<String> {
        match self.code.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
