// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the gateway crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Sender,
    CounterStore,
    Queue,
}

/// Direction of a persisted message relative to the gateway.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Content kind of a persisted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Text,
    Template,
}

/// Delivery status of a message, updated by provider receipts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

/// Approval status of a message template.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TemplateStatus {
    Pending,
    Approved,
    Rejected,
}

/// Provider template category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TemplateCategory {
    Marketing,
    Utility,
    Authentication,
}

/// An external identity known to the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    /// Provider-assigned identifier (phone number in international format).
    pub wa_id: String,
    pub tags: Vec<String>,
    pub opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A session window during which free-form messaging is allowed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub contact_id: String,
    pub window_expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// A conversation is open while its window lies in the future.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.window_expires_at > now
    }
}

/// A single inbound or outbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub body: String,
    pub template_name: Option<String>,
    pub status: MessageStatus,
    pub wa_message_id: Option<String>,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reusable, provider-reviewed outbound message pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    pub locale: String,
    pub category: TemplateCategory,
    pub body: String,
    /// Ordered placeholder names.
    pub variables: Vec<String>,
    pub status: TemplateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a template.
///
/// A `status` supplied by the caller is accepted for wire compatibility and
/// ignored: new templates always start out pending.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTemplate {
    pub name: String,
    pub locale: String,
    pub category: TemplateCategory,
    pub body: String,
    #[serde(default)]
    pub variables: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Optional filters for listing templates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub status: Option<TemplateStatus>,
}

/// Template reference inside an outbound request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSend {
    pub name: String,
    /// Positional values for the template's variables.
    #[serde(default)]
    pub variables: Vec<String>,
}

/// A request to deliver one outbound message.
///
/// Exactly one of `body` and `template` must be set. This is the payload that
/// travels through both queue modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateSend>,
}

impl OutboundRequest {
    /// Build a free-text request.
    pub fn text(to: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            body: Some(body.into()),
            template: None,
        }
    }

    /// Build a template request.
    pub fn template(to: impl Into<String>, name: impl Into<String>, variables: Vec<String>) -> Self {
        Self {
            to: to.into(),
            body: None,
            template: Some(TemplateSend {
                name: name.into(),
                variables,
            }),
        }
    }
}

/// What the sender puts on the wire, after template resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundContent {
    Text {
        body: String,
    },
    Template {
        name: String,
        language: String,
        parameters: Vec<String>,
    },
}

/// Result of a successful provider send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Provider-assigned message id.
    pub wa_message_id: String,
}

/// Outbound message to record after a successful send.
#[derive(Debug, Clone)]
pub struct OutboundRecord {
    pub to: String,
    pub kind: MessageKind,
    pub body: String,
    pub template_name: Option<String>,
    pub wa_message_id: String,
}

/// An inbound text message extracted from a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub from: String,
    pub body: String,
    pub wa_message_id: Option<String>,
}

/// A delivery receipt extracted from a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub wa_message_id: String,
    pub status: MessageStatus,
    pub error_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn enums_use_lowercase_wire_names() {
        assert_eq!(TemplateStatus::Pending.to_string(), "pending");
        assert_eq!(MessageStatus::from_str("delivered").unwrap(), MessageStatus::Delivered);
        assert_eq!(
            serde_json::to_string(&Direction::Inbound).unwrap(),
            "\"inbound\""
        );
        assert_eq!(
            serde_json::from_str::<TemplateCategory>("\"utility\"").unwrap(),
            TemplateCategory::Utility
        );
    }

    #[test]
    fn message_serializes_kind_as_type() {
        let now = Utc::now();
        let msg = Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            direction: Direction::Outbound,
            kind: MessageKind::Template,
            body: "hi".into(),
            template_name: Some("welcome".into()),
            status: MessageStatus::Sent,
            wa_message_id: Some("wamid.1".into()),
            error_code: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "template");
        assert_eq!(json["waMessageId"], "wamid.1");
        assert_eq!(json["conversationId"], "c1");
    }

    #[test]
    fn outbound_request_omits_absent_fields() {
        let req = OutboundRequest::text("15550001111", "hello");
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"to":"15550001111","body":"hello"}"#);

        let parsed: OutboundRequest =
            serde_json::from_str(r#"{"to":"1","template":{"name":"welcome"}}"#).unwrap();
        assert_eq!(parsed.template.unwrap().variables, Vec::<String>::new());
    }

    #[test]
    fn new_template_accepts_and_keeps_supplied_status() {
        let input: NewTemplate = serde_json::from_str(
            r#"{"name":"welcome","locale":"en_US","category":"utility","body":"Hi {{1}}","variables":["first_name"],"status":"approved"}"#,
        )
        .unwrap();
        assert_eq!(input.status.as_deref(), Some("approved"));
        assert_eq!(input.variables, vec!["first_name"]);
    }

    #[test]
    fn conversation_open_is_strictly_before_expiry() {
        let now = Utc::now();
        let conv = Conversation {
            id: "c".into(),
            contact_id: "k".into(),
            window_expires_at: now,
            created_at: now,
        };
        assert!(!conv.is_open_at(now));
        assert!(conv.is_open_at(now - chrono::Duration::seconds(1)));
    }
}
