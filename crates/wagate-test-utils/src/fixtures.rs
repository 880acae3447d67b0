// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook payload builders and request signing.

use serde_json::{Value, json};
use wagate_core::{NewTemplate, TemplateCategory};

/// App secret the fixtures sign with.
pub const TEST_APP_SECRET: &str = "test-app-secret";

/// Verify token the fixtures expect.
pub const TEST_VERIFY_TOKEN: &str = "test-verify-token";

/// `X-Hub-Signature-256` value for `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    match wagate_whatsapp::compute_signature(secret.as_bytes(), body) {
        Ok(sig) => sig,
        Err(e) => panic!("signing fixture body failed: {e}"),
    }
}

/// A webhook delivery carrying one inbound text message.
pub fn inbound_text_event(from: &str, body: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {"display_phone_number": "15550000000", "phone_number_id": "PN123"},
                    "contacts": [{"profile": {"name": "Test"}, "wa_id": from}],
                    "messages": [{
                        "from": from,
                        "id": format!("wamid.in-{from}"),
                        "timestamp": "1700000000",
                        "type": "text",
                        "text": {"body": body}
                    }]
                }
            }]
        }]
    })
}

/// A webhook delivery carrying one delivery receipt.
pub fn status_event(wa_message_id: &str, status: &str) -> Value {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA_ID",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "statuses": [{
                        "id": wa_message_id,
                        "status": status,
                        "timestamp": "1700000001",
                        "recipient_id": "15550001111"
                    }]
                }
            }]
        }]
    })
}

/// A webhook delivery with nothing the gateway acts on.
pub fn empty_event() -> Value {
    json!({"object": "whatsapp_business_account", "entry": []})
}

/// A valid template definition with one variable.
pub fn new_template(name: &str) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        locale: "en_US".into(),
        category: TemplateCategory::Utility,
        body: "Hello {{1}}, your order is ready.".into(),
        variables: vec!["first_name".into()],
        status: None,
    }
}
