// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of actionable items from webhook payloads.

use std::str::FromStr;

use tracing::debug;
use wagate_core::{InboundText, MessageStatus, StatusUpdate};

use crate::types::WebhookPayload;

/// The first inbound text message carrying both a sender and a body.
pub fn first_inbound_text(payload: &WebhookPayload) -> Option<InboundText> {
    payload
        .entry
        .iter()
        .flat_map(|entry| entry.changes.iter())
        .flat_map(|change| change.value.messages.iter())
        .find_map(|msg| {
            let from = msg.from.as_deref().filter(|f| !f.is_empty())?;
            let body = msg.text.as_ref()?.body.as_deref()?;
            Some(InboundText {
                from: from.to_string(),
                body: body.to_string(),
                wa_message_id: msg.id.clone(),
            })
        })
}

/// Every delivery receipt in the payload with a status the gateway tracks.
pub fn status_updates(payload: &WebhookPayload) -> Vec<StatusUpdate> {
    payload
        .entry
        .iter()
        .flat_map(|entry| entry.changes.iter())
        .flat_map(|change| change.value.statuses.iter())
        .filter_map(|entry| match MessageStatus::from_str(&entry.status) {
            Ok(status) => Some(StatusUpdate {
                wa_message_id: entry.id.clone(),
                status,
                error_code: entry.errors.first().and_then(|e| e.code_text()),
            }),
            Err(_) => {
                debug!(status = %entry.status, wa_message_id = %entry.id, "untracked status skipped");
                None
            }
        })
        .collect()
}
