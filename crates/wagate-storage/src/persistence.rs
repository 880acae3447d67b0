// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact, conversation-window and message bookkeeping.
//!
//! Every persisted message goes through [`Persistence`]: the contact is
//! upserted, the open conversation is found (or created) and its window is
//! pushed to `now + window`, then the message row is appended.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use wagate_core::{
    Clock, Conversation, Direction, GatewayError, InboundText, Message, MessageKind,
    MessageStatus, OutboundRecord, StatusUpdate, StorageAdapter,
};

/// Conversation-aware message persistence.
#[derive(Clone)]
pub struct Persistence {
    storage: Arc<dyn StorageAdapter>,
    clock: Arc<dyn Clock>,
    window: Duration,
}

impl Persistence {
    /// `window_minutes` is the conversation window length.
    pub fn new(storage: Arc<dyn StorageAdapter>, clock: Arc<dyn Clock>, window_minutes: i64) -> Self {
        Self {
            storage,
            clock,
            window: Duration::minutes(window_minutes),
        }
    }

    /// The underlying storage adapter.
    pub fn storage(&self) -> &Arc<dyn StorageAdapter> {
        &self.storage
    }

    /// Return the contact's open conversation with its window bumped, or
    /// open a new one when none is open.
    pub async fn ensure_conversation(&self, contact_id: &str) -> Result<Conversation, GatewayError> {
        let now = self.clock.now();
        let expires = now + self.window;

        if let Some(mut open) = self.storage.find_open_conversation(contact_id, now).await? {
            self.storage.extend_conversation(&open.id, expires).await?;
            open.window_expires_at = expires;
            return Ok(open);
        }

        let conversation = Conversation {
            id: uuid::Uuid::new_v4().to_string(),
            contact_id: contact_id.to_string(),
            window_expires_at: expires,
            created_at: now,
        };
        self.storage.create_conversation(&conversation).await?;
        debug!(
            contact_id,
            conversation_id = %conversation.id,
            window_expires_at = %conversation.window_expires_at,
            "conversation opened"
        );
        Ok(conversation)
    }

    /// Record an inbound text message. Inbound rows are stored as `delivered`.
    pub async fn persist_inbound(&self, inbound: &InboundText) -> Result<Message, GatewayError> {
        let contact = self.storage.upsert_contact(&inbound.from, self.clock.now()).await?;
        let conversation = self.ensure_conversation(&contact.id).await?;
        let now = self.clock.now();

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation.id,
            direction: Direction::Inbound,
            kind: MessageKind::Text,
            body: inbound.body.clone(),
            template_name: None,
            status: MessageStatus::Delivered,
            wa_message_id: None,
            error_code: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_message(&message).await?;
        info!(from = %inbound.from, message_id = %message.id, "inbound message stored");
        Ok(message)
    }

    /// Record an outbound message the provider has accepted.
    pub async fn persist_outbound(&self, record: &OutboundRecord) -> Result<Message, GatewayError> {
        let contact = self.storage.upsert_contact(&record.to, self.clock.now()).await?;
        let conversation = self.ensure_conversation(&contact.id).await?;
        let now = self.clock.now();

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation.id,
            direction: Direction::Outbound,
            kind: record.kind,
            body: record.body.clone(),
            template_name: record.template_name.clone(),
            status: MessageStatus::Sent,
            wa_message_id: Some(record.wa_message_id.clone()),
            error_code: None,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_message(&message).await?;
        debug!(
            to = %record.to,
            wa_message_id = %record.wa_message_id,
            "outbound message stored"
        );
        Ok(message)
    }

    /// Apply a delivery receipt. Returns `false` for unknown provider ids.
    pub async fn apply_status(&self, update: &StatusUpdate) -> Result<bool, GatewayError> {
        let matched = self
            .storage
            .update_message_status(
                &update.wa_message_id,
                update.status,
                update.error_code.as_deref(),
                self.clock.now(),
            )
            .await?;
        if !matched {
            debug!(wa_message_id = %update.wa_message_id, "status for unknown message ignored");
        }
        Ok(matched)
    }
}
