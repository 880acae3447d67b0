// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GatewayError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Contact, Conversation, Message, MessageStatus, Template, TemplateFilter, TemplateStatus,
};

/// Adapter for storage and persistence backends.
///
/// Storage adapters own contacts, conversation windows, the message log and
/// the template catalogue. Higher-level rules (window bumping, template
/// validation) live in the services built on top of this trait.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), GatewayError>;

    /// Closes the storage backend, flushing pending writes and releasing connections.
    async fn close(&self) -> Result<(), GatewayError>;

    // --- Contacts ---

    /// Creates the contact if `wa_id` is unknown, otherwise touches `updated_at`.
    async fn upsert_contact(&self, wa_id: &str, now: DateTime<Utc>)
    -> Result<Contact, GatewayError>;

    async fn get_contact_by_wa_id(&self, wa_id: &str) -> Result<Option<Contact>, GatewayError>;

    // --- Conversations ---

    /// Most recently created conversation for the contact whose window is
    /// still open at `now`.
    async fn find_open_conversation(
        &self,
        contact_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Conversation>, GatewayError>;

    async fn create_conversation(&self, conversation: &Conversation)
    -> Result<(), GatewayError>;

    async fn extend_conversation(
        &self,
        id: &str,
        window_expires_at: DateTime<Utc>,
    ) -> Result<(), GatewayError>;

    /// All conversations for a contact, oldest first.
    async fn list_conversations(&self, contact_id: &str)
    -> Result<Vec<Conversation>, GatewayError>;

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), GatewayError>;

    /// Applies a delivery receipt. Returns `false` when no message carries
    /// `wa_message_id`.
    async fn update_message_status(
        &self,
        wa_message_id: &str,
        status: MessageStatus,
        error_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError>;

    /// Messages in a conversation, oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, GatewayError>;

    // --- Templates ---

    /// Inserts a template. A duplicate name yields [`GatewayError::Conflict`].
    async fn insert_template(&self, template: &Template) -> Result<(), GatewayError>;

    async fn list_templates(&self, filter: &TemplateFilter)
    -> Result<Vec<Template>, GatewayError>;

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, GatewayError>;

    async fn get_template(&self, id: &str) -> Result<Option<Template>, GatewayError>;

    /// Moves a pending template to `to` in one conditional update.
    ///
    /// Returns `false` when the template is missing or no longer pending;
    /// callers re-read the row to tell the two apart.
    async fn transition_template_status(
        &self,
        id: &str,
        to: TemplateStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError>;
}
