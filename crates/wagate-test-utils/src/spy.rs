// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pass-through adapters that log each call into a [`CallLog`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wagate_core::{
    AdapterType, Contact, Conversation, CounterStore, GatewayError, HealthStatus, Message,
    MessageStatus, PluginAdapter, StorageAdapter, Template, TemplateFilter, TemplateStatus,
};

use crate::call_log::CallLog;

/// Storage wrapper recording every call by method name.
pub struct SpyStorage {
    inner: Arc<dyn StorageAdapter>,
    log: CallLog,
    fail_message_inserts: AtomicBool,
}

impl SpyStorage {
    pub fn new(inner: Arc<dyn StorageAdapter>, log: CallLog) -> Self {
        Self {
            inner,
            log,
            fail_message_inserts: AtomicBool::new(false),
        }
    }

    /// Make `insert_message` fail until turned off again.
    pub fn fail_message_inserts(&self, fail: bool) {
        self.fail_message_inserts.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PluginAdapter for SpyStorage {
    fn name(&self) -> &str {
        "spy-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl StorageAdapter for SpyStorage {
    async fn initialize(&self) -> Result<(), GatewayError> {
        self.inner.initialize().await
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.inner.close().await
    }

    async fn upsert_contact(&self, wa_id: &str, now: DateTime<Utc>) -> Result<Contact, GatewayError> {
        self.log.record("upsert_contact");
        self.inner.upsert_contact(wa_id, now).await
    }

    async fn get_contact_by_wa_id(&self, wa_id: &str) -> Result<Option<Contact>, GatewayError> {
        self.inner.get_contact_by_wa_id(wa_id).await
    }

    async fn find_open_conversation(
        &self,
        contact_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Conversation>, GatewayError> {
        self.log.record("find_open_conversation");
        self.inner.find_open_conversation(contact_id, now).await
    }

    async fn create_conversation(&self, conversation: &Conversation) -> Result<(), GatewayError> {
        self.log.record("create_conversation");
        self.inner.create_conversation(conversation).await
    }

    async fn extend_conversation(
        &self,
        id: &str,
        window_expires_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        self.log.record("extend_conversation");
        self.inner.extend_conversation(id, window_expires_at).await
    }

    async fn list_conversations(&self, contact_id: &str) -> Result<Vec<Conversation>, GatewayError> {
        self.inner.list_conversations(contact_id).await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), GatewayError> {
        self.log.record("insert_message");
        if self.fail_message_inserts.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage {
                source: "injected insert failure".into(),
            });
        }
        self.inner.insert_message(message).await
    }

    async fn update_message_status(
        &self,
        wa_message_id: &str,
        status: MessageStatus,
        error_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        self.log.record("update_message_status");
        self.inner
            .update_message_status(wa_message_id, status, error_code, now)
            .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, GatewayError> {
        self.inner.list_messages(conversation_id).await
    }

    async fn insert_template(&self, template: &Template) -> Result<(), GatewayError> {
        self.log.record("insert_template");
        self.inner.insert_template(template).await
    }

    async fn list_templates(&self, filter: &TemplateFilter) -> Result<Vec<Template>, GatewayError> {
        self.inner.list_templates(filter).await
    }

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, GatewayError> {
        self.log.record("get_template_by_name");
        self.inner.get_template_by_name(name).await
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, GatewayError> {
        self.inner.get_template(id).await
    }

    async fn transition_template_status(
        &self,
        id: &str,
        to: TemplateStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        self.log.record("transition_template_status");
        self.inner.transition_template_status(id, to, now).await
    }
}

/// Counter store wrapper recording each increment as `"rate_limit"`.
pub struct SpyCounterStore {
    inner: Arc<dyn CounterStore>,
    log: CallLog,
}

impl SpyCounterStore {
    pub fn new(inner: Arc<dyn CounterStore>, log: CallLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl PluginAdapter for SpyCounterStore {
    fn name(&self) -> &str {
        "spy-counter"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CounterStore
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl CounterStore for SpyCounterStore {
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64, GatewayError> {
        self.log.record("rate_limit");
        self.inner.incr_with_expiry(key, ttl).await
    }
}
