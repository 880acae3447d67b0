// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring the dispatch stack over a temp database.
//!
//! `TestHarness` owns a temp SQLite file, a [`MockSender`], an in-memory
//! counter store and a [`ManualClock`], and exposes the same
//! [`Dispatcher`], [`Persistence`] and [`TemplateLifecycle`] the server uses.

use std::sync::Arc;

use chrono::Duration;
use wagate_config::model::StorageConfig;
use wagate_core::{
    Clock, Contact, Conversation, CounterStore, GatewayError, Message, StorageAdapter, Template,
};
use wagate_dispatch::{Dispatcher, MemoryCounterStore, RateLimiter};
use wagate_metrics::MetricsRegistry;
use wagate_storage::{Persistence, SqliteStorage, TemplateLifecycle};

use crate::call_log::CallLog;
use crate::clock::ManualClock;
use crate::mock_sender::MockSender;
use crate::spy::{SpyCounterStore, SpyStorage};

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    per_minute: u32,
    window_minutes: i64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            per_minute: 20,
            window_minutes: 1440,
        }
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.per_minute = per_minute;
        self
    }

    pub fn with_window_minutes(mut self, minutes: i64) -> Self {
        self.window_minutes = minutes;
        self
    }

    pub async fn build(self) -> Result<TestHarness, GatewayError> {
        let temp_dir = tempfile::TempDir::new().map_err(GatewayError::storage)?;
        let db_path = temp_dir.path().join("wagate-test.db");

        let sqlite = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        sqlite.initialize().await?;

        let log = CallLog::new();
        let spy = Arc::new(SpyStorage::new(Arc::new(sqlite), log.clone()));
        let storage: Arc<dyn StorageAdapter> = spy.clone();

        let clock = Arc::new(ManualClock::starting_now());
        let domain_clock: Arc<dyn Clock> = clock.clone();
        let counter: Arc<dyn CounterStore> = Arc::new(SpyCounterStore::new(
            Arc::new(MemoryCounterStore::new()),
            log.clone(),
        ));
        let sender = Arc::new(MockSender::with_log(log.clone()));
        let metrics = Arc::new(MetricsRegistry::new());

        let persistence = Persistence::new(storage.clone(), domain_clock.clone(), self.window_minutes);
        let templates = TemplateLifecycle::new(storage.clone(), domain_clock.clone());
        let dispatcher = Dispatcher::new(
            RateLimiter::new(counter, domain_clock, self.per_minute),
            sender.clone(),
            templates.clone(),
            persistence.clone(),
            metrics.clone(),
        );

        Ok(TestHarness {
            log,
            spy,
            storage,
            clock,
            sender,
            metrics,
            persistence,
            templates,
            dispatcher: Arc::new(dispatcher),
            window: Duration::minutes(self.window_minutes),
            _temp_dir: temp_dir,
        })
    }
}

/// A wired dispatch stack for tests.
pub struct TestHarness {
    pub log: CallLog,
    pub spy: Arc<SpyStorage>,
    pub storage: Arc<dyn StorageAdapter>,
    pub clock: Arc<ManualClock>,
    pub sender: Arc<MockSender>,
    pub metrics: Arc<MetricsRegistry>,
    pub persistence: Persistence,
    pub templates: TemplateLifecycle,
    pub dispatcher: Arc<Dispatcher>,
    pub window: Duration,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with default limits.
    pub async fn new() -> Result<Self, GatewayError> {
        Self::builder().build().await
    }

    pub async fn contact(&self, wa_id: &str) -> Result<Option<Contact>, GatewayError> {
        self.storage.get_contact_by_wa_id(wa_id).await
    }

    /// Conversations for `wa_id`, oldest first. Empty for unknown contacts.
    pub async fn conversations(&self, wa_id: &str) -> Result<Vec<Conversation>, GatewayError> {
        match self.contact(wa_id).await? {
            Some(contact) => self.storage.list_conversations(&contact.id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Every message exchanged with `wa_id`, in conversation then insertion order.
    pub async fn messages(&self, wa_id: &str) -> Result<Vec<Message>, GatewayError> {
        let mut all = Vec::new();
        for conversation in self.conversations(wa_id).await? {
            all.extend(self.storage.list_messages(&conversation.id).await?);
        }
        Ok(all)
    }

    /// Create and approve a template in one step.
    pub async fn approved_template(&self, name: &str) -> Result<Template, GatewayError> {
        let created = self.templates.create(crate::fixtures::new_template(name)).await?;
        self.templates.approve(&created.id).await
    }
}
