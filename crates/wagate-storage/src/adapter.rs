// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use wagate_config::model::StorageConfig;
use wagate_core::{
    AdapterType, Contact, Conversation, GatewayError, HealthStatus, Message, MessageStatus,
    PluginAdapter, StorageAdapter, Template, TemplateFilter, TemplateStatus,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is opened on the first call to
/// [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, GatewayError> {
        self.db.get().ok_or_else(|| GatewayError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, GatewayError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), GatewayError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), GatewayError> {
        let db = Database::open_with_wal(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| GatewayError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), GatewayError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Contacts ---

    async fn upsert_contact(
        &self,
        wa_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Contact, GatewayError> {
        queries::contacts::upsert_contact(self.db()?, wa_id, now).await
    }

    async fn get_contact_by_wa_id(&self, wa_id: &str) -> Result<Option<Contact>, GatewayError> {
        queries::contacts::get_contact_by_wa_id(self.db()?, wa_id).await
    }

    // --- Conversations ---

    async fn find_open_conversation(
        &self,
        contact_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Conversation>, GatewayError> {
        queries::conversations::find_open_conversation(self.db()?, contact_id, now).await
    }

    async fn create_conversation(
        &self,
        conversation: &Conversation,
    ) -> Result<(), GatewayError> {
        queries::conversations::create_conversation(self.db()?, conversation).await
    }

    async fn extend_conversation(
        &self,
        id: &str,
        window_expires_at: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        queries::conversations::extend_conversation(self.db()?, id, window_expires_at).await
    }

    async fn list_conversations(
        &self,
        contact_id: &str,
    ) -> Result<Vec<Conversation>, GatewayError> {
        queries::conversations::list_conversations(self.db()?, contact_id).await
    }

    // --- Messages ---

    async fn insert_message(&self, message: &Message) -> Result<(), GatewayError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn update_message_status(
        &self,
        wa_message_id: &str,
        status: MessageStatus,
        error_code: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        queries::messages::update_message_status(self.db()?, wa_message_id, status, error_code, now)
            .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, GatewayError> {
        queries::messages::list_messages(self.db()?, conversation_id).await
    }

    // --- Templates ---

    async fn insert_template(&self, template: &Template) -> Result<(), GatewayError> {
        queries::templates::insert_template(self.db()?, template).await
    }

    async fn list_templates(
        &self,
        filter: &TemplateFilter,
    ) -> Result<Vec<Template>, GatewayError> {
        queries::templates::list_templates(self.db()?, filter).await
    }

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>, GatewayError> {
        queries::templates::get_template_by_name(self.db()?, name).await
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, GatewayError> {
        queries::templates::get_template(self.db()?, id).await
    }

    async fn transition_template_status(
        &self,
        id: &str,
        to: TemplateStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, GatewayError> {
        queries::templates::transition_template_status(self.db()?, id, to, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double_init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        storage.initialize().await.unwrap();
        assert!(db_path.exists(), "database file should be created");
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn health_check_requires_initialize() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("health.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));

        assert!(storage.health_check().await.is_err());
        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn queries_before_initialize_fail() {
        let storage = SqliteStorage::new(make_config("/nonexistent/never-opened.db"));
        let err = storage.upsert_contact("1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Storage { .. }));
    }

    #[tokio::test]
    async fn shutdown_checkpoints_after_writes() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("shutdown.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage.upsert_contact("1234567890", Utc::now()).await.unwrap();
        storage.shutdown().await.unwrap();
        storage.close().await.unwrap();
    }
}
