// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. `Database` wraps exactly one connection and every query module
//! goes through [`Database::connection`]. Do NOT open additional connections
//! for writes.

use tracing::debug;
use wagate_core::GatewayError;

/// Convert a tokio-rusqlite error into `GatewayError::Storage`.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> GatewayError {
    GatewayError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the gateway's SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` in WAL mode and run migrations.
    pub async fn open(path: &str) -> Result<Self, GatewayError> {
        Self::open_with_wal(path, true).await
    }

    /// Open the database, choosing the journal mode explicitly.
    pub async fn open_with_wal(path: &str, wal_mode: bool) -> Result<Self, GatewayError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(GatewayError::storage)?;
            }
        }

        // Migrations run on a short-lived blocking connection before the
        // long-lived writer is opened. journal_mode=WAL persists in the file.
        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), GatewayError> {
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(GatewayError::storage)?;
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode=WAL;")
                    .map_err(GatewayError::storage)?;
            }
            crate::migrations::run_migrations(&mut conn)
        })
        .await
        .map_err(|e| GatewayError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| GatewayError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys=ON;
                 PRAGMA busy_timeout=5000;
                 PRAGMA synchronous=NORMAL;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The single connection every query runs through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Flush the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), GatewayError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
