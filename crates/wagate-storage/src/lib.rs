// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the wagate gateway.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, typed queries for contacts,
//! conversations, messages and templates, and the two services built on top:
//! conversation-aware [`Persistence`] and the [`TemplateLifecycle`].

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod persistence;
pub mod queries;
pub mod templates;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use persistence::Persistence;
pub use templates::{render, TemplateLifecycle};
