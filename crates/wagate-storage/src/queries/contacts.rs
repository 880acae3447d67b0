// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contact upsert and lookup.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use wagate_core::clock::format_timestamp;
use wagate_core::{Contact, GatewayError};

use super::{string_list_col, timestamp_col};
use crate::database::Database;

const CONTACT_COLUMNS: &str = "id, wa_id, tags, opt_in, created_at, updated_at";

fn row_to_contact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        wa_id: row.get(1)?,
        tags: string_list_col(row, 2)?,
        opt_in: row.get(3)?,
        created_at: timestamp_col(row, 4)?,
        updated_at: timestamp_col(row, 5)?,
    })
}

/// Insert the contact if `wa_id` is new, otherwise bump `updated_at`.
///
/// Idempotent on `wa_id`: tags, consent and `created_at` of an existing
/// contact are left untouched.
pub async fn upsert_contact(
    db: &Database,
    wa_id: &str,
    now: DateTime<Utc>,
) -> Result<Contact, GatewayError> {
    let wa_id = wa_id.to_string();
    let id = uuid::Uuid::new_v4().to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO contacts (id, wa_id, tags, opt_in, created_at, updated_at)
                 VALUES (?1, ?2, '[]', 0, ?3, ?3)
                 ON CONFLICT(wa_id) DO UPDATE SET updated_at = excluded.updated_at",
                params![id, wa_id, now],
            )?;
            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE wa_id = ?1"),
                params![wa_id],
                row_to_contact,
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a contact by provider identifier.
pub async fn get_contact_by_wa_id(
    db: &Database,
    wa_id: &str,
) -> Result<Option<Contact>, GatewayError> {
    let wa_id = wa_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE wa_id = ?1"),
                params![wa_id],
                row_to_contact,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
