// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message log operations.

use chrono::{DateTime, Utc};
use rusqlite::params;
use wagate_core::clock::format_timestamp;
use wagate_core::{GatewayError, Message, MessageStatus};

use super::{enum_col, timestamp_col};
use crate::database::Database;

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), GatewayError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, direction, type, body, template_name,
                                       status, wa_message_id, error_code, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    msg.id,
                    msg.conversation_id,
                    msg.direction.to_string(),
                    msg.kind.to_string(),
                    msg.body,
                    msg.template_name,
                    msg.status.to_string(),
                    msg.wa_message_id,
                    msg.error_code,
                    format_timestamp(msg.created_at),
                    format_timestamp(msg.updated_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a delivery receipt to the message carrying `wa_message_id`.
///
/// Returns `false` when no message matched. An absent `error_code` keeps
/// whatever code was recorded before.
pub async fn update_message_status(
    db: &Database,
    wa_message_id: &str,
    status: MessageStatus,
    error_code: Option<&str>,
    now: DateTime<Utc>,
) -> Result<bool, GatewayError> {
    let wa_message_id = wa_message_id.to_string();
    let error_code = error_code.map(str::to_string);
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages
                 SET status = ?2, error_code = COALESCE(?3, error_code), updated_at = ?4
                 WHERE wa_message_id = ?1",
                params![wa_message_id, status.to_string(), error_code, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Messages of a conversation in chronological order.
pub async fn list_messages(
    db: &Database,
    conversation_id: &str,
) -> Result<Vec<Message>, GatewayError> {
    let conversation_id = conversation_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, direction, type, body, template_name,
                        status, wa_message_id, error_code, created_at, updated_at
                 FROM messages WHERE conversation_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![conversation_id], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    conversation_id: row.get(1)?,
                    direction: enum_col(row, 2)?,
                    kind: enum_col(row, 3)?,
                    body: row.get(4)?,
                    template_name: row.get(5)?,
                    status: enum_col(row, 6)?,
                    wa_message_id: row.get(7)?,
                    error_code: row.get(8)?,
                    created_at: timestamp_col(row, 9)?,
                    updated_at: timestamp_col(row, 10)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
