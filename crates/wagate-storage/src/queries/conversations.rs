// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation window rows.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use wagate_core::clock::format_timestamp;
use wagate_core::{Conversation, GatewayError};

use super::timestamp_col;
use crate::database::Database;

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        contact_id: row.get(1)?,
        window_expires_at: timestamp_col(row, 2)?,
        created_at: timestamp_col(row, 3)?,
    })
}

/// The newest conversation for `contact_id` still open at `now`.
///
/// If two processes raced and both created a window, the most recently
/// created one wins.
pub async fn find_open_conversation(
    db: &Database,
    contact_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Conversation>, GatewayError> {
    let contact_id = contact_id.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, contact_id, window_expires_at, created_at
                 FROM conversations
                 WHERE contact_id = ?1 AND window_expires_at > ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                params![contact_id, now],
                row_to_conversation,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Insert a new conversation row.
pub async fn create_conversation(
    db: &Database,
    conversation: &Conversation,
) -> Result<(), GatewayError> {
    let conv = conversation.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversations (id, contact_id, window_expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    conv.id,
                    conv.contact_id,
                    format_timestamp(conv.window_expires_at),
                    format_timestamp(conv.created_at),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a conversation's window end.
pub async fn extend_conversation(
    db: &Database,
    id: &str,
    window_expires_at: DateTime<Utc>,
) -> Result<(), GatewayError> {
    let id = id.to_string();
    let expires = format_timestamp(window_expires_at);
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE conversations SET window_expires_at = ?2 WHERE id = ?1",
                params![id, expires],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All conversations of a contact, oldest first.
pub async fn list_conversations(
    db: &Database,
    contact_id: &str,
) -> Result<Vec<Conversation>, GatewayError> {
    let contact_id = contact_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, contact_id, window_expires_at, created_at
                 FROM conversations WHERE contact_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![contact_id], row_to_conversation)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::contacts::upsert_contact;
    use crate::queries::test_support::open_temp_db;
    use chrono::Duration;

    fn conversation(id: &str, contact_id: &str, created: DateTime<Utc>, mins: i64) -> Conversation {
        Conversation {
            id: id.into(),
            contact_id: contact_id.into(),
            window_expires_at: created + Duration::minutes(mins),
            created_at: created,
        }
    }

    #[tokio::test]
    async fn open_lookup_respects_expiry() {
        let (db, _dir) = open_temp_db().await;
        let now = Utc::now();
        let contact = upsert_contact(&db, "111", now).await.unwrap();
        create_conversation(&db, &conversation("c1", &contact.id, now, 10))
            .await
            .unwrap();

        let open = find_open_conversation(&db, &contact.id, now).await.unwrap();
        assert_eq!(open.unwrap().id, "c1");

        let later = now + Duration::minutes(10);
        assert!(
            find_open_conversation(&db, &contact.id, later)
                .await
                .unwrap()
                .is_none(),
            "window end is exclusive"
        );
    }

    #[tokio::test]
    async fn newest_open_conversation_wins() {
        let (db, _dir) = open_temp_db().await;
        let now = Utc::now();
        let contact = upsert_contact(&db, "222", now).await.unwrap();
        create_conversation(&db, &conversation("older", &contact.id, now, 60))
            .await
            .unwrap();
        create_conversation(
            &db,
            &conversation("newer", &contact.id, now + Duration::milliseconds(5), 60),
        )
        .await
        .unwrap();

        let open = find_open_conversation(&db, &contact.id, now + Duration::seconds(1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(open.id, "newer");
        assert_eq!(list_conversations(&db, &contact.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn extend_moves_window() {
        let (db, _dir) = open_temp_db().await;
        let now = Utc::now();
        let contact = upsert_contact(&db, "333", now).await.unwrap();
        create_conversation(&db, &conversation("c", &contact.id, now, 1))
            .await
            .unwrap();
        extend_conversation(&db, "c", now + Duration::minutes(30))
            .await
            .unwrap();

        let open = find_open_conversation(&db, &contact.id, now + Duration::minutes(20))
            .await
            .unwrap();
        assert!(open.is_some());
    }
}
