// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template catalogue operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use wagate_core::clock::format_timestamp;
use wagate_core::{GatewayError, Template, TemplateFilter, TemplateStatus};

use super::{enum_col, string_list_col, timestamp_col};
use crate::database::Database;

const TEMPLATE_COLUMNS: &str =
    "id, name, locale, category, body, variables, status, created_at, updated_at";

fn row_to_template(row: &rusqlite::Row<'_>) -> rusqlite::Result<Template> {
    Ok(Template {
        id: row.get(0)?,
        name: row.get(1)?,
        locale: row.get(2)?,
        category: enum_col(row, 3)?,
        body: row.get(4)?,
        variables: string_list_col(row, 5)?,
        status: enum_col(row, 6)?,
        created_at: timestamp_col(row, 7)?,
        updated_at: timestamp_col(row, 8)?,
    })
}

/// Insert a template. A name that already exists yields `Conflict`.
pub async fn insert_template(db: &Database, template: &Template) -> Result<(), GatewayError> {
    let t = template.clone();
    let variables = serde_json::to_string(&t.variables).map_err(GatewayError::storage)?;
    let name = t.name.clone();
    let inserted = db
        .connection()
        .call(move |conn| {
            let result = conn.execute(
                "INSERT INTO templates (id, name, locale, category, body, variables, status,
                                        created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    t.id,
                    t.name,
                    t.locale,
                    t.category.to_string(),
                    t.body,
                    variables,
                    t.status.to_string(),
                    format_timestamp(t.created_at),
                    format_timestamp(t.updated_at),
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(false)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(GatewayError::Conflict(format!(
            "template `{name}` already exists"
        )))
    }
}

/// Templates matching the optional locale and status filters, ordered by name.
pub async fn list_templates(
    db: &Database,
    filter: &TemplateFilter,
) -> Result<Vec<Template>, GatewayError> {
    let locale = filter.locale.clone();
    let status = filter.status.map(|s| s.to_string());
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {TEMPLATE_COLUMNS} FROM templates
                 WHERE (?1 IS NULL OR locale = ?1) AND (?2 IS NULL OR status = ?2)
                 ORDER BY name ASC"
            ))?;
            let rows = stmt.query_map(params![locale, status], row_to_template)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a template by its unique name.
pub async fn get_template_by_name(
    db: &Database,
    name: &str,
) -> Result<Option<Template>, GatewayError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE name = ?1"),
                params![name],
                row_to_template,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look up a template by id.
pub async fn get_template(db: &Database, id: &str) -> Result<Option<Template>, GatewayError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = ?1"),
                params![id],
                row_to_template,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Move a template out of `pending` in a single conditional update.
///
/// Returns whether a row changed; `false` means missing or not pending.
pub async fn transition_template_status(
    db: &Database,
    id: &str,
    to: TemplateStatus,
    now: DateTime<Utc>,
) -> Result<bool, GatewayError> {
    let id = id.to_string();
    let now = format_timestamp(now);
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE templates SET status = ?2, updated_at = ?3
                 WHERE id = ?1 AND status = 'pending'",
                params![id, to.to_string(), now],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
