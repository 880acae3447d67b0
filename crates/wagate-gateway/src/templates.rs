// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Template management endpoints.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use wagate_core::{NewTemplate, Template, TemplateFilter};

use crate::error::{ApiError, parse_json};
use crate::server::AppState;

/// POST /api/templates
///
/// Creates a template in `pending` status regardless of any status supplied.
pub async fn create_template(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<Template>), ApiError> {
    let input: NewTemplate = parse_json(&body)?;
    let template = state.templates.create(input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates?locale=&status=
pub async fn list_templates(
    State(state): State<AppState>,
    Query(filter): Query<TemplateFilter>,
) -> Result<Json<Vec<Template>>, ApiError> {
    Ok(Json(state.templates.list(&filter).await?))
}

/// GET /api/templates/{name}
pub async fn get_template(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(state.templates.get_by_name(&name).await?))
}

/// PATCH /api/templates/{id}/approve
pub async fn approve_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(state.templates.approve(&id).await?))
}

/// PATCH /api/templates/{id}/reject
pub async fn reject_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Template>, ApiError> {
    Ok(Json(state.templates.reject(&id).await?))
}
