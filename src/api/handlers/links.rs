//! Admin handlers for link submissions.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::links::{LinkListQuery, LinkResponse, SubmitLinkRequest};
use crate::application::page::Page;
use crate::application::services::AdminToken;
use crate::error::AppError;
use crate::state::AppState;

/// Stores a pending link submission and notifies the site owner.
///
/// # Endpoint
///
/// `POST /api/links`
pub async fn submit_link_handler(
    State(state): State<AppState>,
    Json(payload): Json<SubmitLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .submit(payload.user_id, payload.title, payload.url, payload.text)
        .await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Lists submissions, newest first.
///
/// # Endpoint
///
/// `GET /api/links?status=pending&page=1`
pub async fn link_list_handler(
    State(state): State<AppState>,
    Query(query): Query<LinkListQuery>,
) -> Result<Json<Page<LinkResponse>>, AppError> {
    let (page, per_page) = query
        .pagination
        .validate_and_get_page()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let links = state
        .link_service
        .list(query.status, page, per_page)
        .await?;

    Ok(Json(links.map(LinkResponse::from)))
}

/// Approves a submission, mails the submitter and flushes the page cache.
///
/// # Endpoint
///
/// `POST /api/links/{id}/approve`
///
/// # Errors
///
/// Returns 404 Not Found if the link does not exist. If the approval mail
/// cannot be queued the link stays pending and 500 is returned.
pub async fn approve_link_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminToken>,
    Path(id): Path<i64>,
) -> Result<Json<LinkResponse>, AppError> {
    tracing::info!(admin = %admin.name, link_id = id, "Approval requested");
    let link = state.link_service.approve(id).await?;

    Ok(Json(link.into()))
}
