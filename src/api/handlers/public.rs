//! Public read-only handlers for posts.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header::AUTHORIZATION},
};
use serde_json::json;

use crate::api::dto::pagination::PageParams;
use crate::api::dto::posts::{PostSummary, PreviewQuery, PublicPostResponse, SeriesEntry};
use crate::application::page::Page;
use crate::domain::repositories::PostFilter;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::slug::id_from_id_slug;

/// Shows a post with its rendered body.
///
/// # Endpoint
///
/// `GET /posts/{id_slug}[?preview_secret=...]`
///
/// Only the numeric prefix of `id_slug` is used. Drafts are visible to
/// admins and to readers holding the preview secret; everyone else gets 404.
pub async fn show_post_handler(
    State(state): State<AppState>,
    Path(id_slug): Path<String>,
    Query(query): Query<PreviewQuery>,
    headers: HeaderMap,
) -> Result<Json<PublicPostResponse>, AppError> {
    let id = id_from_id_slug(&id_slug)
        .ok_or_else(|| AppError::not_found("Post not found", json!({ "id": id_slug })))?;

    let is_admin = is_admin(&state, &headers).await;
    let post = state
        .post_service
        .view(id, is_admin, query.preview_secret.as_deref())
        .await?;
    let series = state.post_service.series_of(&post).await?;

    Ok(Json(PublicPostResponse::new(&post, &series, &state.base_url)))
}

/// Lists the posts of the series a post belongs to, in reading order.
///
/// # Endpoint
///
/// `GET /posts/{id}/series`
pub async fn post_series_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<SeriesEntry>>, AppError> {
    let post = state.post_service.view(id, false, None).await?;
    let series = state.post_service.series_of(&post).await?;

    Ok(Json(
        series
            .iter()
            .map(|p| SeriesEntry::new(p, id, &state.base_url))
            .collect(),
    ))
}

/// Lists published original content, newest first.
///
/// # Endpoint
///
/// `GET /originals?page=1`
pub async fn originals_handler(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<PostSummary>>, AppError> {
    let (page, per_page) = params
        .validate_and_get_page()
        .map_err(|e| AppError::bad_request(e, json!({})))?;

    let posts = state
        .post_service
        .list_published(PostFilter::originals(), page, per_page)
        .await?;

    Ok(Json(posts.map(|p| PostSummary::from_post(p, &state.base_url))))
}

/// True when the request carries a valid admin Bearer token.
async fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };

    state.auth_service.authenticate(token.trim()).await.is_ok()
}
