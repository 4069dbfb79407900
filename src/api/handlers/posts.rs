//! Admin handlers for authoring and publishing posts.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::info;
use validator::Validate;

use crate::api::dto::posts::{PostKindResponse, PostRequest, PostResponse};
use crate::application::services::{AdminToken, Authorship};
use crate::domain::entities::SearchDocument;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a post.
///
/// # Endpoint
///
/// `POST /api/posts`
///
/// Drafts get their preview image regenerated in the background. Sending
/// `"published": true` publishes the post in the same request.
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Enums in PHP 8.1",
///   "text": "Markdown body",
///   "tags_text": "PHP, Enums",
///   "published": false
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request with `{"missing": [...]}` for blank title or text.
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    payload.validate()?;

    let authorship = Authorship {
        author_twitter_handle: payload.author_twitter_handle.clone(),
        submitted_by_user_id: payload.submitted_by_user_id,
    };

    let post = state
        .post_service
        .create(payload.attributes(), authorship)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse::from_post(post, &state.base_url)),
    ))
}

/// Replaces the editable attributes of a post.
///
/// # Endpoint
///
/// `PUT /api/posts/{id}`
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<PostResponse>, AppError> {
    payload.validate()?;

    let post = state.post_service.update(id, payload.attributes()).await?;

    Ok(Json(PostResponse::from_post(post, &state.base_url)))
}

/// Publishes a post. Publishing an already published post changes nothing.
///
/// # Endpoint
///
/// `POST /api/posts/{id}/publish`
pub async fn publish_post_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminToken>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, AppError> {
    info!(admin = %admin.name, post_id = id, "Publish requested");
    let post = state.post_service.publish(id).await?;

    Ok(Json(PostResponse::from_post(post, &state.base_url)))
}

/// Publishes every scheduled post whose date has passed.
///
/// # Endpoint
///
/// `POST /api/posts/publish-due`
pub async fn publish_due_handler(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminToken>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = state.post_service.publish_due(Utc::now()).await?;
    info!(admin = %admin.name, published = posts.len(), "Scheduled posts published");

    Ok(Json(
        posts
            .into_iter()
            .map(|p| PostResponse::from_post(p, &state.base_url))
            .collect(),
    ))
}

/// Classifies a post from its stored tags.
///
/// # Endpoint
///
/// `GET /api/posts/{id}/type`
pub async fn post_kind_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostKindResponse>, AppError> {
    let kind = state.post_service.classify(id).await?;

    Ok(Json(PostKindResponse::new(id, kind)))
}

/// Searchable projection of a published post, for pushing to an external
/// search index.
///
/// # Endpoint
///
/// `GET /api/posts/{id}/search-document`
///
/// Drafts answer 404: they must not be indexed.
pub async fn search_document_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<SearchDocument>, AppError> {
    Ok(Json(state.post_service.search_document(id).await?))
}

/// Lists unpublished posts that have a publish date, soonest first.
///
/// # Endpoint
///
/// `GET /api/posts/scheduled`
pub async fn scheduled_posts_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<PostResponse>>, AppError> {
    let posts = state.post_service.scheduled().await?;

    Ok(Json(
        posts
            .into_iter()
            .map(|p| PostResponse::from_post(p, &state.base_url))
            .collect(),
    ))
}
