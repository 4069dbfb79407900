//! Atom feed handlers.

use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};

use crate::application::services::FeedKind;
use crate::error::AppError;
use crate::state::AppState;

pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";

/// `GET /feed` - all published posts.
pub async fn feed_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    render(&state, FeedKind::All).await
}

/// `GET /feed/php` - published posts tagged `php`.
pub async fn php_feed_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    render(&state, FeedKind::Php).await
}

/// `GET /feed/originals` - published original content.
pub async fn originals_feed_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    render(&state, FeedKind::Originals).await
}

async fn render(state: &AppState, kind: FeedKind) -> Result<Response, AppError> {
    let xml = state.feed_service.render_atom(kind).await?;

    Ok(([(CONTENT_TYPE, ATOM_CONTENT_TYPE)], xml).into_response())
}
