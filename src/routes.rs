//! Top-level router configuration combining public and API routes.
//!
//! # Route Structure
//!
//! - `GET  /posts/{id_slug}`     - Post page (public, page-cached)
//! - `GET  /posts/{id}/series`   - Series of a post (public, page-cached)
//! - `GET  /originals`           - Original content listing (public, page-cached)
//! - `GET  /feed[/php|/originals]` - Atom feeds (public, page-cached)
//! - `GET  /health`              - Health check: DB, cache, job queue (public)
//! - `/api/*`                    - Admin REST API (Bearer token required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Page cache** - Full responses of the public read routes
//! - **Authentication** - Bearer token (API)
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{
    feed_handler, health_handler, originals_feed_handler, originals_handler, php_feed_handler,
    post_series_handler, show_post_handler,
};
use crate::api::middleware::{auth, page_cache, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router(state))
}

/// All routes and middleware except path normalization.
pub fn router(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let public_router = Router::new()
        .route("/posts/{id}", get(show_post_handler))
        .route("/posts/{id}/series", get(post_series_handler))
        .route("/originals", get(originals_handler))
        .route("/feed", get(feed_handler))
        .route("/feed/php", get(php_feed_handler))
        .route("/feed/originals", get(originals_feed_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            page_cache::layer,
        ));

    Router::new()
        .merge(public_router)
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
        .layer(tracing::layer())
}
