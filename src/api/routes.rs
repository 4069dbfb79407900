//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    approve_link_handler, create_post_handler, link_list_handler, post_kind_handler,
    publish_due_handler, publish_post_handler, scheduled_posts_handler, search_document_handler,
    submit_link_handler, update_post_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

/// All admin routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST /posts`                - Create a post (publishes it when `published` is set)
/// - `PUT  /posts/{id}`           - Replace a post's editable attributes
/// - `POST /posts/{id}/publish`   - Publish a post
/// - `GET  /posts/{id}/type`      - Classify a post from its stored tags
/// - `GET  /posts/{id}/search-document` - Search index projection of a published post
/// - `GET  /posts/scheduled`      - Unpublished posts with a publish date
/// - `POST /posts/publish-due`    - Publish scheduled posts whose date has passed
/// - `GET  /links`                - List link submissions (paginated)
/// - `POST /links`                - Submit a link
/// - `POST /links/{id}/approve`   - Approve a link submission
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post_handler))
        .route("/posts/scheduled", get(scheduled_posts_handler))
        .route("/posts/publish-due", post(publish_due_handler))
        .route("/posts/{id}", put(update_post_handler))
        .route("/posts/{id}/publish", post(publish_post_handler))
        .route("/posts/{id}/type", get(post_kind_handler))
        .route("/posts/{id}/search-document", get(search_document_handler))
        .route("/links", get(link_list_handler).post(submit_link_handler))
        .route("/links/{id}/approve", post(approve_link_handler))
}
