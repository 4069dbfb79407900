//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod feeds;
pub mod health;
pub mod links;
pub mod posts;
pub mod public;

pub use feeds::{feed_handler, originals_feed_handler, php_feed_handler};
pub use health::health_handler;
pub use links::{approve_link_handler, link_list_handler, submit_link_handler};
pub use posts::{
    create_post_handler, post_kind_handler, publish_due_handler, publish_post_handler,
    scheduled_posts_handler, search_document_handler, update_post_handler,
};
pub use public::{originals_handler, post_series_handler, show_post_handler};
