//! Business logic services for the application layer.

pub mod approve_link_action;
pub mod auth_service;
pub mod feed_service;
pub mod link_service;
pub mod post_service;
pub mod publish_post_action;

pub use approve_link_action::ApproveLinkAction;
pub use auth_service::{AdminToken, AuthService, IssuedToken, hash_token};
pub use feed_service::{FeedItem, FeedKind, FeedService};
pub use link_service::LinkService;
pub use post_service::{Authorship, PostService};
pub use publish_post_action::PublishPostAction;
