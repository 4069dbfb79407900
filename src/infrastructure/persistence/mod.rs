//! PostgreSQL repository implementations.
//!
//! Concrete implementations of domain repository traits using SQLx runtime
//! queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgPostRepository`] - Posts, tags and series
//! - [`PgLinkRepository`] - Link submissions and moderation
//! - [`PgTokenRepository`] - API token storage and validation

pub mod pg_link_repository;
pub mod pg_post_repository;
pub mod pg_token_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_post_repository::PgPostRepository;
pub use pg_token_repository::PgTokenRepository;
