//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract; PostgreSQL implementations live in
//! `crate::infrastructure::persistence`. Mocks are generated with `mockall`
//! for unit tests.
//!
//! # Available Repositories
//!
//! - [`PostRepository`] - Posts, tags, series and listings
//! - [`LinkRepository`] - Link submissions and approval
//! - [`TokenRepository`] - Admin API tokens
//!
//! # Testing
//!
//! See integration tests in `tests/repository_*.rs` for usage examples.

pub mod link_repository;
pub mod post_repository;
pub mod token_repository;

pub use link_repository::LinkRepository;
pub use post_repository::{PostFilter, PostRepository};
pub use token_repository::{ApiToken, TokenRepository, TokenSelector};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use post_repository::MockPostRepository;
#[cfg(test)]
pub use token_repository::MockTokenRepository;
