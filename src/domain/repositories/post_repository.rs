//! Repository trait for post data access.

use crate::domain::entities::{NewPost, Post, PostChanges};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Filter for published-post listings and feeds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    /// Only posts flagged as original content.
    pub original_only: bool,
    /// Only posts carrying this tag.
    pub tag: Option<String>,
}

impl PostFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn originals() -> Self {
        Self {
            original_only: true,
            tag: None,
        }
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            original_only: false,
            tag: Some(tag.into()),
        }
    }
}

/// Repository interface for posts and their tags.
///
/// Writes that change editable columns ([`PostRepository::create`],
/// [`PostRepository::update`]) are the ones the post service observes.
/// [`PostRepository::mark_published`] is the internal write path of the
/// publish transition and is never observed.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgPostRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_post.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Inserts a draft post together with its tags.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the submitting user does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_post: NewPost) -> Result<Post, AppError>;

    /// Finds a post by id, tags included.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find(&self, id: i64) -> Result<Option<Post>, AppError>;

    /// Rewrites all editable columns and replaces the tag set in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn update(&self, id: i64, changes: PostChanges) -> Result<Post, AppError>;

    /// Sets `published = true` and `publish_date`, but only on a draft.
    ///
    /// Returns `None` when the post was already published; the stored row is
    /// left untouched in that case. Of two concurrent calls exactly one gets
    /// `Some`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn mark_published(
        &self,
        id: i64,
        publish_date: DateTime<Utc>,
    ) -> Result<Option<Post>, AppError>;

    /// Loads the current tag names of a post straight from storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn tags(&self, id: i64) -> Result<Vec<String>, AppError>;

    /// All posts of a series, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn series(&self, series_slug: &str) -> Result<Vec<Post>, AppError>;

    /// Published posts, newest first (`publish_date` desc, then id desc).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_published(
        &self,
        filter: PostFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Post>, AppError>;

    /// Unpublished posts that carry a publish date, soonest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_scheduled(&self) -> Result<Vec<Post>, AppError>;
}
