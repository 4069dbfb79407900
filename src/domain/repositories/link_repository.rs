//! Repository trait for link submissions.

use crate::domain::entities::{Link, LinkStatus, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for submitted links.
///
/// Every returned [`Link`] carries the submitter's name and email.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Stores a new pending submission.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the user does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a submission by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Sets `status = approved` and `publish_date` on a pending link.
    ///
    /// Returns `None` when the link was approved already, without touching it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    /// Returns [`AppError::Internal`] on database errors.
    async fn mark_approved(
        &self,
        id: i64,
        publish_date: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError>;

    /// Puts an approved link back to pending and clears its `publish_date`.
    ///
    /// Undoes [`mark_approved`](Self::mark_approved) when the approval mail
    /// could not be queued. Returns whether a row changed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn reopen(&self, id: i64) -> Result<bool, AppError>;

    /// Lists submissions, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(
        &self,
        status: Option<LinkStatus>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError>;
}
