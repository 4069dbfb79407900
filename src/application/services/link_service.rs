//! Link submission and moderation service.

use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::application::page::{Page, offset_of};
use crate::application::services::ApproveLinkAction;
use crate::domain::entities::{Link, LinkStatus, NewLink};
use crate::domain::notification::Notification;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::notify::Notifier;
use crate::utils::url_normalizer::normalize_url;

/// Service for reader-submitted links.
///
/// Submissions start pending and become approved through
/// [`ApproveLinkAction`]. The site owner is told about every new submission.
pub struct LinkService<L: LinkRepository> {
    links: Arc<L>,
    approver: Arc<ApproveLinkAction<L>>,
    notifier: Arc<dyn Notifier>,
    admin_email: String,
}

impl<L: LinkRepository> LinkService<L> {
    pub fn new(
        links: Arc<L>,
        approver: Arc<ApproveLinkAction<L>>,
        notifier: Arc<dyn Notifier>,
        admin_email: impl Into<String>,
    ) -> Self {
        Self {
            links,
            approver,
            notifier,
            admin_email: admin_email.into(),
        }
    }

    /// Stores a pending submission and notifies the site owner.
    ///
    /// The submission is committed before the owner's mail is queued; a queue
    /// failure is logged and the stored link is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a blank title, an invalid URL or
    /// an unknown user.
    pub async fn submit(
        &self,
        user_id: i64,
        title: String,
        url: String,
        text: Option<String>,
    ) -> Result<Link, AppError> {
        if title.trim().is_empty() {
            return Err(AppError::bad_request(
                "Validation failed",
                json!({ "missing": ["title"] }),
            ));
        }

        let url = normalize_url(&url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        let link = self
            .links
            .create(NewLink {
                user_id,
                title: title.trim().to_string(),
                url,
                text: text.filter(|t| !t.trim().is_empty()),
            })
            .await?;

        let queued = self
            .notifier
            .queue(Notification::LinkSubmitted {
                link_id: link.id,
                recipient: self.admin_email.clone(),
                title: link.title.clone(),
                url: link.url.clone(),
            })
            .await;

        if let Err(e) = queued {
            error!(link_id = link.id, error = %e, "Failed to queue submission notice");
        }

        info!(link_id = link.id, user_id, "Link submitted");
        Ok(link)
    }

    /// Approves a submission by id. Approved links are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn approve(&self, id: i64) -> Result<Link, AppError> {
        let link = self.get(id).await?;
        self.approver.execute(link).await
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link does not exist.
    pub async fn get(&self, id: i64) -> Result<Link, AppError> {
        self.links
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))
    }

    pub async fn list(
        &self,
        status: Option<LinkStatus>,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Link>, AppError> {
        let items = self
            .links
            .list(status, offset_of(page, per_page), per_page + 1)
            .await?;

        Ok(Page::from_overfetch(items, page.max(1), per_page))
    }
}
