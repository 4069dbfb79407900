//! The approval transition of a submitted link.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Link;
use crate::domain::notification::Notification;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheInvalidator;
use crate::infrastructure::notify::Notifier;

/// Approves a link submission exactly once.
///
/// Only a write that actually moves the link out of `pending` queues the
/// submitter's mail and flushes the cache, so of two concurrent approvals
/// exactly one notifies. If the mail cannot be queued the link is put back
/// to pending and the error surfaces; a retry then notifies.
pub struct ApproveLinkAction<L: LinkRepository> {
    links: Arc<L>,
    notifier: Arc<dyn Notifier>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl<L: LinkRepository> ApproveLinkAction<L> {
    pub fn new(
        links: Arc<L>,
        notifier: Arc<dyn Notifier>,
        invalidator: Arc<dyn CacheInvalidator>,
    ) -> Self {
        Self {
            links,
            notifier,
            invalidator,
        }
    }

    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the notification cannot be queued
    /// (the link is reopened) or on database errors.
    pub async fn execute(&self, link: Link) -> Result<Link, AppError> {
        if link.is_approved() {
            debug!(link_id = link.id, "Link already approved");
            return Ok(link);
        }

        let recipient = link.submitter_email.clone().ok_or_else(|| {
            AppError::internal("Submitter has no email address", json!({ "link_id": link.id }))
        })?;

        let Some(approved) = self.links.mark_approved(link.id, Utc::now()).await? else {
            debug!(link_id = link.id, "Link approved concurrently");
            return self
                .links
                .find(link.id)
                .await?
                .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": link.id })));
        };

        let queued = self
            .notifier
            .queue(Notification::LinkApproved {
                link_id: approved.id,
                recipient,
                title: approved.title.clone(),
                url: approved.url.clone(),
            })
            .await;

        if let Err(e) = queued {
            match self.links.reopen(approved.id).await {
                Ok(_) => warn!(link_id = approved.id, "Approval rolled back, mail not queued"),
                Err(undo) => error!(
                    link_id = approved.id,
                    error = %undo,
                    "Approved link could not be reopened after queue failure"
                ),
            }
            return Err(e);
        }

        if let Err(e) = self.invalidator.clear().await {
            warn!(link_id = approved.id, error = %e, "Response cache clear failed");
        }

        metrics::counter!("links_approved_total").increment(1);
        info!(link_id = approved.id, "Link approved");

        Ok(approved)
    }
}
