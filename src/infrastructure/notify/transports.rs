use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::{DeliveryError, NotificationTransport};
use crate::domain::notification::Notification;

/// Posts each notification as JSON to a webhook endpoint.
///
/// The body is the serialized [`Notification`], tagged with `kind`.
pub struct WebhookTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookTransport {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(notification)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(kind = notification.kind(), %status, "Webhook rejected notification");
            return Err(DeliveryError::Status(status.as_u16()));
        }

        info!(kind = notification.kind(), "Notification delivered");
        Ok(())
    }
}

/// Writes notifications to the log instead of sending them.
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        match notification {
            Notification::PostPublished {
                post_id,
                announcement,
                ..
            } => info!(post_id, %announcement, "Announcing published post"),
            Notification::LinkApproved {
                link_id,
                recipient,
                title,
                ..
            } => info!(link_id, %recipient, %title, "Mailing link approval"),
            Notification::LinkSubmitted {
                link_id,
                recipient,
                title,
                ..
            } => info!(link_id, %recipient, %title, "Mailing new link submission"),
        }
        Ok(())
    }
}
