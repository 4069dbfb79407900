//! Outbound notifications.
//!
//! Actions hand notifications to a [`Notifier`], which defers them onto the
//! job queue. The worker later hands each one to a [`NotificationTransport`]:
//! - [`WebhookTransport`] - JSON POST to a configured endpoint
//! - [`LogTransport`] - Structured log line, used when no endpoint is configured

mod queued_notifier;
mod transports;

pub use queued_notifier::QueuedNotifier;
pub use transports::{LogTransport, WebhookTransport};

use async_trait::async_trait;

use crate::domain::notification::Notification;
use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook answered with status {0}")]
    Status(u16),
}

/// Queues notifications for asynchronous delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Queues a notification. Returns once it is accepted, not delivered.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the queue rejects the notification.
    async fn queue(&self, notification: Notification) -> Result<(), AppError>;
}

/// Delivers a notification to its final destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
