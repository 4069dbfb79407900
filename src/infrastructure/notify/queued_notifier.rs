use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::Notifier;
use crate::domain::jobs::{Job, JobChain};
use crate::domain::notification::Notification;
use crate::error::AppError;
use crate::infrastructure::queue::JobQueue;

/// [`Notifier`] that turns every notification into a single-step delivery chain.
pub struct QueuedNotifier {
    queue: Arc<dyn JobQueue>,
}

impl QueuedNotifier {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Notifier for QueuedNotifier {
    async fn queue(&self, notification: Notification) -> Result<(), AppError> {
        debug!(kind = notification.kind(), "Queueing notification");
        self.queue
            .dispatch(JobChain::single(Job::Deliver(notification)))
            .await
    }
}
