//! The publish transition of a post.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::entities::Post;
use crate::domain::notification::Notification;
use crate::domain::repositories::PostRepository;
use crate::error::AppError;
use crate::infrastructure::cache::CacheInvalidator;
use crate::infrastructure::notify::Notifier;

/// Publishes a post exactly once.
///
/// Calling [`PublishPostAction::execute`] on an already published post is a
/// no-op: no write, no announcement, no cache flush. The snapshot passed in
/// may be stale, so the write itself is conditional: when another request
/// published the post first, this call returns the stored post and skips the
/// side effects. The write goes through [`PostRepository::mark_published`],
/// which the save hook does not observe, so publishing never re-enters the
/// hook.
pub struct PublishPostAction<P: PostRepository> {
    posts: Arc<P>,
    notifier: Arc<dyn Notifier>,
    invalidator: Arc<dyn CacheInvalidator>,
    base_url: String,
}

impl<P: PostRepository> PublishPostAction<P> {
    pub fn new(
        posts: Arc<P>,
        notifier: Arc<dyn Notifier>,
        invalidator: Arc<dyn CacheInvalidator>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            notifier,
            invalidator,
            base_url: base_url.into(),
        }
    }

    /// Publishes `post` and returns the persisted result.
    ///
    /// A publish date that is already set (scheduled posts) is kept; otherwise
    /// the current time is used. The announcement is queued only when
    /// `send_automated_tweet` is set. Queueing and cache failures are logged
    /// and do not undo the publish.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post disappeared.
    /// Returns [`AppError::Internal`] on database errors.
    pub async fn execute(&self, post: Post) -> Result<Post, AppError> {
        if post.published {
            debug!(post_id = post.id, "Post already published");
            return Ok(post);
        }

        let publish_date = post.publish_date.unwrap_or_else(Utc::now);
        let Some(published) = self.posts.mark_published(post.id, publish_date).await? else {
            debug!(post_id = post.id, "Post published concurrently");
            return self
                .posts
                .find(post.id)
                .await?
                .ok_or_else(|| AppError::not_found("Post not found", json!({ "id": post.id })));
        };

        if published.send_automated_tweet {
            let notification = Notification::PostPublished {
                post_id: published.id,
                title: published.title.clone(),
                url: published.url(&self.base_url),
                announcement: published.announcement(&self.base_url),
            };

            if let Err(e) = self.notifier.queue(notification).await {
                error!(post_id = published.id, error = %e, "Failed to queue announcement");
            }
        }

        if let Err(e) = self.invalidator.clear().await {
            warn!(post_id = published.id, error = %e, "Response cache clear failed");
        }

        metrics::counter!("posts_published_total").increment(1);
        info!(post_id = published.id, %publish_date, "Post published");

        Ok(published)
    }
}
