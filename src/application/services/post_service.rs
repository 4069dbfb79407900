//! Post authoring, the save hook and read-side queries.

use chrono::{DateTime, Utc};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

use crate::application::page::{Page, offset_of};
use crate::application::services::PublishPostAction;
use crate::domain::entities::{
    NewPost, Post, PostAttributes, PostChanges, PostKind, SearchDocument,
};
use crate::domain::jobs::JobChain;
use crate::domain::repositories::{PostFilter, PostRepository};
use crate::domain::tags::parse_tags;
use crate::error::AppError;
use crate::infrastructure::queue::JobQueue;
use crate::utils::code_generator::generate_preview_secret;
use crate::utils::url_normalizer::normalize_optional_url;

/// Who created a post, when it did not come from the editor directly.
#[derive(Debug, Clone, Default)]
pub struct Authorship {
    pub author_twitter_handle: Option<String>,
    pub submitted_by_user_id: Option<i64>,
}

/// Service for creating, updating and querying posts.
///
/// Every create or update runs the save hook: a post that is (or is being)
/// published goes through [`PublishPostAction`], any other post gets its
/// preview image regenerated and the response cache flushed in the
/// background.
pub struct PostService<P: PostRepository> {
    posts: Arc<P>,
    publisher: Arc<PublishPostAction<P>>,
    queue: Arc<dyn JobQueue>,
}

impl<P: PostRepository> PostService<P> {
    pub fn new(
        posts: Arc<P>,
        publisher: Arc<PublishPostAction<P>>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            posts,
            publisher,
            queue,
        }
    }

    /// Creates a post from editor input.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on invalid input; nothing is persisted.
    /// Returns [`AppError::Internal`] on database or queue errors.
    pub async fn create(
        &self,
        attributes: PostAttributes,
        authorship: Authorship,
    ) -> Result<Post, AppError> {
        let requested_published = attributes.published;
        let changes = validate(attributes)?;

        let post = self
            .posts
            .create(NewPost {
                changes,
                preview_secret: generate_preview_secret(),
                author_twitter_handle: authorship.author_twitter_handle,
                submitted_by_user_id: authorship.submitted_by_user_id,
            })
            .await?;

        info!(post_id = post.id, "Post created");
        self.after_save(post, requested_published).await
    }

    /// Rewrites every editable attribute of a post and replaces its tags.
    ///
    /// Passing `published = true` publishes the post. Clearing the flag on a
    /// published post has no effect.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] on invalid input; nothing is persisted.
    /// Returns [`AppError::NotFound`] if the post does not exist.
    pub async fn update(&self, id: i64, attributes: PostAttributes) -> Result<Post, AppError> {
        let requested_published = attributes.published;
        let changes = validate(attributes)?;

        let post = self.posts.update(id, changes).await?;

        debug!(post_id = id, "Post updated");
        self.after_save(post, requested_published).await
    }

    /// Save hook, run with the persisted snapshot after each create or update.
    async fn after_save(&self, post: Post, requested_published: bool) -> Result<Post, AppError> {
        if post.published || requested_published {
            return self.publisher.execute(post).await;
        }

        self.queue.dispatch(JobChain::after_draft_save(post.id)).await?;
        Ok(post)
    }

    /// Publishes a post by id. Already published posts are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    pub async fn publish(&self, id: i64) -> Result<Post, AppError> {
        let post = self.get(id).await?;
        self.publisher.execute(post).await
    }

    /// Publishes every scheduled post whose publish date has passed.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first failure; posts published before it stay
    /// published.
    pub async fn publish_due(&self, now: DateTime<Utc>) -> Result<Vec<Post>, AppError> {
        let due: Vec<Post> = self
            .posts
            .list_scheduled()
            .await?
            .into_iter()
            .filter(|p| p.is_due(now))
            .collect();

        let mut published = Vec::with_capacity(due.len());
        for post in due {
            published.push(self.publisher.execute(post).await?);
        }

        if !published.is_empty() {
            info!(count = published.len(), "Scheduled posts published");
        }

        Ok(published)
    }

    /// Classifies a post from the tags currently in storage.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    pub async fn classify(&self, id: i64) -> Result<PostKind, AppError> {
        let post = self.get(id).await?;
        let tags = self.posts.tags(id).await?;

        Ok(PostKind::classify(&tags, post.original_content))
    }

    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    pub async fn get(&self, id: i64) -> Result<Post, AppError> {
        self.posts
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found", json!({ "id": id })))
    }

    /// Loads a post for display, honoring the preview access rule.
    ///
    /// Posts the caller may not see are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist or is hidden.
    pub async fn view(
        &self,
        id: i64,
        is_admin: bool,
        preview_secret: Option<&str>,
    ) -> Result<Post, AppError> {
        let post = self.get(id).await?;

        if !post.is_viewable_by(is_admin, preview_secret) {
            return Err(AppError::not_found("Post not found", json!({ "id": id })));
        }

        Ok(post)
    }

    /// Every post of the series `post` belongs to, ascending by id.
    pub async fn series_of(&self, post: &Post) -> Result<Vec<Post>, AppError> {
        match post.series_slug.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => self.posts.series(slug).await,
            None => Ok(Vec::new()),
        }
    }

    /// Series of the post with `id`; empty when it is not part of one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist.
    pub async fn series(&self, id: i64) -> Result<Vec<Post>, AppError> {
        let post = self.get(id).await?;
        self.series_of(&post).await
    }

    /// Published posts, newest first.
    pub async fn list_published(
        &self,
        filter: PostFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Post>, AppError> {
        let items = self
            .posts
            .list_published(filter, offset_of(page, per_page), per_page + 1)
            .await?;

        Ok(Page::from_overfetch(items, page.max(1), per_page))
    }

    pub async fn scheduled(&self) -> Result<Vec<Post>, AppError> {
        self.posts.list_scheduled().await
    }

    /// Search index projection of a published post.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the post does not exist or is not
    /// published yet.
    pub async fn search_document(&self, id: i64) -> Result<SearchDocument, AppError> {
        self.get(id).await?.search_document().ok_or_else(|| {
            AppError::not_found("Post is not published", json!({ "id": id }))
        })
    }
}

/// Checks editor input and converts it to the columns to store.
fn validate(attributes: PostAttributes) -> Result<PostChanges, AppError> {
    let mut missing = Vec::new();
    if attributes.title.trim().is_empty() {
        missing.push("title");
    }
    if attributes.text.trim().is_empty() {
        missing.push("text");
    }
    if !missing.is_empty() {
        return Err(AppError::bad_request(
            "Validation failed",
            json!({ "missing": missing }),
        ));
    }

    let external_url = normalize_optional_url(attributes.external_url.as_deref()).map_err(|e| {
        AppError::bad_request(
            "Invalid external URL",
            json!({ "field": "external_url", "reason": e.to_string() }),
        )
    })?;

    let series_slug = attributes
        .series_slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(PostChanges {
        title: attributes.title.trim().to_string(),
        text: attributes.text,
        publish_date: attributes.publish_date,
        original_content: attributes.original_content,
        external_url,
        series_slug,
        send_automated_tweet: attributes.send_automated_tweet,
        tags: parse_tags(&attributes.tags_text),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::sample_post;
    use crate::domain::jobs::Job;
    use crate::domain::repositories::MockPostRepository;
    use crate::infrastructure::cache::MockCacheInvalidator;
    use crate::infrastructure::notify::MockNotifier;
    use crate::infrastructure::queue::MockJobQueue;
    use chrono::Duration;
    use std::sync::Mutex;

    const BASE: &str = "https://blog.test";

    fn attributes(title: &str) -> PostAttributes {
        PostAttributes {
            title: title.to_string(),
            text: "Some text".to_string(),
            send_automated_tweet: true,
            ..Default::default()
        }
    }

    fn stored(id: i64, changes: &PostChanges) -> Post {
        let mut post = sample_post(id, &changes.title);
        post.text = changes.text.clone();
        post.publish_date = changes.publish_date;
        post.original_content = changes.original_content;
        post.external_url = changes.external_url.clone();
        post.series_slug = changes.series_slug.clone();
        post.send_automated_tweet = changes.send_automated_tweet;
        post.tags = changes.tags.clone();
        post
    }

    /// Builds a service whose publisher shares the given repository.
    fn service(
        repo: MockPostRepository,
        notifier: MockNotifier,
        invalidator: MockCacheInvalidator,
        queue: MockJobQueue,
    ) -> PostService<MockPostRepository> {
        let repo = Arc::new(repo);
        let publisher = Arc::new(PublishPostAction::new(
            repo.clone(),
            Arc::new(notifier),
            Arc::new(invalidator),
            BASE,
        ));
        PostService::new(repo, publisher, Arc::new(queue))
    }

    #[tokio::test]
    async fn test_draft_save_dispatches_image_then_cache_chain() {
        let mut repo = MockPostRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|new_post| Ok(stored(10, &new_post.changes)));
        repo.expect_mark_published().times(0);

        let mut queue = MockJobQueue::new();
        queue
            .expect_dispatch()
            .withf(|chain| {
                chain.jobs()
                    == [Job::GeneratePreviewImage { post_id: 10 }, Job::ClearResponseCache]
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = service(repo, MockNotifier::new(), MockCacheInvalidator::new(), queue);

        let post = service
            .create(attributes("Draft"), Authorship::default())
            .await
            .unwrap();

        assert!(!post.published);
        assert!(post.publish_date.is_none());
    }

    #[tokio::test]
    async fn test_create_then_publish_scenario() {
        let mut repo = MockPostRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|new_post| Ok(stored(1, &new_post.changes)));

        let draft = Arc::new(Mutex::new(None::<Post>));
        let published_state = draft.clone();
        repo.expect_find().returning(move |_| Ok(published_state.lock().unwrap().clone()));

        let snapshot = draft.clone();
        repo.expect_mark_published()
            .times(1)
            .returning(move |id, date| {
                let mut post = sample_post(id, "Scenario");
                post.published = true;
                post.publish_date = Some(date);
                *snapshot.lock().unwrap() = Some(post.clone());
                Ok(Some(post))
            });

        let mut queue = MockJobQueue::new();
        queue.expect_dispatch().times(1).returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_queue().times(1).returning(|_| Ok(()));
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_clear().times(1).returning(|| Ok(()));

        let service = service(repo, notifier, invalidator, queue);

        let created = service
            .create(attributes("Scenario"), Authorship::default())
            .await
            .unwrap();
        assert!(!created.published);
        *draft.lock().unwrap() = Some(created.clone());

        let before = Utc::now();
        let published = service.publish(created.id).await.unwrap();
        assert!(published.published);
        let date = published.publish_date.unwrap();
        assert!(date >= before && date <= Utc::now());

        let again = service.publish(created.id).await.unwrap();
        assert_eq!(again.publish_date, published.publish_date);
    }

    #[tokio::test]
    async fn test_saving_with_published_flag_publishes_instead_of_chaining() {
        let mut repo = MockPostRepository::new();
        repo.expect_update()
            .times(1)
            .returning(|id, changes| Ok(stored(id, &changes)));
        repo.expect_mark_published().times(1).returning(|id, date| {
            let mut post = sample_post(id, "Now");
            post.published = true;
            post.publish_date = Some(date);
            Ok(Some(post))
        });

        let mut queue = MockJobQueue::new();
        queue.expect_dispatch().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_queue().times(1).returning(|_| Ok(()));
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_clear().times(1).returning(|| Ok(()));

        let service = service(repo, notifier, invalidator, queue);

        let mut attrs = attributes("Now");
        attrs.published = true;

        let post = service.update(4, attrs).await.unwrap();

        assert!(post.published);
    }

    #[tokio::test]
    async fn test_editing_published_post_does_not_republish() {
        let mut repo = MockPostRepository::new();
        repo.expect_update().times(1).returning(|id, changes| {
            let mut post = stored(id, &changes);
            post.published = true;
            post.publish_date = Some(Utc::now() - Duration::days(1));
            Ok(post)
        });
        repo.expect_mark_published().times(0);

        let mut queue = MockJobQueue::new();
        queue.expect_dispatch().times(0);
        let mut notifier = MockNotifier::new();
        notifier.expect_queue().times(0);
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_clear().times(0);

        let service = service(repo, notifier, invalidator, queue);

        let post = service.update(4, attributes("Typo fixed")).await.unwrap();

        assert!(post.published);
        assert_eq!(post.title, "Typo fixed");
    }

    #[tokio::test]
    async fn test_blank_title_persists_nothing() {
        let mut repo = MockPostRepository::new();
        repo.expect_update().times(0);
        let mut queue = MockJobQueue::new();
        queue.expect_dispatch().times(0);

        let service = service(repo, MockNotifier::new(), MockCacheInvalidator::new(), queue);

        let result = service.update(1, attributes("   ")).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_invalid_external_url_is_rejected() {
        let mut repo = MockPostRepository::new();
        repo.expect_create().times(0);

        let service = service(
            repo,
            MockNotifier::new(),
            MockCacheInvalidator::new(),
            MockJobQueue::new(),
        );

        let mut attrs = attributes("Link");
        attrs.external_url = Some("ftp://example.com/file".to_string());

        let result = service.create(attrs, Authorship::default()).await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_tags_text_is_normalized_before_storage() {
        let mut repo = MockPostRepository::new();
        repo.expect_update()
            .withf(|_, changes| changes.tags == vec!["php".to_string(), "laravel".to_string()])
            .times(1)
            .returning(|id, changes| Ok(stored(id, &changes)));

        let mut queue = MockJobQueue::new();
        queue.expect_dispatch().returning(|_| Ok(()));

        let service = service(repo, MockNotifier::new(), MockCacheInvalidator::new(), queue);

        let mut attrs = attributes("Tagged");
        attrs.tags_text = "PHP, Laravel, laravel".to_string();

        let post = service.update(2, attrs).await.unwrap();

        assert_eq!(post.tags.len(), 2);
    }

    #[tokio::test]
    async fn test_classify_reads_fresh_tags() {
        let mut repo = MockPostRepository::new();
        repo.expect_find().returning(|id| {
            let mut post = sample_post(id, "Stale snapshot");
            post.original_content = true;
            Ok(Some(post))
        });
        repo.expect_tags()
            .times(1)
            .returning(|_| Ok(vec!["tweet".to_string()]));

        let service = service(
            repo,
            MockNotifier::new(),
            MockCacheInvalidator::new(),
            MockJobQueue::new(),
        );

        assert_eq!(service.classify(1).await.unwrap(), PostKind::Tweet);
    }

    #[tokio::test]
    async fn test_view_hides_drafts_without_secret() {
        let mut repo = MockPostRepository::new();
        repo.expect_find()
            .returning(|id| Ok(Some(sample_post(id, "Draft"))));

        let service = service(
            repo,
            MockNotifier::new(),
            MockCacheInvalidator::new(),
            MockJobQueue::new(),
        );

        assert!(matches!(
            service.view(1, false, None).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(service.view(1, false, Some("s3cr3tT0k3")).await.is_ok());
        assert!(service.view(1, true, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_series_is_empty_outside_a_series() {
        let mut repo = MockPostRepository::new();
        repo.expect_find()
            .returning(|id| Ok(Some(sample_post(id, "Standalone"))));
        repo.expect_series().times(0);

        let service = service(
            repo,
            MockNotifier::new(),
            MockCacheInvalidator::new(),
            MockJobQueue::new(),
        );

        assert!(service.series(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_publish_due_only_touches_past_dates() {
        let now = Utc::now();
        let mut repo = MockPostRepository::new();
        repo.expect_list_scheduled().returning(move || {
            let mut due = sample_post(1, "Due");
            due.publish_date = Some(now - Duration::hours(1));
            let mut later = sample_post(2, "Later");
            later.publish_date = Some(now + Duration::hours(1));
            Ok(vec![due, later])
        });
        repo.expect_mark_published()
            .withf(|id, _| *id == 1)
            .times(1)
            .returning(|id, date| {
                let mut post = sample_post(id, "Due");
                post.published = true;
                post.publish_date = Some(date);
                Ok(Some(post))
            });

        let mut notifier = MockNotifier::new();
        notifier.expect_queue().times(1).returning(|_| Ok(()));
        let mut invalidator = MockCacheInvalidator::new();
        invalidator.expect_clear().times(1).returning(|| Ok(()));

        let service = service(repo, notifier, invalidator, MockJobQueue::new());

        let published = service.publish_due(now).await.unwrap();

        assert_eq!(published.len(), 1);
        assert_eq!(published[0].id, 1);
    }

    #[tokio::test]
    async fn test_list_published_overfetches_by_one() {
        let mut repo = MockPostRepository::new();
        repo.expect_list_published()
            .withf(|filter, offset, limit| filter.original_only && *offset == 20 && *limit == 21)
            .times(1)
            .returning(|_, _, _| Ok((1..=21).map(|id| sample_post(id, "Post")).collect()));

        let service = service(
            repo,
            MockNotifier::new(),
            MockCacheInvalidator::new(),
            MockJobQueue::new(),
        );

        let page = service
            .list_published(PostFilter::originals(), 2, 20)
            .await
            .unwrap();

        assert_eq!(page.items.len(), 20);
        assert!(page.has_more);
    }
}
