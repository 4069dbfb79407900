//! Shared application state injected into every handler.

use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    ApproveLinkAction, AuthService, FeedService, LinkService, PostService, PublishPostAction,
};
use crate::config::Config;
use crate::infrastructure::cache::{CacheInvalidator, ResponseCache};
use crate::infrastructure::notify::{Notifier, QueuedNotifier};
use crate::infrastructure::persistence::{PgLinkRepository, PgPostRepository, PgTokenRepository};
use crate::infrastructure::queue::{JobQueue, PgJobQueue};

/// Settings the services need, split off [`Config`] so tests can build state
/// without a full environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub token_signing_secret: String,
    pub admin_email: String,
    pub feed_author_name: String,
    pub feed_author_email: String,
    pub cache_ttl_seconds: u64,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.base_url.clone(),
            token_signing_secret: config.token_signing_secret.clone(),
            admin_email: config.admin_email.clone(),
            feed_author_name: config.feed_author_name.clone(),
            feed_author_email: config.feed_author_email.clone(),
            cache_ttl_seconds: config.cache_ttl_seconds,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<PgPool>,
    pub post_service: Arc<PostService<PgPostRepository>>,
    pub link_service: Arc<LinkService<PgLinkRepository>>,
    pub feed_service: Arc<FeedService<PgPostRepository>>,
    pub auth_service: Arc<AuthService<PgTokenRepository>>,
    pub page_cache: Arc<dyn ResponseCache>,
    pub job_queue: Arc<PgJobQueue>,
    pub base_url: String,
    pub cache_ttl_seconds: u64,
}

impl AppState {
    /// Wires repositories, actions and services on top of shared infrastructure.
    pub fn new(
        pool: Arc<PgPool>,
        invalidator: Arc<dyn CacheInvalidator>,
        page_cache: Arc<dyn ResponseCache>,
        job_queue: Arc<PgJobQueue>,
        settings: Settings,
    ) -> Self {
        let post_repository = Arc::new(PgPostRepository::new(pool.clone()));
        let link_repository = Arc::new(PgLinkRepository::new(pool.clone()));
        let token_repository = Arc::new(PgTokenRepository::new(pool.clone()));

        let queue: Arc<dyn JobQueue> = job_queue.clone();
        let notifier: Arc<dyn Notifier> = Arc::new(QueuedNotifier::new(queue.clone()));

        let publisher = Arc::new(PublishPostAction::new(
            post_repository.clone(),
            notifier.clone(),
            invalidator.clone(),
            settings.base_url.clone(),
        ));
        let approver = Arc::new(ApproveLinkAction::new(
            link_repository.clone(),
            notifier.clone(),
            invalidator,
        ));

        let post_service = Arc::new(PostService::new(
            post_repository.clone(),
            publisher,
            queue,
        ));
        let link_service = Arc::new(LinkService::new(
            link_repository,
            approver,
            notifier,
            settings.admin_email,
        ));
        let feed_service = Arc::new(FeedService::new(
            post_repository,
            settings.base_url.clone(),
            settings.feed_author_name,
            settings.feed_author_email,
        ));
        let auth_service = Arc::new(AuthService::new(
            token_repository,
            settings.token_signing_secret,
        ));

        Self {
            pool,
            post_service,
            link_service,
            feed_service,
            auth_service,
            page_cache,
            job_queue,
            base_url: settings.base_url,
            cache_ttl_seconds: settings.cache_ttl_seconds,
        }
    }
}
