#![allow(dead_code)]

use async_trait::async_trait;
use blog_publisher::domain::jobs::JobChain;
use blog_publisher::infrastructure::cache::{
    CacheInvalidator, CacheResult, CachedPage, ResponseCache,
};
use blog_publisher::infrastructure::queue::PgJobQueue;
use blog_publisher::state::{AppState, Settings};
use sqlx::PgPool;
use sqlx::types::Json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://blog.test";
pub const SIGNING_SECRET: &str = "test-signing-secret";

/// In-memory page cache that counts flushes.
#[derive(Default)]
pub struct MemoryCache {
    pages: Mutex<HashMap<String, CachedPage>>,
    clears: AtomicUsize,
}

impl MemoryCache {
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.pages.lock().unwrap().len()
    }
}

#[async_trait]
impl CacheInvalidator for MemoryCache {
    async fn clear(&self) -> CacheResult<()> {
        self.pages.lock().unwrap().clear();
        self.clears.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get_page(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        Ok(self.pages.lock().unwrap().get(key).cloned())
    }

    async fn put_page(
        &self,
        key: &str,
        page: &CachedPage,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        self.pages
            .lock()
            .unwrap()
            .insert(key.to_string(), page.clone());
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}

pub fn settings() -> Settings {
    Settings {
        base_url: BASE_URL.to_string(),
        token_signing_secret: SIGNING_SECRET.to_string(),
        admin_email: "owner@blog.test".to_string(),
        feed_author_name: "Blog Owner".to_string(),
        feed_author_email: "owner@blog.test".to_string(),
        cache_ttl_seconds: 60,
    }
}

/// Chains dispatched to the `job_chains` table. No worker runs in handler
/// tests, so they stay there until taken.
pub struct QueuedJobs {
    pool: PgPool,
}

impl QueuedJobs {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Removes and returns the stored chains, oldest first.
    pub async fn take(&self) -> Vec<JobChain> {
        let chains: Vec<Json<JobChain>> = sqlx::query_scalar(
            "WITH taken AS (DELETE FROM job_chains RETURNING id, jobs)
             SELECT jobs FROM taken ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap();

        chains.into_iter().map(|c| c.0).collect()
    }
}

/// State backed by the test database and an in-memory cache.
pub fn create_test_state(pool: PgPool) -> (AppState, QueuedJobs, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::default());
    let queued = QueuedJobs::new(pool.clone());
    let pool = Arc::new(pool);
    let queue = Arc::new(PgJobQueue::new(pool.clone(), Duration::from_secs(300)));

    let state = AppState::new(pool, cache.clone(), cache.clone(), queue, settings());

    (state, queued, cache)
}

/// Inserts an admin token and returns the raw value for the `Authorization` header.
pub async fn create_admin_token(pool: &PgPool) -> String {
    let raw = "test-admin-token";
    let hash = blog_publisher::application::services::hash_token(SIGNING_SECRET, raw);

    sqlx::query("INSERT INTO api_tokens (name, token_hash) VALUES ($1, $2)")
        .bind("test")
        .bind(hash)
        .execute(pool)
        .await
        .unwrap();

    raw.to_string()
}

pub async fn create_test_user(pool: &PgPool, name: &str, email: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id")
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_test_post(pool: &PgPool, title: &str, published: bool) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO posts (title, text, published, publish_date, preview_secret)
         VALUES ($1, 'Body', $2, CASE WHEN $2 THEN NOW() END, 'secret1234')
         RETURNING id",
    )
    .bind(title)
    .bind(published)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_link(pool: &PgPool, user_id: i64, title: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO links (user_id, title, url) VALUES ($1, $2, 'https://example.com/a') RETURNING id",
    )
    .bind(user_id)
    .bind(title)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn published_flag(pool: &PgPool, post_id: i64) -> bool {
    sqlx::query_scalar("SELECT published FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_one(pool)
        .await
        .unwrap()
}
