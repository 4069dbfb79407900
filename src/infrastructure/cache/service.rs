//! Response cache traits and error types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors that can occur during cache operations.
#[derive(Debug)]
pub enum CacheError {
    ConnectionError(String),
    OperationError(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Cache connection error: {}", e),
            Self::OperationError(e) => write!(f, "Cache operation error: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// A fully rendered response body stored in the page cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    pub content_type: String,
    pub body: String,
}

impl CachedPage {
    pub fn new(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Whole-cache invalidation.
///
/// The only mutation the workflow performs on the page cache. Flushing is
/// idempotent and commutative, so concurrent callers need no coordination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    /// Drops every cached page.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend could not be reached. Callers on
    /// the request path log and continue; the job worker retries.
    async fn clear(&self) -> CacheResult<()>;
}

/// Full-response page cache used by the public routes.
///
/// Reads and writes are fail-open: a broken backend degrades to rendering
/// every request.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Returns the cached page for a request key, `None` on miss or error.
    async fn get_page(&self, key: &str) -> CacheResult<Option<CachedPage>>;

    /// Stores a rendered page. `ttl_seconds = None` uses the backend default.
    async fn put_page(
        &self,
        key: &str,
        page: &CachedPage,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
