//! No-op cache for development and disabled caching.

use super::service::{CacheInvalidator, CacheResult, CachedPage, ResponseCache};
use async_trait::async_trait;
use tracing::debug;

/// A cache that stores nothing.
///
/// Used when Redis is not configured or unreachable at startup. Every lookup
/// misses and every flush succeeds immediately.
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheInvalidator for NullCache {
    async fn clear(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for NullCache {
    async fn get_page(&self, _key: &str) -> CacheResult<Option<CachedPage>> {
        Ok(None)
    }

    async fn put_page(
        &self,
        _key: &str,
        _page: &CachedPage,
        _ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        true
    }
}
