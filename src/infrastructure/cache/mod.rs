//! Full-response page cache.
//!
//! Provides the [`CacheInvalidator`] and [`ResponseCache`] traits with two
//! implementations:
//! - [`RedisCache`] - Production Redis-backed cache
//! - [`NullCache`] - No-op implementation for testing/disabled caching

mod null_cache;
mod redis_cache;
mod service;

pub use null_cache::NullCache;
pub use redis_cache::RedisCache;
pub use service::{CacheError, CacheInvalidator, CacheResult, CachedPage, ResponseCache};

#[cfg(test)]
pub use service::MockCacheInvalidator;
