//! Redis-backed response cache.

use super::service::{CacheError, CacheInvalidator, CacheResult, CachedPage, ResponseCache};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, error, info, warn};

/// Number of keys requested per `SCAN` round trip during a flush.
const SCAN_BATCH: usize = 500;

/// Redis page cache.
///
/// Every key lives under a namespace prefix so [`CacheInvalidator::clear`] can
/// drop the whole cache without touching anything else stored in the same
/// Redis database.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: u64,
    key_prefix: String,
}

impl RedisCache {
    /// Connects to Redis, validates the connection with a PING, and configures the default TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("Connected to Redis");

        Ok(Self {
            client: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "responsecache:".to_string(),
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheInvalidator for RedisCache {
    async fn clear(&self) -> CacheResult<()> {
        let mut conn = self.client.clone();
        let pattern = format!("{}*", self.key_prefix);
        let mut cursor: u64 = 0;
        let mut removed: i64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::OperationError(format!("Redis SCAN failed: {}", e)))?;

            if !keys.is_empty() {
                removed += conn
                    .del::<_, i64>(&keys)
                    .await
                    .map_err(|e| CacheError::OperationError(format!("Redis DEL failed: {}", e)))?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        metrics::counter!("response_cache_clears_total").increment(1);
        debug!(removed, "Response cache cleared");
        Ok(())
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get_page(&self, key: &str) -> CacheResult<Option<CachedPage>> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();

        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<CachedPage>(&raw) {
                Ok(page) => {
                    debug!("Cache HIT: {}", key);
                    Ok(Some(page))
                }
                Err(e) => {
                    warn!("Discarding undecodable cache entry {}: {}", key, e);
                    Ok(None)
                }
            },
            Ok(None) => {
                debug!("Cache MISS: {}", key);
                Ok(None)
            }
            Err(e) => {
                error!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn put_page(
        &self,
        key: &str,
        page: &CachedPage,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.client.clone();
        let ttl = ttl_seconds.unwrap_or(self.default_ttl);

        let raw = serde_json::to_string(page)
            .map_err(|e| CacheError::OperationError(format!("Failed to encode page: {}", e)))?;

        match conn.set_ex::<_, _, ()>(&full_key, raw, ttl).await {
            Ok(_) => {
                debug!("Cache SET: {} (TTL: {}s)", key, ttl);
                Ok(())
            }
            Err(e) => {
                warn!("Redis SET error for {}: {}", key, e);
                Ok(())
            }
        }
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
