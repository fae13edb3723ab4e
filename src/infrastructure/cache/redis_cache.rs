//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use tracing::{debug, info, warn};

/// Redis cache shared by every catalog lookup.
///
/// Keys are namespaced with `gacha:`. All operations are fail-open.
pub struct RedisCache {
    conn: ConnectionManager,
    default_ttl: u64,
    key_prefix: &'static str,
}

impl RedisCache {
    /// Connects to Redis and verifies the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
    /// be established, or the PING fails.
    pub async fn connect(redis_url: &str, default_ttl_seconds: u64) -> CacheResult<Self> {
        info!("Connecting to Redis");

        let client = Client::open(redis_url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut probe = manager.clone();
        probe
            .ping::<()>()
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            conn: manager,
            default_ttl: default_ttl_seconds,
            key_prefix: "gacha:",
        })
    }

    fn build_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let full_key = self.build_key(key);
        let mut conn = self.conn.clone();

        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(hit) => {
                debug!(key, hit = hit.is_some(), "Cache GET");
                Ok(hit)
            }
            Err(e) => {
                warn!("Redis GET error for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<u64>) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.conn.clone();
        let ttl_seconds = ttl.unwrap_or(self.default_ttl);

        if let Err(e) = conn.set_ex::<_, _, ()>(&full_key, value, ttl_seconds).await {
            warn!("Redis SET error for {}: {}", key, e);
        } else {
            debug!(key, ttl_seconds, "Cache SET");
        }
        Ok(())
    }

    async fn invalidate(&self, key: &str) -> CacheResult<()> {
        let full_key = self.build_key(key);
        let mut conn = self.conn.clone();

        match conn.del::<_, i32>(&full_key).await {
            Ok(deleted) if deleted > 0 => debug!(key, "Cache INVALIDATE"),
            Ok(_) => {}
            Err(e) => warn!("Redis DEL error for {}: {}", key, e),
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await.is_ok()
    }
}
