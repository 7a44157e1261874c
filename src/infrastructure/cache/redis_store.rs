//! Redis-backed cache store.
//!
//! Values are stored with `SET .. EX`, generation counters with `INCR` + `EXPIRE`,
//! and pattern invalidation walks the keyspace with `SCAN MATCH` instead of the
//! blocking `KEYS` command.

use crate::domain::ports::cache_store::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

const SCAN_BATCH: usize = 500;

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Unavailable(err.to_string())
    }
}

#[derive(Clone)]
pub struct RedisCacheStore {
    conn_manager: ConnectionManager,
}

impl RedisCacheStore {
    /// Connect to Redis and verify the connection with `PING`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the server cannot be reached.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let mut conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Unavailable(format!("Failed to create Redis connection manager: {}", e))
        })?;

        let _: String = redis::cmd("PING").query_async(&mut conn_manager).await?;

        tracing::info!("Redis cache connected");
        Ok(Self { conn_manager })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn_manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.conn_manager.clone();
        // EX 0 is rejected by Redis
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(key, value, seconds).await?;
        Ok(())
    }

    async fn delete_matching(&self, pattern: &str) -> CacheResult<u64> {
        let mut conn = self.conn_manager.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }

    async fn incr(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        let mut conn = self.conn_manager.clone();
        let seconds = ttl.as_secs().max(1) as i64;
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1i64)
            .expire(key, seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn close(&self) -> CacheResult<()> {
        // ConnectionManager closes its multiplexed connection once the last clone drops.
        tracing::info!("Redis cache connection released");
        Ok(())
    }
}
