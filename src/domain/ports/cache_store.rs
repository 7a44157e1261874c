use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
    #[error("Cache serialization error: {0}")]
    Serialization(String),
    #[error("Invalid cache key pattern: {0}")]
    InvalidPattern(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Key-value backend behind the cache layer.
///
/// Patterns are globs where `*` matches any run of characters.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Delete every key matching `pattern`, returning how many were removed.
    async fn delete_matching(&self, pattern: &str) -> CacheResult<u64>;

    /// Atomically increment a counter, creating it at 1, and re-arm its expiry to `ttl`.
    async fn incr(&self, key: &str, ttl: Duration) -> CacheResult<i64>;

    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }
}
