use crate::domain::errors::DomainResult;
use crate::domain::ports::cache_store::{CacheError, CacheStore};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// A family of cache entries invalidated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheScope {
    namespace: String,
}

impl CacheScope {
    /// Every cached listing of `collection`.
    pub fn collection(collection: &str) -> Self {
        Self {
            namespace: format!("{}:list", collection),
        }
    }

    /// The detail entry of one record of `collection`.
    pub fn item(collection: &str, id: &str) -> Self {
        Self {
            namespace: format!("{}:item:{}", collection, id),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Deterministic fingerprint of filter and pagination inputs.
pub fn query_fingerprint<P: Serialize>(params: &P) -> Result<String, CacheError> {
    serde_json::to_string(params).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Cache-aside front for read queries.
///
/// Keys carry the generation of their scope, and every invalidation bumps that
/// generation before deleting the scope's keys. A reader that loaded data before a
/// mutation can therefore only store it under a generation nobody reads anymore.
/// Generation counters expire after twice the entry ttl, by which time every entry
/// written under an older generation has expired as well.
/// Backend failures are logged and absorbed: reads fall through to the store and
/// mutations are never aborted by the cache.
#[derive(Clone)]
pub struct CacheLayer {
    store: Option<Arc<dyn CacheStore>>,
    prefix: String,
    ttl: Duration,
}

impl CacheLayer {
    pub fn new(store: Arc<dyn CacheStore>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store: Some(store),
            prefix: prefix.into(),
            ttl,
        }
    }

    /// A layer that never caches; every read goes to the store.
    pub fn disabled() -> Self {
        Self {
            store: None,
            prefix: String::new(),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn generation_ttl(&self) -> Duration {
        self.ttl * 2
    }

    fn generation_key(&self, scope: &CacheScope) -> String {
        format!("{}gen:{}", self.prefix, scope.namespace)
    }

    pub fn scope_pattern(&self, scope: &CacheScope) -> String {
        format!("{}{}:*", self.prefix, scope.namespace)
    }

    pub fn key_for(
        &self,
        scope: &CacheScope,
        generation: i64,
        fingerprint: Option<&str>,
    ) -> String {
        match fingerprint {
            Some(fp) => format!("{}{}:g{}:{}", self.prefix, scope.namespace, generation, fp),
            None => format!("{}{}:g{}", self.prefix, scope.namespace, generation),
        }
    }

    fn record_error(&self, operation: &str, target: &str, err: &CacheError) {
        metrics::counter!("cache_errors_total").increment(1);
        tracing::warn!("Cache {} failed for {}: {}", operation, target, err);
    }

    /// Current generation of `scope`; `None` when the cache cannot be used.
    pub async fn generation(&self, scope: &CacheScope) -> Option<i64> {
        let store = self.store.as_ref()?;
        let key = self.generation_key(scope);
        match store.get(&key).await {
            Ok(None) => Some(0),
            Ok(Some(raw)) => match raw.parse::<i64>() {
                Ok(generation) => Some(generation),
                Err(_) => {
                    self.record_error(
                        "generation read",
                        &key,
                        &CacheError::Serialization(format!("non-integer generation '{}'", raw)),
                    );
                    None
                }
            },
            Err(e) => {
                self.record_error("generation read", &key, &e);
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    metrics::counter!("cache_hits_total").increment(1);
                    tracing::debug!("Cache hit for {}", key);
                    Some(value)
                }
                Err(e) => {
                    self.record_error("decode", key, &CacheError::Serialization(e.to_string()));
                    None
                }
            },
            Ok(None) => {
                metrics::counter!("cache_misses_total").increment(1);
                tracing::debug!("Cache miss for {}", key);
                None
            }
            Err(e) => {
                self.record_error("get", key, &e);
                None
            }
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) {
        self.set_with_ttl(key, value, self.ttl).await
    }

    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                self.record_error("encode", key, &CacheError::Serialization(e.to_string()));
                return;
            }
        };
        match store.set(key, &payload, ttl).await {
            Ok(()) => tracing::debug!("Cache set for {} with TTL {}s", key, ttl.as_secs()),
            Err(e) => self.record_error("set", key, &e),
        }
    }

    /// Delete every key matching `pattern`.
    pub async fn invalidate(&self, pattern: &str) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        match store.delete_matching(pattern).await {
            Ok(removed) => {
                tracing::info!("Cache invalidated for pattern {} ({} keys)", pattern, removed)
            }
            Err(e) => {
                metrics::counter!("cache_errors_total").increment(1);
                tracing::error!("Cache invalidation failed for pattern {}: {}", pattern, e);
            }
        }
    }

    /// Retire the current generation of `scope` and drop its entries.
    /// Must be called only after the triggering mutation has committed.
    pub async fn invalidate_scope(&self, scope: &CacheScope) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let generation_key = self.generation_key(scope);
        if let Err(e) = store.incr(&generation_key, self.generation_ttl()).await {
            metrics::counter!("cache_errors_total").increment(1);
            tracing::error!("Cache generation bump failed for {}: {}", generation_key, e);
        }
        self.invalidate(&self.scope_pattern(scope)).await;
    }

    /// Cache-aside read: serve `scope` from the cache or run `load` and populate it.
    pub async fn get_or_load<T, F, Fut>(
        &self,
        scope: &CacheScope,
        fingerprint: Option<&str>,
        load: F,
    ) -> DomainResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        // The generation must be read before the authoritative query runs.
        let Some(generation) = self.generation(scope).await else {
            return load().await;
        };
        let key = self.key_for(scope, generation, fingerprint);

        if let Some(hit) = self.get::<T>(&key).await {
            return Ok(hit);
        }

        let value = load().await?;
        self.set(&key, &value).await;
        Ok(value)
    }

    pub async fn close(&self) {
        if let Some(store) = self.store.as_ref() {
            if let Err(e) = store.close().await {
                tracing::warn!("Cache close failed: {}", e);
            }
        }
    }
}
