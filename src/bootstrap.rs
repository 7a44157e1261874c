use crate::application::services::{AssignmentService, CacheLayer};
use crate::config::Config;
use crate::domain::ports::{
    assignment_repository::AssignmentRepository, cache_store::CacheStore, clock::Clock,
    resource_registry::ResourceRegistry,
};
use crate::infrastructure::cache::{InMemoryCacheStore, RedisCacheStore};
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::runtime::SystemClock;
use std::sync::Arc;

/// Pick the cache backend. Redis when configured and reachable, otherwise the
/// in-process store; an unreachable Redis disables caching instead of failing startup.
pub async fn connect_cache(config: &Config) -> CacheLayer {
    let store: Arc<dyn CacheStore> = match &config.redis_url {
        Some(url) => match RedisCacheStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!("Redis unavailable, caching disabled: {}", e);
                return CacheLayer::disabled();
            }
        },
        None => {
            tracing::info!("REDIS_URL not set, using in-memory cache");
            Arc::new(InMemoryCacheStore::new())
        }
    };

    CacheLayer::new(store, config.cache_prefix.clone(), config.cache_ttl)
}

pub fn build_app_state(db: Database, cache: CacheLayer) -> AppState {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let assignment_service = AssignmentService::new(
        Arc::new(db.clone()) as Arc<dyn AssignmentRepository>,
        Arc::new(db) as Arc<dyn ResourceRegistry>,
        cache,
        clock,
    );
    tracing::info!("Assignment service initialized");

    AppState { assignment_service }
}
