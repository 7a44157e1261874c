use crate::domain::entities::ResourceKind;
use crate::domain::errors::DomainResult;

/// Authoritative store of drivers, vehicles and routes, consulted by id only.
#[async_trait::async_trait]
pub trait ResourceRegistry: Send + Sync {
    async fn exists(&self, kind: ResourceKind, id: &str) -> DomainResult<bool>;
}
