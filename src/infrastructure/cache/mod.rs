pub mod memory;
pub mod redis_store;

pub use memory::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;
