pub mod assignment_repository;
pub mod cache_store;
pub mod clock;
pub mod resource_registry;
