pub mod assignment_service;
pub mod cache_layer;

pub use assignment_service::AssignmentService;
pub use cache_layer::{CacheLayer, CacheScope};
