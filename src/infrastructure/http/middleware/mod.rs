pub mod error;

pub use error::{ApiError, ApiResult};

use crate::application::services::AssignmentService;

#[derive(Clone)]
pub struct AppState {
    pub assignment_service: AssignmentService,
}
