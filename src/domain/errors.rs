use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed or missing input; the caller can retry with corrected input.
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Entity not found: {0}")]
    NotFound(String),
    /// The proposed window overlaps a live booking of the same driver or vehicle.
    /// The blocking id is reported when known; the commit-time constraint does not name it.
    #[error("schedule conflict")]
    ScheduleConflict { conflicting_id: Option<String> },
    #[error("Assignment {0} is already completed")]
    AlreadyCompleted(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn conflict_with(id: impl Into<String>) -> Self {
        DomainError::ScheduleConflict {
            conflicting_id: Some(id.into()),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
