use crate::domain::errors::DomainError;
use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Rendered as 400 `{"error": "schedule conflict"}`.
    ScheduleConflict(Option<String>),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ScheduleConflict(Some(id)) => {
                write!(f, "Schedule conflict with assignment {}", id)
            }
            ApiError::ScheduleConflict(None) => write!(f, "Schedule conflict"),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::ScheduleConflict(Some(id)) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "schedule conflict", "conflicting_assignment_id": id }),
            ),
            ApiError::ScheduleConflict(None) => {
                (StatusCode::BAD_REQUEST, json!({ "error": "schedule conflict" }))
            }
            ApiError::Internal(msg) => {
                // Details stay in the log; callers get a generic message.
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::ValidationError(msg) => ApiError::BadRequest(msg),
            DomainError::NotFound(msg) => ApiError::NotFound(msg),
            DomainError::ScheduleConflict { conflicting_id } => {
                ApiError::ScheduleConflict(conflicting_id)
            }
            err @ DomainError::AlreadyCompleted(_) => ApiError::BadRequest(err.to_string()),
            DomainError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
