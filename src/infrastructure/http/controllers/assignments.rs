use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    domain::entities::*,
    infrastructure::http::middleware::{ApiResult, AppState},
};

// POST /api/assignments - Create assignment
pub async fn create_assignment(
    State(state): State<AppState>,
    payload: Result<Json<CreateAssignmentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Assignment>)> {
    let Json(req) = payload?;
    let assignment = state.assignment_service.create(req).await?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// GET /api/assignments - List assignments (paginated)
pub async fn list_assignments(
    State(state): State<AppState>,
    query: Result<Query<ListAssignmentsQuery>, QueryRejection>,
) -> ApiResult<Json<AssignmentPage>> {
    let Query(query) = query?;
    let page = state.assignment_service.list(query).await?;

    Ok(Json(page))
}

// GET /api/assignments/current - Assignments in progress right now
pub async fn list_current_assignments(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Assignment>>> {
    let assignments = state.assignment_service.current_assignments().await?;

    Ok(Json(assignments))
}

// GET /api/assignments/:id - Get assignment
pub async fn get_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Assignment>> {
    let assignment = state.assignment_service.get(&id).await?;

    Ok(Json(assignment))
}

// PUT/PATCH /api/assignments/:id - Update assignment
pub async fn update_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateAssignmentRequest>, JsonRejection>,
) -> ApiResult<Json<Assignment>> {
    let Json(patch) = payload?;
    let assignment = state.assignment_service.update(&id, patch).await?;

    Ok(Json(assignment))
}

// DELETE /api/assignments/:id - Soft delete assignment
pub async fn delete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.assignment_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/assignments/:id/complete - Complete assignment
pub async fn complete_assignment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Assignment>> {
    let assignment = state.assignment_service.complete(&id).await?;

    Ok(Json(assignment))
}
