//! Assignment API endpoints
//!
//! - GET /api/assignments - List assignments (login)
//! - GET /api/assignments/{id} - Get one assignment (login)
//! - POST /api/assignments - Create (admin)
//! - PUT /api/assignments/{id} - Partial update (admin)
//! - DELETE /api/assignments/{id} - Delete with its comments (admin)

use axum::{extract::State, response::IntoResponse};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState};
use crate::api::responses::{created, message, ok};
use crate::models::{CreateAssignmentInput, UpdateAssignmentInput};

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let assignments = state.assignment_service.list().await?;
    Ok(ok(assignments))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state.assignment_service.get(id).await?;
    Ok(ok(assignment))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateAssignmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state.assignment_service.create(body).await?;
    Ok(created(assignment, "Assignment created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateAssignmentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = state.assignment_service.update(id, body).await?;
    Ok(ok(assignment))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.assignment_service.delete(id).await?;
    Ok(message("Assignment deleted successfully"))
}
