//! Weekly unit API endpoints
//!
//! Reads require login and accept `search`, `sort` and `order`; writes
//! require an administrator.

use axum::{extract::State, response::IntoResponse};

use crate::api::common::ListParams;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, ApiQuery, AppState};
use crate::api::responses::{created, message, ok};
use crate::models::{CreateWeekInput, UpdateWeekInput, WeekSort};

/// GET /api/weeks
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query::<WeekSort>();
    let weeks = state.week_service.list(&query).await?;
    Ok(ok(weeks))
}

/// GET /api/weeks/{id}
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let week = state.week_service.get(id).await?;
    Ok(ok(week))
}

/// POST /api/weeks
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateWeekInput>,
) -> Result<impl IntoResponse, ApiError> {
    let week = state.week_service.create(body).await?;
    Ok(created(week, "Week created successfully"))
}

/// PUT /api/weeks/{id}
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateWeekInput>,
) -> Result<impl IntoResponse, ApiError> {
    let week = state.week_service.update(id, body).await?;
    Ok(ok(week))
}

/// DELETE /api/weeks/{id}
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.week_service.delete(id).await?;
    Ok(message("Week deleted successfully"))
}
