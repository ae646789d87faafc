//! Course resource API endpoints

use axum::{extract::State, response::IntoResponse};

use crate::api::common::SearchParams;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, ApiQuery, AppState};
use crate::api::responses::{created, message, ok};
use crate::models::{CreateResourceInput, UpdateResourceInput};

pub async fn list(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let resources = state
        .resource_service
        .list(params.search.as_deref())
        .await?;
    Ok(ok(resources))
}

pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state.resource_service.get(id).await?;
    Ok(ok(resource))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateResourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state.resource_service.create(body).await?;
    Ok(created(resource, "Resource created successfully"))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateResourceInput>,
) -> Result<impl IntoResponse, ApiError> {
    let resource = state.resource_service.update(id, body).await?;
    Ok(ok(resource))
}

pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.resource_service.delete(id).await?;
    Ok(message("Resource deleted successfully"))
}
