//! Comment API endpoints
//!
//! Comments are nested under their parent:
//! - GET /api/{assignments|weeks|resources}/{id}/comments
//! - POST /api/{assignments|weeks|resources}/{id}/comments
//!
//! and addressed directly for edits:
//! - PUT /api/comments/{id}
//! - DELETE /api/comments/{id}
//!
//! All routes require login. Edits are limited to the author and admins.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, MethodRouter},
};

use crate::api::middleware::{ApiError, ApiJson, ApiPath, AppState, CurrentSession};
use crate::api::responses::{created, message, ok};
use crate::models::{CommentInput, CommentTarget};

/// List and create routes for one kind of parent
pub fn nested(target: CommentTarget) -> MethodRouter<AppState> {
    get(
        move |State(state): State<AppState>,
              session: CurrentSession,
              ApiPath(id): ApiPath<i64>| async move {
            list(state, session, target, id).await
        },
    )
    .post(
        move |State(state): State<AppState>,
              session: CurrentSession,
              ApiPath(id): ApiPath<i64>,
              ApiJson(body): ApiJson<CommentInput>| async move {
            create(state, session, target, id, body).await
        },
    )
}

async fn list(
    state: AppState,
    CurrentSession(session): CurrentSession,
    target: CommentTarget,
    target_id: i64,
) -> Result<impl IntoResponse, ApiError> {
    let comments = state
        .comment_service
        .list(target, target_id, &session.data)
        .await?;
    Ok(ok(comments))
}

async fn create(
    state: AppState,
    CurrentSession(session): CurrentSession,
    target: CommentTarget,
    target_id: i64,
    body: CommentInput,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .create(target, target_id, &session.data, body)
        .await?;
    Ok(created(comment, "Comment added successfully"))
}

/// PUT /api/comments/{id}
pub async fn update(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<CommentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let comment = state
        .comment_service
        .update(id, &session.data, body)
        .await?;
    Ok(ok(comment))
}

/// DELETE /api/comments/{id}
pub async fn delete(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.comment_service.delete(id, &session.data).await?;
    Ok(message("Comment deleted successfully"))
}
