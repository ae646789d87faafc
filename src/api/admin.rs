//! Admin API endpoints
//!
//! - GET /api/admin/check - Whether the session belongs to an administrator
//! - /api/admin/students - Student management (admin only)

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::common::ListParams;
use crate::api::middleware::{ApiError, ApiJson, ApiPath, ApiQuery, AppState, MaybeSession};
use crate::api::responses::{created, message, ok, UserSummary};
use crate::models::{ChangePasswordInput, CreateStudentInput, StudentSort, UpdateStudentInput};

/// Denied admin check. Carries no session details.
#[derive(Debug, Serialize)]
struct CheckDenied {
    success: bool,
    error: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct CheckGranted {
    success: bool,
    message: &'static str,
    user: UserSummary,
}

/// Student management routes, mounted at `/admin/students` behind the admin gate
pub fn students_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route(
            "/{student_id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/{student_id}/password", put(change_student_password))
}

/// GET /api/admin/check
pub async fn check(MaybeSession(session): MaybeSession) -> Response {
    match session {
        None => (
            StatusCode::UNAUTHORIZED,
            Json(CheckDenied {
                success: false,
                error: "Not logged in",
                message: "Please log in to access this page",
            }),
        )
            .into_response(),
        Some(s) if !s.is_admin() => (
            StatusCode::FORBIDDEN,
            Json(CheckDenied {
                success: false,
                error: "Access denied",
                message: "Only administrators can access this page",
            }),
        )
            .into_response(),
        Some(s) => Json(CheckGranted {
            success: true,
            message: "Admin access granted",
            user: UserSummary::from(&s.data),
        })
        .into_response(),
    }
}

async fn list_students(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query::<StudentSort>();
    let students = state.student_service.list(&query).await?;
    Ok(ok(students))
}

async fn get_student(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.student_service.get(&student_id).await?;
    Ok(ok(student))
}

async fn create_student(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateStudentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.student_service.create(body).await?;
    Ok(created(student, "Student created successfully"))
}

async fn update_student(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateStudentInput>,
) -> Result<impl IntoResponse, ApiError> {
    let student = state.student_service.update(&student_id, body).await?;
    Ok(ok(student))
}

async fn delete_student(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.student_service.delete(&student_id).await?;
    Ok(message("Student deleted successfully"))
}

async fn change_student_password(
    State(state): State<AppState>,
    ApiPath(student_id): ApiPath<String>,
    ApiJson(body): ApiJson<ChangePasswordInput>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .student_service
        .change_password(&student_id, body)
        .await?;
    Ok(message("Password updated successfully"))
}
