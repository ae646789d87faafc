//! Authentication API endpoints
//!
//! - POST /api/auth/login - Log in with email and password
//! - POST /api/auth/logout - End the session
//! - GET /api/auth/check - Report whether the request is logged in
//! - PUT /api/auth/password - Change own password (requires login)

use axum::{
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{
    clear_session_cookie, extract_session_token, session_cookie, set_cookie_headers, ApiError,
    ApiJson, AppState, CurrentSession, MaybeSession,
};
use crate::api::responses::{message, UserSummary};
use crate::models::ChangePasswordInput;
use crate::services::LoginInput;

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub logged_in: bool,
    pub user: Option<UserSummary>,
}

/// Routes open to everyone
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/check", get(check))
}

/// Routes behind the login gate
pub fn protected_router() -> Router<AppState> {
    Router::new().route("/password", put(change_password))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (session, user) = state.auth_service.login(body).await?;

    let headers = set_cookie_headers(&session_cookie(&state.session_config, &session.id))?;
    Ok((
        headers,
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Succeeds with or without a session, and always expires the cookie.
async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = extract_session_token(&headers, &state.session_config.cookie_name) {
        if let Err(e) = state.auth_service.logout(&token).await {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    let headers = set_cookie_headers(&clear_session_cookie(&state.session_config))?;
    Ok((headers, message("Logged out successfully")))
}

/// GET /api/auth/check
async fn check(MaybeSession(session): MaybeSession) -> Json<CheckResponse> {
    Json(CheckResponse {
        logged_in: session.is_some(),
        user: session.as_ref().map(|s| UserSummary::from(&s.data)),
    })
}

/// PUT /api/auth/password
async fn change_password(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    ApiJson(body): ApiJson<ChangePasswordInput>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .auth_service
        .change_password(session.user_id, body)
        .await?;
    Ok(message("Password updated successfully"))
}
