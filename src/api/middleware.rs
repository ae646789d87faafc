//! API middleware
//!
//! Contains:
//! - Application state shared by all handlers
//! - The JSON error envelope and its mapping from service errors
//! - Session loading from the session cookie
//! - Authentication and admin gates
//! - Bare `OPTIONS` handling
//! - Extractors that report rejections through the error envelope

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts, Request, State,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::SessionConfig;
use crate::db::repositories::{
    CommentRepositoryImpl, SqlxAssignmentRepository, SqlxResourceRepository,
    SqlxSessionRepository, SqlxUserRepository, SqlxWeekRepository,
};
use crate::db::DynDatabasePool;
use crate::models::Session;
use crate::services::{
    AssignmentService, AuthService, CommentService, ResourceService, ServiceError,
    StudentService, WeekService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub student_service: Arc<StudentService>,
    pub assignment_service: Arc<AssignmentService>,
    pub week_service: Arc<WeekService>,
    pub resource_service: Arc<ResourceService>,
    pub comment_service: Arc<CommentService>,
    pub session_config: Arc<SessionConfig>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: DynDatabasePool, session_config: SessionConfig) -> Self {
        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());

        Self {
            auth_service: Arc::new(AuthService::with_session_ttl(
                user_repo.clone(),
                session_repo.clone(),
                session_config.ttl_hours,
            )),
            student_service: Arc::new(StudentService::new(user_repo, session_repo)),
            assignment_service: Arc::new(AssignmentService::new(
                SqlxAssignmentRepository::boxed(pool.clone()),
            )),
            week_service: Arc::new(WeekService::new(SqlxWeekRepository::boxed(pool.clone()))),
            resource_service: Arc::new(ResourceService::new(SqlxResourceRepository::boxed(
                pool.clone(),
            ))),
            comment_service: Arc::new(CommentService::new(CommentRepositoryImpl::boxed(
                pool.clone(),
            ))),
            session_config: Arc::new(session_config),
            pool,
        }
    }
}

/// Logged-in session attached to the request by [`load_session`]
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

/// Session if the request carries a live one
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentSession>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(
            parts.extensions.get::<CurrentSession>().map(|s| s.0.clone()),
        ))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::validation_error(msg),
            ServiceError::Unauthorized(msg) => Self::unauthorized(msg),
            ServiceError::Forbidden(msg) => Self::forbidden(msg),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::conflict(msg),
            ServiceError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                Self::internal_error("An internal error occurred. Please try again later.")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation_error(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation_error(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation_error(format!("Invalid query string: {}", rejection.body_text()))
    }
}

/// JSON body whose rejection is a `VALIDATION_ERROR`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Path parameters whose rejection is a `VALIDATION_ERROR`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Query string whose rejection is a `VALIDATION_ERROR`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Extract the session token from the session cookie or a bearer header
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.trim().to_string());
            }
        }
    }

    let prefix = format!("{}=", cookie_name);
    for value in headers.get_all(header::COOKIE) {
        if let Ok(cookie_str) = value.to_str() {
            for cookie in cookie_str.split(';') {
                if let Some(token) = cookie.trim().strip_prefix(&prefix) {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// `Set-Cookie` value carrying a new session
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        token,
        config.ttl_hours * 60 * 60
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Headers with a single `Set-Cookie`
pub fn set_cookie_headers(cookie: &str) -> Result<HeaderMap, ApiError> {
    let value = HeaderValue::from_str(cookie)
        .map_err(|_| ApiError::internal_error("Invalid session cookie"))?;
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, value);
    Ok(headers)
}

/// Resolve the session cookie and attach [`CurrentSession`] when it names a
/// live, logged-in session. Requests without one pass through untouched.
pub async fn load_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers(), &state.session_config.cookie_name)
    {
        match state.auth_service.resolve_session(&token).await {
            Ok(Some(session)) if session.data.logged_in => {
                request.extensions_mut().insert(CurrentSession(session));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
            }
        }
    }
    next.run(request).await
}

/// Authentication middleware
pub async fn require_auth(request: Request, next: Next) -> Result<Response, ApiError> {
    if request.extensions().get::<CurrentSession>().is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(next.run(request).await)
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if !session.0.is_admin() {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

/// Answer every `OPTIONS` request with an empty 200
pub async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SessionData;
    use axum::body::Body;
    use chrono::{Duration, Utc};

    fn headers_with(name: header::HeaderName, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(name, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn session(is_admin: bool) -> Session {
        let now = Utc::now();
        Session {
            id: "tok".to_string(),
            user_id: 1,
            data: SessionData {
                user_id: 1,
                user_name: "Ann".to_string(),
                user_email: "ann@example.edu".to_string(),
                is_admin,
                logged_in: true,
            },
            expires_at: now + Duration::hours(1),
            created_at: now,
        }
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let headers = headers_with(header::COOKIE, "theme=dark; session=abc-123; other=1");
        assert_eq!(
            extract_session_token(&headers, "session").as_deref(),
            Some("abc-123")
        );
        assert_eq!(extract_session_token(&headers, "sid"), None);
    }

    #[test]
    fn test_extract_session_token_custom_name_and_empty() {
        let headers = headers_with(header::COOKIE, "session=; sid=xyz");
        assert_eq!(extract_session_token(&headers, "session"), None);
        assert_eq!(extract_session_token(&headers, "sid").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let headers = headers_with(header::AUTHORIZATION, "Bearer tok-1");
        assert_eq!(
            extract_session_token(&headers, "session").as_deref(),
            Some("tok-1")
        );
        let basic = headers_with(header::AUTHORIZATION, "Basic Zm9vOmJhcg==");
        assert_eq!(extract_session_token(&basic, "session"), None);
    }

    #[test]
    fn test_cookies() {
        let mut config = SessionConfig::default();
        assert_eq!(
            session_cookie(&config, "t"),
            "session=t; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );
        config.secure_cookie = true;
        config.cookie_name = "sid".to_string();
        assert_eq!(
            clear_session_cookie(&config),
            "sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure"
        );
    }

    #[test]
    fn test_service_errors_map_to_status() {
        let cases = [
            (ServiceError::Validation("v".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Unauthorized("u".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("f".into()), StatusCode::FORBIDDEN),
            (ServiceError::NotFound("n".into()), StatusCode::NOT_FOUND),
            (ServiceError::Conflict("c".into()), StatusCode::CONFLICT),
            (
                ServiceError::Internal(anyhow::anyhow!("db on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_error_message_is_generic() {
        let err = ApiError::from(ServiceError::Internal(anyhow::anyhow!("password=hunter2")));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert!(!json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("hunter2"));
    }

    #[tokio::test]
    async fn test_gates() {
        use axum::{middleware::from_fn, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/admin", get(|| async { "ok" }))
            .route_layer(from_fn(require_admin));

        let anonymous = app
            .clone()
            .oneshot(axum::http::Request::get("/admin").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let mut student = axum::http::Request::get("/admin").body(Body::empty()).unwrap();
        student
            .extensions_mut()
            .insert(CurrentSession(session(false)));
        assert_eq!(
            app.clone().oneshot(student).await.unwrap().status(),
            StatusCode::FORBIDDEN
        );

        let mut admin = axum::http::Request::get("/admin").body(Body::empty()).unwrap();
        admin.extensions_mut().insert(CurrentSession(session(true)));
        assert_eq!(app.oneshot(admin).await.unwrap().status(), StatusCode::OK);
    }
}
