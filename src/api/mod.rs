//! API layer - HTTP handlers and routing
//!
//! All endpoints live under `/api`:
//! - Auth endpoints (login, logout, check, own password)
//! - Admin endpoints (admin check, student management)
//! - Assignment, week and resource endpoints
//! - Comment endpoints, nested under their parent
//! - Health probe

pub mod admin;
pub mod assignments;
pub mod auth;
pub mod comments;
pub mod common;
pub mod health;
pub mod middleware;
pub mod resources;
pub mod responses;
pub mod weeks;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::models::CommentTarget;

pub use middleware::{ApiError, AppState};

/// Build the `/api` router
pub fn build_api_router() -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .nest("/admin/students", admin::students_router())
        .route("/assignments", post(assignments::create))
        .route(
            "/assignments/{id}",
            put(assignments::update).delete(assignments::delete),
        )
        .route("/weeks", post(weeks::create))
        .route("/weeks/{id}", put(weeks::update).delete(weeks::delete))
        .route("/resources", post(resources::create))
        .route(
            "/resources/{id}",
            put(resources::update).delete(resources::delete),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_admin));

    // Protected routes (need login)
    let protected_routes = Router::new()
        .nest("/auth", auth::protected_router())
        .route("/assignments", get(assignments::list))
        .route("/assignments/{id}", get(assignments::get))
        .route(
            "/assignments/{id}/comments",
            comments::nested(CommentTarget::Assignment),
        )
        .route("/weeks", get(weeks::list))
        .route("/weeks/{id}", get(weeks::get))
        .route("/weeks/{id}/comments", comments::nested(CommentTarget::Week))
        .route("/resources", get(resources::list))
        .route("/resources/{id}", get(resources::get))
        .route(
            "/resources/{id}/comments",
            comments::nested(CommentTarget::Resource),
        )
        .route(
            "/comments/{id}",
            put(comments::update).delete(comments::delete),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_auth));

    // Public routes
    Router::new()
        .route("/health", get(health::health))
        .nest("/auth", auth::public_router())
        .route("/admin/check", get(admin::check))
        .merge(admin_routes)
        .merge(protected_routes)
}

/// CORS for credentialed requests. `*` mirrors the request origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::mirror_request()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.trim().parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .nest("/api", build_api_router())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::load_session,
        ))
        .layer(axum_middleware::from_fn(middleware::preflight))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
