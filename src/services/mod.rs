//! Services layer - Business logic
//!
//! Services validate input, enforce the authorization and uniqueness rules and
//! coordinate the repositories. Every service reports failures as
//! [`ServiceError`], which the API layer maps onto HTTP statuses.

pub mod assignment;
pub mod auth;
pub mod comment;
pub mod password;
pub mod resource;
pub mod student;
pub mod validation;
pub mod week;

pub use assignment::AssignmentService;
pub use auth::{AuthService, LoginInput};
pub use comment::CommentService;
pub use password::{hash_password, verify_password};
pub use resource::ResourceService;
pub use student::StudentService;
pub use week::WeekService;

/// Error type shared by all services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid or missing input
    #[error("{0}")]
    Validation(String),

    /// Missing or rejected credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Unique field already taken
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{} not found", what))
    }
}
