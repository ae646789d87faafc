//! User model
//!
//! Students and administrators share one table. A student is a user without
//! the admin flag; `student_id` is the university identifier and is only
//! required for students.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// University student identifier (unique when present)
    pub student_id: Option<String>,
    /// Display name
    pub name: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Administrator flag
    pub is_admin: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User. The password must already be hashed.
    pub fn new(
        student_id: Option<String>,
        name: String,
        email: String,
        password_hash: String,
        is_admin: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            student_id,
            name,
            email,
            password_hash,
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a student as returned by the admin API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub student_id: Option<String>,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for Student {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            student_id: user.student_id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a student (before password hashing)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudentInput {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Partial update of a student's profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateStudentInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Password change request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePasswordInput {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
}

/// Columns a student listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentSort {
    #[default]
    Id,
    Name,
    StudentId,
    Email,
}

impl StudentSort {
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::StudentId => "student_id",
            Self::Email => "email",
        }
    }
}
