//! Assignment model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Assignment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: NaiveDate,
    /// File references attached to the assignment
    pub files: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an assignment. `dueDate` is accepted as an alias.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAssignmentInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "dueDate")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAssignmentInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "dueDate")]
    pub due_date: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<String>>,
}

impl UpdateAssignmentInput {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.files.is_none()
    }
}
