//! Comment model
//!
//! Comments hang off assignments, weeks and resources. The parent is stored as
//! a `(target_type, target_id)` pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entity a comment belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentTarget {
    Assignment,
    Week,
    Resource,
}

impl CommentTarget {
    pub const ALL: [CommentTarget; 3] = [Self::Assignment, Self::Week, Self::Resource];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assignment => "assignment",
            Self::Week => "week",
            Self::Resource => "resource",
        }
    }

    /// Table holding the parent rows
    pub fn table(self) -> &'static str {
        match self {
            Self::Assignment => "assignments",
            Self::Week => "weeks",
            Self::Resource => "resources",
        }
    }
}

impl std::fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommentTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assignment" => Ok(Self::Assignment),
            "week" => Ok(Self::Week),
            "resource" => Ok(Self::Resource),
            _ => Err(format!("Invalid comment target: {}", s)),
        }
    }
}

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub target_type: CommentTarget,
    pub target_id: i64,
    /// Commenting user; `None` for seeded comments
    pub user_id: Option<i64>,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Whether the given viewer may edit or delete this comment
    pub fn editable_by(&self, user_id: i64, is_admin: bool) -> bool {
        is_admin || self.user_id == Some(user_id)
    }
}

/// Comment as presented to a particular viewer
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub read_only: bool,
}

impl CommentView {
    pub fn for_viewer(comment: Comment, user_id: i64, is_admin: bool) -> Self {
        let read_only = !comment.editable_by(user_id, is_admin);
        Self { comment, read_only }
    }
}

/// Body of a comment create or edit request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: Option<String>,
}
