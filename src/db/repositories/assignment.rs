//! Assignment repository

use super::delete_with_comments;
use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{Assignment, CommentTarget};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

const ASSIGNMENT_COLUMNS: &str = "id, title, description, due_date, files, created_at, updated_at";

#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Insert an assignment, returning it with the generated id
    async fn create(&self, assignment: &Assignment) -> Result<Assignment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Assignment>>;

    /// All assignments in creation order
    async fn list(&self) -> Result<Vec<Assignment>>;

    async fn update(&self, assignment: &Assignment) -> Result<Assignment>;

    /// Delete the assignment and its comments in one transaction
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// `files` is stored as a JSON array in a TEXT column
#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: i64,
    title: String,
    description: String,
    due_date: NaiveDate,
    files: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AssignmentRow> for Assignment {
    type Error = anyhow::Error;

    fn try_from(row: AssignmentRow) -> Result<Self> {
        let files = serde_json::from_str(&row.files)
            .with_context(|| format!("Corrupt file list for assignment {}", row.id))?;
        Ok(Assignment {
            id: row.id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            files,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct SqlxAssignmentRepository {
    pool: DynDatabasePool,
}

impl SqlxAssignmentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AssignmentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AssignmentRepository for SqlxAssignmentRepository {
    async fn create(&self, assignment: &Assignment) -> Result<Assignment> {
        let files = serde_json::to_string(&assignment.files)?;
        let sql = r#"
            INSERT INTO assignments (title, description, due_date, files, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;
        let id = with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&assignment.title)
                .bind(&assignment.description)
                .bind(assignment.due_date)
                .bind(&files)
                .bind(assignment.created_at)
                .bind(assignment.updated_at)
                .execute(conn)
                .await
                .map(|r| r.insert_id())
        })
        .context("Failed to create assignment")?;

        Ok(Assignment {
            id,
            ..assignment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Assignment>> {
        let sql = format!("SELECT {} FROM assignments WHERE id = ?", ASSIGNMENT_COLUMNS);
        let row = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, AssignmentRow>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get assignment by ID")?;

        row.map(Assignment::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<Assignment>> {
        let sql = format!("SELECT {} FROM assignments ORDER BY id ASC", ASSIGNMENT_COLUMNS);
        let rows = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, AssignmentRow>(&sql).fetch_all(conn).await
        })
        .context("Failed to list assignments")?;

        rows.into_iter().map(Assignment::try_from).collect()
    }

    async fn update(&self, assignment: &Assignment) -> Result<Assignment> {
        let files = serde_json::to_string(&assignment.files)?;
        let sql = r#"
            UPDATE assignments
            SET title = ?, description = ?, due_date = ?, files = ?, updated_at = ?
            WHERE id = ?
        "#;
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&assignment.title)
                .bind(&assignment.description)
                .bind(assignment.due_date)
                .bind(&files)
                .bind(assignment.updated_at)
                .bind(assignment.id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to update assignment")?;

        Ok(assignment.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_with_comments(&self.pool, CommentTarget::Assignment, id).await
    }
}
