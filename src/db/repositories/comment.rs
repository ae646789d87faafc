//! Comment repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::db::{DynDatabasePool, LastInsertId};
use crate::models::{Comment, CommentTarget};

const COMMENT_COLUMNS: &str = "id, target_type, target_id, user_id, author, text, created_at";

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a new comment
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of one parent, oldest first
    async fn list_for(&self, target: CommentTarget, target_id: i64) -> Result<Vec<Comment>>;

    /// Replace the text of a comment
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Whether the parent entity exists
    async fn target_exists(&self, target: CommentTarget, target_id: i64) -> Result<bool>;
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    target_type: String,
    target_id: i64,
    user_id: Option<i64>,
    author: String,
    text: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = anyhow::Error;

    fn try_from(row: CommentRow) -> Result<Self> {
        let target_type = row
            .target_type
            .parse::<CommentTarget>()
            .map_err(anyhow::Error::msg)?;
        Ok(Comment {
            id: row.id,
            target_type,
            target_id: row.target_id,
            user_id: row.user_id,
            author: row.author,
            text: row.text,
            created_at: row.created_at,
        })
    }
}

/// Comment repository implementation
pub struct CommentRepositoryImpl {
    pool: DynDatabasePool,
}

impl CommentRepositoryImpl {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for CommentRepositoryImpl {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let sql = r#"
            INSERT INTO comments (target_type, target_id, user_id, author, text, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;
        let id = with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(comment.target_type.as_str())
                .bind(comment.target_id)
                .bind(comment.user_id)
                .bind(&comment.author)
                .bind(&comment.text)
                .bind(comment.created_at)
                .execute(conn)
                .await
                .map(|r| r.insert_id())
        })
        .context("Failed to create comment")?;

        Ok(Comment {
            id,
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        let sql = format!("SELECT {} FROM comments WHERE id = ?", COMMENT_COLUMNS);
        let row = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, CommentRow>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get comment by ID")?;

        row.map(Comment::try_from).transpose()
    }

    async fn list_for(&self, target: CommentTarget, target_id: i64) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments WHERE target_type = ? AND target_id = ? ORDER BY created_at ASC, id ASC",
            COMMENT_COLUMNS
        );
        let rows = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, CommentRow>(&sql)
                .bind(target.as_str())
                .bind(target_id)
                .fetch_all(conn)
                .await
        })
        .with_context(|| format!("Failed to list comments for {} {}", target, target_id))?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let affected = with_pool!(self.pool, conn => {
            sqlx::query("UPDATE comments SET text = ? WHERE id = ?")
                .bind(text)
                .bind(id)
                .execute(conn)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to update comment")?;
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM comments WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to delete comment")?;
        Ok(affected > 0)
    }

    async fn target_exists(&self, target: CommentTarget, target_id: i64) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ?", target.table());
        let (count,): (i64,) = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, (i64,)>(&sql).bind(target_id).fetch_one(conn).await
        })
        .with_context(|| format!("Failed to look up {} {}", target, target_id))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        AssignmentRepository, ResourceRepository, SqlxAssignmentRepository,
        SqlxResourceRepository,
    };
    use crate::db::test_support::migrated_pool;
    use crate::models::{Assignment, Resource};
    use chrono::{Duration, NaiveDate};

    fn comment(target: CommentTarget, target_id: i64, text: &str, at: DateTime<Utc>) -> Comment {
        Comment {
            id: 0,
            target_type: target,
            target_id,
            user_id: None,
            author: "Seed".to_string(),
            text: text.to_string(),
            created_at: at,
        }
    }

    async fn setup() -> (DynDatabasePool, CommentRepositoryImpl, i64) {
        let pool = migrated_pool().await;
        let now = Utc::now();
        let assignment = SqlxAssignmentRepository::new(pool.clone())
            .create(&Assignment {
                id: 0,
                title: "HW1".to_string(),
                description: "d".to_string(),
                due_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                files: vec![],
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
        (pool.clone(), CommentRepositoryImpl::new(pool), assignment.id)
    }

    #[tokio::test]
    async fn test_list_orders_by_creation() {
        let (_pool, repo, id) = setup().await;
        let now = Utc::now();
        repo.create(&comment(CommentTarget::Assignment, id, "second", now))
            .await
            .unwrap();
        repo.create(&comment(
            CommentTarget::Assignment,
            id,
            "first",
            now - Duration::minutes(5),
        ))
        .await
        .unwrap();
        repo.create(&comment(CommentTarget::Week, id, "other parent", now))
            .await
            .unwrap();

        let texts: Vec<_> = repo
            .list_for(CommentTarget::Assignment, id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (_pool, repo, id) = setup().await;
        let created = repo
            .create(&comment(CommentTarget::Assignment, id, "draft", Utc::now()))
            .await
            .unwrap();

        assert!(repo.update_text(created.id, "final").await.unwrap());
        assert_eq!(
            repo.get_by_id(created.id).await.unwrap().unwrap().text,
            "final"
        );
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
        assert!(!repo.update_text(created.id, "gone").await.unwrap());
    }

    #[tokio::test]
    async fn test_target_exists() {
        let (_pool, repo, id) = setup().await;
        assert!(repo.target_exists(CommentTarget::Assignment, id).await.unwrap());
        assert!(!repo.target_exists(CommentTarget::Assignment, id + 1).await.unwrap());
        assert!(!repo.target_exists(CommentTarget::Week, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_parent_delete_removes_only_its_comments() {
        let (pool, repo, assignment_id) = setup().await;
        let now = Utc::now();
        let resources = SqlxResourceRepository::new(pool.clone());
        let resource = resources
            .create(&Resource {
                id: 0,
                title: "MDN".to_string(),
                description: String::new(),
                link: "https://developer.mozilla.org".to_string(),
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        repo.create(&comment(CommentTarget::Assignment, assignment_id, "a", now))
            .await
            .unwrap();
        repo.create(&comment(CommentTarget::Resource, resource.id, "r", now))
            .await
            .unwrap();

        assert!(SqlxAssignmentRepository::new(pool.clone())
            .delete(assignment_id)
            .await
            .unwrap());

        assert!(repo
            .list_for(CommentTarget::Assignment, assignment_id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.list_for(CommentTarget::Resource, resource.id)
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
