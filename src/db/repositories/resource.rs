//! Resource repository

use super::delete_with_comments;
use crate::db::{like_pattern, DynDatabasePool, LastInsertId};
use crate::models::{CommentTarget, Resource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

const RESOURCE_COLUMNS: &str = "id, title, description, link, created_at, updated_at";

#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn create(&self, resource: &Resource) -> Result<Resource>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>>;

    /// Resources in creation order, optionally filtered by title/description
    async fn list(&self, search: Option<&str>) -> Result<Vec<Resource>>;

    async fn update(&self, resource: &Resource) -> Result<Resource>;

    /// Delete the resource and its comments in one transaction
    async fn delete(&self, id: i64) -> Result<bool>;
}

pub struct SqlxResourceRepository {
    pool: DynDatabasePool,
}

impl SqlxResourceRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ResourceRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ResourceRepository for SqlxResourceRepository {
    async fn create(&self, resource: &Resource) -> Result<Resource> {
        let sql = r#"
            INSERT INTO resources (title, description, link, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
        "#;
        let id = with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&resource.title)
                .bind(&resource.description)
                .bind(&resource.link)
                .bind(resource.created_at)
                .bind(resource.updated_at)
                .execute(conn)
                .await
                .map(|r| r.insert_id())
        })
        .context("Failed to create resource")?;

        Ok(Resource {
            id,
            ..resource.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Resource>> {
        let sql = format!("SELECT {} FROM resources WHERE id = ?", RESOURCE_COLUMNS);
        let resource = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, Resource>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get resource by ID")?;
        Ok(resource)
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Resource>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(like_pattern);
        let sql = match &pattern {
            Some(_) => format!(
                "SELECT {} FROM resources WHERE title LIKE ? ESCAPE '!' OR description LIKE ? ESCAPE '!' ORDER BY id ASC",
                RESOURCE_COLUMNS
            ),
            None => format!("SELECT {} FROM resources ORDER BY id ASC", RESOURCE_COLUMNS),
        };

        let resources = with_pool!(self.pool, conn => {
            let mut q = sqlx::query_as::<_, Resource>(&sql);
            if let Some(p) = &pattern {
                q = q.bind(p).bind(p);
            }
            q.fetch_all(conn).await
        })
        .context("Failed to list resources")?;
        Ok(resources)
    }

    async fn update(&self, resource: &Resource) -> Result<Resource> {
        let sql = r#"
            UPDATE resources SET title = ?, description = ?, link = ?, updated_at = ?
            WHERE id = ?
        "#;
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&resource.title)
                .bind(&resource.description)
                .bind(&resource.link)
                .bind(resource.updated_at)
                .bind(resource.id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to update resource")?;

        Ok(resource.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_with_comments(&self.pool, CommentTarget::Resource, id).await
    }
}
