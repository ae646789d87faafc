//! User repository
//!
//! Database operations for users. Students and administrators live in the
//! same table; student listings filter on `is_admin = false`.

use crate::db::{like_pattern, DynDatabasePool, LastInsertId};
use crate::models::{ListQuery, StudentSort, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

const USER_COLUMNS: &str =
    "id, student_id, name, email, password_hash, is_admin, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get a student by university identifier
    async fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>>;

    /// Persist name, email and admin flag of an existing user
    async fn update(&self, user: &User) -> Result<User>;

    /// Replace a user's password hash
    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()>;

    /// Delete a user, returning whether a row was removed
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Students matching the query
    async fn list_students(&self, query: &ListQuery<StudentSort>) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }

    async fn fetch_one_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
        let user = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, User>(&sql)
                .bind(value)
                .fetch_optional(conn)
                .await
        })
        .with_context(|| format!("Failed to get user by {}", column))?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let sql = r#"
            INSERT INTO users (student_id, name, email, password_hash, is_admin, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#;
        let id = with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&user.student_id)
                .bind(&user.name)
                .bind(&user.email)
                .bind(&user.password_hash)
                .bind(user.is_admin)
                .bind(now)
                .bind(now)
                .execute(conn)
                .await
                .map(|r| r.insert_id())
        })
        .context("Failed to create user")?;

        Ok(User {
            id,
            created_at: now,
            updated_at: now,
            ..user.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get user by ID")?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.fetch_one_by("email", email).await
    }

    async fn get_by_student_id(&self, student_id: &str) -> Result<Option<User>> {
        self.fetch_one_by("student_id", student_id).await
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let sql = "UPDATE users SET name = ?, email = ?, is_admin = ?, updated_at = ? WHERE id = ?";
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.is_admin)
                .bind(now)
                .bind(user.id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to update user")?;

        Ok(User {
            updated_at: now,
            ..user.clone()
        })
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        let sql = "UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?";
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(password_hash)
                .bind(Utc::now())
                .bind(id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to update password")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM users WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to delete user")?;
        Ok(affected > 0)
    }

    async fn list_students(&self, query: &ListQuery<StudentSort>) -> Result<Vec<User>> {
        let pattern = query.search_term().map(like_pattern);
        let filter = if pattern.is_some() {
            " AND (name LIKE ? ESCAPE '!' OR student_id LIKE ? ESCAPE '!' OR email LIKE ? ESCAPE '!')"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM users WHERE is_admin = ?{} ORDER BY {} {}, id ASC",
            USER_COLUMNS,
            filter,
            query.sort.column(),
            query.order.as_sql()
        );

        let users = with_pool!(self.pool, conn => {
            let mut q = sqlx::query_as::<_, User>(&sql).bind(false);
            if let Some(p) = &pattern {
                q = q.bind(p).bind(p).bind(p);
            }
            q.fetch_all(conn).await
        })
        .context("Failed to list students")?;
        Ok(users)
    }
}
