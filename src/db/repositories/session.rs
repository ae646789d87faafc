//! Session repository
//!
//! Server-side session storage. Session attributes are kept as a JSON
//! document in the `data` column.

use crate::db::DynDatabasePool;
use crate::models::{Session, SessionData};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a new session
    async fn create(&self, session: &Session) -> Result<Session>;

    /// Get session by ID (token)
    async fn get_by_id(&self, id: &str) -> Result<Option<Session>>;

    /// Delete a session
    async fn delete(&self, id: &str) -> Result<()>;

    /// Delete all sessions for a user
    async fn delete_by_user(&self, user_id: i64) -> Result<()>;

    /// Delete expired sessions, returning how many were removed
    async fn delete_expired(&self) -> Result<u64>;
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: String,
    user_id: i64,
    data: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = anyhow::Error;

    fn try_from(row: SessionRow) -> Result<Self> {
        let data: SessionData = serde_json::from_str(&row.data)
            .with_context(|| format!("Corrupt data for session {}", row.id))?;
        Ok(Session {
            id: row.id,
            user_id: row.user_id,
            data,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// SQLx-based session repository implementation
pub struct SqlxSessionRepository {
    pool: DynDatabasePool,
}

impl SqlxSessionRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn SessionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl SessionRepository for SqlxSessionRepository {
    async fn create(&self, session: &Session) -> Result<Session> {
        let data = serde_json::to_string(&session.data).context("Failed to encode session")?;
        let sql = r#"
            INSERT INTO sessions (id, user_id, data, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
        "#;
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&session.id)
                .bind(session.user_id)
                .bind(&data)
                .bind(session.expires_at)
                .bind(session.created_at)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to create session")?;

        Ok(session.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Session>> {
        let sql = "SELECT id, user_id, data, expires_at, created_at FROM sessions WHERE id = ?";
        let row = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, SessionRow>(sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get session by ID")?;

        row.map(Session::try_from).transpose()
    }

    async fn delete(&self, id: &str) -> Result<()> {
        with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to delete session")?;
        Ok(())
    }

    async fn delete_by_user(&self, user_id: i64) -> Result<()> {
        with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM sessions WHERE user_id = ?")
                .bind(user_id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to delete sessions by user")?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64> {
        let now = Utc::now();
        let affected = with_pool!(self.pool, conn => {
            sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
                .bind(now)
                .execute(conn)
                .await
                .map(|r| r.rows_affected())
        })
        .context("Failed to delete expired sessions")?;
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::test_support::migrated_pool;
    use crate::models::User;
    use chrono::Duration;
    use uuid::Uuid;

    async fn setup() -> (SqlxSessionRepository, i64, i64) {
        let pool = migrated_pool().await;
        let users = SqlxUserRepository::new(pool.clone());
        let mut ids = Vec::new();
        for n in 1..=2 {
            let user = users
                .create(&User::new(
                    Some(format!("S{}", n)),
                    format!("User {}", n),
                    format!("user{}@example.edu", n),
                    "hash".to_string(),
                    n == 2,
                ))
                .await
                .expect("Failed to create user");
            ids.push(user.id);
        }
        (SqlxSessionRepository::new(pool), ids[0], ids[1])
    }

    fn session_for(user_id: i64, expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            data: SessionData {
                user_id,
                user_name: "User".to_string(),
                user_email: "user@example.edu".to_string(),
                is_admin: false,
                logged_in: true,
            },
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_session() {
        let (repo, user, _) = setup().await;
        let session = session_for(user, Duration::days(1));
        repo.create(&session).await.expect("Failed to create session");

        let found = repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session")
            .expect("Session not found");

        assert_eq!(found.user_id, user);
        assert_eq!(found.data, session.data);
        assert!(!found.is_expired());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_session() {
        let (repo, user, _) = setup().await;
        let session = session_for(user, Duration::days(1));
        repo.create(&session).await.unwrap();

        repo.delete(&session.id).await.unwrap();
        assert!(repo.get_by_id(&session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_sessions_by_user() {
        let (repo, first, second) = setup().await;
        let a = session_for(first, Duration::days(1));
        let b = session_for(first, Duration::days(1));
        let c = session_for(second, Duration::days(1));
        for s in [&a, &b, &c] {
            repo.create(s).await.unwrap();
        }

        repo.delete_by_user(first).await.unwrap();

        assert!(repo.get_by_id(&a.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&b.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&c.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let (repo, user, _) = setup().await;
        let expired = session_for(user, -Duration::hours(1));
        let valid = session_for(user, Duration::days(7));
        repo.create(&expired).await.unwrap();
        repo.create(&valid).await.unwrap();

        assert_eq!(repo.delete_expired().await.unwrap(), 1);
        assert!(repo.get_by_id(&expired.id).await.unwrap().is_none());
        assert!(repo.get_by_id(&valid.id).await.unwrap().is_some());
    }
}
