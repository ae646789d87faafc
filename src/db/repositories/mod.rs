//! Database repositories
//!
//! One repository per table. Each exposes a trait used by the services and a
//! sqlx implementation that runs on either backend.

pub mod assignment;
pub mod comment;
pub mod resource;
pub mod session;
pub mod user;
pub mod week;

pub use assignment::{AssignmentRepository, SqlxAssignmentRepository};
pub use comment::{CommentRepository, CommentRepositoryImpl};
pub use resource::{ResourceRepository, SqlxResourceRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
pub use week::{SqlxWeekRepository, WeekRepository};

use anyhow::{Context, Result};

use crate::db::DynDatabasePool;
use crate::models::CommentTarget;

/// Delete a comment parent together with its comments.
///
/// Both statements run in one transaction. Returns whether the parent existed.
pub(crate) async fn delete_with_comments(
    pool: &DynDatabasePool,
    target: CommentTarget,
    id: i64,
) -> Result<bool> {
    let delete_parent = format!("DELETE FROM {} WHERE id = ?", target.table());

    let affected = with_pool!(pool, conn => {
        let mut tx = conn.begin().await.context("Failed to begin transaction")?;

        sqlx::query("DELETE FROM comments WHERE target_type = ? AND target_id = ?")
            .bind(target.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete comments of {} {}", target, id))?;

        let affected = sqlx::query(&delete_parent)
            .bind(id)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to delete {} {}", target, id))?
            .rows_affected();

        tx.commit().await.context("Failed to commit transaction")?;
        affected
    });

    Ok(affected > 0)
}
