//! Database layer
//!
//! Supports SQLite (default, single-file deployment) and MySQL, selected by
//! configuration. Repositories write their SQL once with `?` placeholders and
//! run it against whichever backend the pool holds through [`with_pool!`].
//!
//! # Usage
//!
//! ```ignore
//! use coursehub::config::DatabaseConfig;
//! use coursehub::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

/// Run `$body` with `$conn` bound to the concrete sqlx pool of `$pool`.
///
/// The body is expanded once per backend, so it may use any sqlx API that is
/// generic over the database. Must be used inside a function returning
/// `anyhow::Result`.
macro_rules! with_pool {
    ($pool:expr, $conn:ident => $body:expr) => {
        match $pool.driver() {
            $crate::config::DatabaseDriver::Sqlite => {
                let $conn = $pool.sqlite()?;
                $body
            }
            $crate::config::DatabaseDriver::Mysql => {
                let $conn = $pool.mysql()?;
                $body
            }
        }
    };
}

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};

/// Backend-neutral access to the id generated by an INSERT.
pub trait LastInsertId {
    fn insert_id(&self) -> i64;
}

impl LastInsertId for sqlx::sqlite::SqliteQueryResult {
    fn insert_id(&self) -> i64 {
        self.last_insert_rowid()
    }
}

impl LastInsertId for sqlx::mysql::MySqlQueryResult {
    fn insert_id(&self) -> i64 {
        self.last_insert_id() as i64
    }
}

/// True when `err` was caused by a UNIQUE constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<sqlx::Error>(),
            Some(sqlx::Error::Database(db)) if db.is_unique_violation()
        )
    })
}

/// Escape character paired with [`like_pattern`]. Backslash is avoided since
/// MySQL and SQLite disagree on how to spell it in a literal.
pub const LIKE_ESCAPE: char = '!';

/// Wrap `term` in `%` wildcards with `%`, `_` and `!` escaped, for use as
/// `LIKE ? ESCAPE '!'`.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("web"), "%web%");
        assert_eq!(like_pattern("50%_off"), "%50!%!_off%");
        assert_eq!(like_pattern("hi!"), "%hi!!%");
    }
}
