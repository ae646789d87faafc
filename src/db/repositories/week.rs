//! Weekly unit repository

use super::delete_with_comments;
use crate::db::{like_pattern, DynDatabasePool, LastInsertId};
use crate::models::{CommentTarget, ListQuery, Week, WeekSort};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

const WEEK_COLUMNS: &str = "id, title, start_date, description, links, created_at, updated_at";

#[async_trait]
pub trait WeekRepository: Send + Sync {
    async fn create(&self, week: &Week) -> Result<Week>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Week>>;

    /// Weeks whose title or description match the search, in the requested order
    async fn list(&self, query: &ListQuery<WeekSort>) -> Result<Vec<Week>>;

    async fn update(&self, week: &Week) -> Result<Week>;

    /// Delete the week and its comments in one transaction
    async fn delete(&self, id: i64) -> Result<bool>;
}

#[derive(sqlx::FromRow)]
struct WeekRow {
    id: i64,
    title: String,
    start_date: NaiveDate,
    description: String,
    links: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WeekRow> for Week {
    type Error = anyhow::Error;

    fn try_from(row: WeekRow) -> Result<Self> {
        let links = serde_json::from_str(&row.links)
            .with_context(|| format!("Corrupt link list for week {}", row.id))?;
        Ok(Week {
            id: row.id,
            title: row.title,
            start_date: row.start_date,
            description: row.description,
            links,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct SqlxWeekRepository {
    pool: DynDatabasePool,
}

impl SqlxWeekRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn WeekRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl WeekRepository for SqlxWeekRepository {
    async fn create(&self, week: &Week) -> Result<Week> {
        let links = serde_json::to_string(&week.links)?;
        let sql = r#"
            INSERT INTO weeks (title, start_date, description, links, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
        "#;
        let id = with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&week.title)
                .bind(week.start_date)
                .bind(&week.description)
                .bind(&links)
                .bind(week.created_at)
                .bind(week.updated_at)
                .execute(conn)
                .await
                .map(|r| r.insert_id())
        })
        .context("Failed to create week")?;

        Ok(Week {
            id,
            ..week.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Week>> {
        let sql = format!("SELECT {} FROM weeks WHERE id = ?", WEEK_COLUMNS);
        let row = with_pool!(self.pool, conn => {
            sqlx::query_as::<_, WeekRow>(&sql)
                .bind(id)
                .fetch_optional(conn)
                .await
        })
        .context("Failed to get week by ID")?;

        row.map(Week::try_from).transpose()
    }

    async fn list(&self, query: &ListQuery<WeekSort>) -> Result<Vec<Week>> {
        let pattern = query.search_term().map(like_pattern);
        let filter = if pattern.is_some() {
            " WHERE title LIKE ? ESCAPE '!' OR description LIKE ? ESCAPE '!'"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM weeks{} ORDER BY {} {}, id ASC",
            WEEK_COLUMNS,
            filter,
            query.sort.column(),
            query.order.as_sql()
        );

        let rows = with_pool!(self.pool, conn => {
            let mut q = sqlx::query_as::<_, WeekRow>(&sql);
            if let Some(p) = &pattern {
                q = q.bind(p).bind(p);
            }
            q.fetch_all(conn).await
        })
        .context("Failed to list weeks")?;

        rows.into_iter().map(Week::try_from).collect()
    }

    async fn update(&self, week: &Week) -> Result<Week> {
        let links = serde_json::to_string(&week.links)?;
        let sql = r#"
            UPDATE weeks
            SET title = ?, start_date = ?, description = ?, links = ?, updated_at = ?
            WHERE id = ?
        "#;
        with_pool!(self.pool, conn => {
            sqlx::query(sql)
                .bind(&week.title)
                .bind(week.start_date)
                .bind(&week.description)
                .bind(&links)
                .bind(week.updated_at)
                .bind(week.id)
                .execute(conn)
                .await
                .map(|_| ())
        })
        .context("Failed to update week")?;

        Ok(week.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        delete_with_comments(&self.pool, CommentTarget::Week, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::migrated_pool;
    use crate::models::SortOrder;

    fn week(title: &str, start: (i32, u32, u32), description: &str) -> Week {
        let now = Utc::now();
        Week {
            id: 0,
            title: title.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            description: description.to_string(),
            links: vec!["https://example.edu/slides".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    async fn seeded_repo() -> SqlxWeekRepository {
        let repo = SqlxWeekRepository::new(migrated_pool().await);
        repo.create(&week("Week 2: CSS", (2024, 1, 15), "Selectors and layout"))
            .await
            .unwrap();
        repo.create(&week("Week 1: HTML", (2024, 1, 8), "Document structure"))
            .await
            .unwrap();
        repo.create(&week("Week 3: JavaScript", (2024, 1, 22), "DOM and events"))
            .await
            .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_default_order_is_start_date() {
        let repo = seeded_repo().await;
        let titles: Vec<_> = repo
            .list(&ListQuery::default())
            .await
            .unwrap()
            .into_iter()
            .map(|w| w.title)
            .collect();
        assert_eq!(
            titles,
            vec!["Week 1: HTML", "Week 2: CSS", "Week 3: JavaScript"]
        );
    }

    #[tokio::test]
    async fn test_search_and_desc_order() {
        let repo = seeded_repo().await;
        let found = repo
            .list(&ListQuery {
                search: Some("layout".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Week 2: CSS");

        let desc = repo
            .list(&ListQuery {
                search: None,
                sort: WeekSort::Title,
                order: SortOrder::Desc,
            })
            .await
            .unwrap();
        assert_eq!(desc[0].title, "Week 3: JavaScript");
    }

    #[tokio::test]
    async fn test_links_roundtrip_and_delete() {
        let repo = SqlxWeekRepository::new(migrated_pool().await);
        let created = repo
            .create(&week("Week 1", (2024, 1, 8), "Intro"))
            .await
            .unwrap();
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found.links, vec!["https://example.edu/slides"]);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
