//! Weekly unit service

use crate::db::repositories::WeekRepository;
use crate::models::{CreateWeekInput, ListQuery, UpdateWeekInput, Week, WeekSort};
use crate::services::{validation, ServiceError};
use chrono::Utc;
use std::sync::Arc;

pub struct WeekService {
    repo: Arc<dyn WeekRepository>,
}

impl WeekService {
    pub fn new(repo: Arc<dyn WeekRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, query: &ListQuery<WeekSort>) -> Result<Vec<Week>, ServiceError> {
        Ok(self.repo.list(query).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Week, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Week"))
    }

    pub async fn create(&self, input: CreateWeekInput) -> Result<Week, ServiceError> {
        let title = validation::required(input.title, "title")?;
        let start_date = validation::required(input.start_date, "start_date")?;
        let description = validation::required(input.description, "description")?;
        let start_date = validation::date(&start_date, "start_date")?;

        let now = Utc::now();
        let week = Week {
            id: 0,
            title,
            start_date,
            description,
            links: input.links.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&week).await?;
        tracing::info!(id = created.id, "Created week");
        Ok(created)
    }

    pub async fn update(&self, id: i64, input: UpdateWeekInput) -> Result<Week, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Validation("No fields to update".to_string()));
        }
        let title = validation::not_blank(input.title, "title")?;
        let description = validation::not_blank(input.description, "description")?;
        let start_date = match validation::not_blank(input.start_date, "start_date")? {
            Some(d) => Some(validation::date(&d, "start_date")?),
            None => None,
        };

        let mut week = self.get(id).await?;
        if let Some(title) = title {
            week.title = title;
        }
        if let Some(description) = description {
            week.description = description;
        }
        if let Some(start_date) = start_date {
            week.start_date = start_date;
        }
        if let Some(links) = input.links {
            week.links = links;
        }
        week.updated_at = Utc::now();

        Ok(self.repo.update(&week).await?)
    }

    /// Delete a week and its comments
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Week"));
        }
        tracing::info!(id, "Deleted week");
        Ok(())
    }
}
