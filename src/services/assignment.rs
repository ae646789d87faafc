//! Assignment service

use crate::db::repositories::AssignmentRepository;
use crate::models::{Assignment, CreateAssignmentInput, UpdateAssignmentInput};
use crate::services::{validation, ServiceError};
use chrono::Utc;
use std::sync::Arc;

pub struct AssignmentService {
    repo: Arc<dyn AssignmentRepository>,
}

impl AssignmentService {
    pub fn new(repo: Arc<dyn AssignmentRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<Assignment>, ServiceError> {
        Ok(self.repo.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Assignment, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Assignment"))
    }

    pub async fn create(&self, input: CreateAssignmentInput) -> Result<Assignment, ServiceError> {
        let title = validation::required(input.title, "title")?;
        let description = validation::required(input.description, "description")?;
        let due_date = validation::required(input.due_date, "due_date")?;
        let due_date = validation::date(&due_date, "due_date")?;

        let now = Utc::now();
        let assignment = Assignment {
            id: 0,
            title,
            description,
            due_date,
            files: input.files.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&assignment).await?;
        tracing::info!(id = created.id, "Created assignment");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateAssignmentInput,
    ) -> Result<Assignment, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Validation("No fields to update".to_string()));
        }
        let title = validation::not_blank(input.title, "title")?;
        let description = validation::not_blank(input.description, "description")?;
        let due_date = match validation::not_blank(input.due_date, "due_date")? {
            Some(d) => Some(validation::date(&d, "due_date")?),
            None => None,
        };

        let mut assignment = self.get(id).await?;
        if let Some(title) = title {
            assignment.title = title;
        }
        if let Some(description) = description {
            assignment.description = description;
        }
        if let Some(due_date) = due_date {
            assignment.due_date = due_date;
        }
        if let Some(files) = input.files {
            assignment.files = files;
        }
        assignment.updated_at = Utc::now();

        Ok(self.repo.update(&assignment).await?)
    }

    /// Delete an assignment and its comments
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Assignment"));
        }
        tracing::info!(id, "Deleted assignment");
        Ok(())
    }
}
