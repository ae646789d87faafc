//! Course resource service

use crate::db::repositories::ResourceRepository;
use crate::models::{CreateResourceInput, Resource, UpdateResourceInput};
use crate::services::{validation, ServiceError};
use chrono::Utc;
use std::sync::Arc;

pub struct ResourceService {
    repo: Arc<dyn ResourceRepository>,
}

impl ResourceService {
    pub fn new(repo: Arc<dyn ResourceRepository>) -> Self {
        Self { repo }
    }

    /// List resources, optionally filtered by title or description
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Resource>, ServiceError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.repo.list(search).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Resource, ServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Resource"))
    }

    pub async fn create(&self, input: CreateResourceInput) -> Result<Resource, ServiceError> {
        let title = validation::required(input.title, "title")?;
        let link = validation::required(input.link, "link")?;
        let link = link.trim().to_string();
        validation::link(&link)?;

        let now = Utc::now();
        let resource = Resource {
            id: 0,
            title,
            description: input.description.unwrap_or_default(),
            link,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&resource).await?;
        tracing::info!(id = created.id, "Created resource");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        input: UpdateResourceInput,
    ) -> Result<Resource, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Validation("No fields to update".to_string()));
        }
        let title = validation::not_blank(input.title, "title")?;
        let link = match validation::not_blank(input.link, "link")? {
            Some(l) => {
                let l = l.trim().to_string();
                validation::link(&l)?;
                Some(l)
            }
            None => None,
        };

        let mut resource = self.get(id).await?;
        if let Some(title) = title {
            resource.title = title;
        }
        // Description may be cleared
        if let Some(description) = input.description {
            resource.description = description;
        }
        if let Some(link) = link {
            resource.link = link;
        }
        resource.updated_at = Utc::now();

        Ok(self.repo.update(&resource).await?)
    }

    /// Delete a resource and its comments
    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Resource"));
        }
        tracing::info!(id, "Deleted resource");
        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::db::repositories::SqlxResourceRepository;
    use crate::db::test_support::migrated_pool;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Creating a resource and reading it back by id returns the
        /// submitted fields unchanged. A missing description reads back empty.
        #[test]
        fn created_resource_reads_back_unchanged(
            title in "[ ]{0,2}(<b>)?[A-Za-z0-9 ,.é]{0,20}[A-Za-z0-9](</b>)?[ ]{0,2}",
            description in proptest::option::of("[A-Za-z0-9 ,.<>/\n]{0,60}"),
            link in "https?://[a-z]{3,10}\\.(edu|org)(/[a-z0-9]{1,8})?",
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service =
                    ResourceService::new(SqlxResourceRepository::boxed(migrated_pool().await));
                let created = service
                    .create(CreateResourceInput {
                        title: Some(title.clone()),
                        description: description.clone(),
                        link: Some(link.clone()),
                    })
                    .await
                    .expect("create should succeed");

                let fetched = service.get(created.id).await.expect("get should succeed");
                prop_assert_eq!(fetched.id, created.id);
                prop_assert_eq!(&fetched.title, &title);
                prop_assert_eq!(&fetched.description, &description.clone().unwrap_or_default());
                prop_assert_eq!(&fetched.link, &link);
                Ok(())
            });
            result?;
        }
    }
}
