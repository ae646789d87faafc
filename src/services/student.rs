//! Student management
//!
//! Students are users without the admin flag, addressed by their university
//! `student_id`. Administrator accounts are never visible through this service.

use crate::db::is_unique_violation;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{
    ChangePasswordInput, CreateStudentInput, ListQuery, Student, StudentSort,
    UpdateStudentInput, User,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::{validation, ServiceError};
use std::sync::Arc;

pub struct StudentService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl StudentService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { users, sessions }
    }

    pub async fn list(&self, query: &ListQuery<StudentSort>) -> Result<Vec<Student>, ServiceError> {
        let users = self.users.list_students(query).await?;
        Ok(users.into_iter().map(Student::from).collect())
    }

    pub async fn get(&self, student_id: &str) -> Result<Student, ServiceError> {
        Ok(self.find(student_id).await?.into())
    }

    /// Register a student.
    ///
    /// All four fields are required. Duplicate student id or email is a conflict.
    pub async fn create(&self, input: CreateStudentInput) -> Result<Student, ServiceError> {
        let student_id = validation::required(input.student_id, "student_id")?;
        let name = validation::required(input.name, "name")?;
        let email = validation::required(input.email, "email")?;
        let password = validation::required(input.password, "password")?;

        let student_id = student_id.trim().to_string();
        let email = validation::email(&email)?;
        validation::password_length(&password)?;

        if self.users.get_by_student_id(&student_id).await?.is_some() {
            return Err(ServiceError::Conflict("Student ID already exists".to_string()));
        }
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already exists".to_string()));
        }

        let hash = hash_password(&password)?;
        let user = User::new(Some(student_id), name, email, hash, false);
        let created = match self.users.create(&user).await {
            Ok(u) => u,
            // Lost a race with a concurrent insert
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::Conflict(
                    "Student ID or email already exists".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(id = created.id, "Created student");
        Ok(created.into())
    }

    pub async fn update(
        &self,
        student_id: &str,
        input: UpdateStudentInput,
    ) -> Result<Student, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::Validation("No fields to update".to_string()));
        }
        let name = validation::not_blank(input.name, "name")?;
        let email = match validation::not_blank(input.email, "email")? {
            Some(e) => Some(validation::email(&e)?),
            None => None,
        };

        let mut user = self.find(student_id).await?;

        if let Some(email) = email {
            if email != user.email {
                if let Some(other) = self.users.get_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(ServiceError::Conflict("Email already exists".to_string()));
                    }
                }
            }
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name;
        }

        let updated = match self.users.update(&user).await {
            Ok(u) => u,
            Err(e) if is_unique_violation(&e) => {
                return Err(ServiceError::Conflict("Email already exists".to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(updated.into())
    }

    /// Delete a student and end all of their sessions
    pub async fn delete(&self, student_id: &str) -> Result<(), ServiceError> {
        let user = self.find(student_id).await?;
        self.sessions.delete_by_user(user.id).await?;
        if !self.users.delete(user.id).await? {
            return Err(ServiceError::not_found("Student"));
        }
        tracing::info!(id = user.id, "Deleted student");
        Ok(())
    }

    /// Admin-initiated password change that still requires the current password.
    ///
    /// Checks run in order: new password length, student exists, current
    /// password matches.
    pub async fn change_password(
        &self,
        student_id: &str,
        input: ChangePasswordInput,
    ) -> Result<(), ServiceError> {
        let new = validation::required(input.new_password, "new_password")?;
        validation::password_length(&new)?;

        let user = self.find(student_id).await?;

        let current = input.current_password.unwrap_or_default();
        let matches = match verify_password(&current, &user.password_hash) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(id = user.id, "Unverifiable password hash: {:#}", e);
                false
            }
        };
        if !matches {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = hash_password(&new)?;
        self.users.update_password(user.id, &hash).await?;
        Ok(())
    }

    async fn find(&self, student_id: &str) -> Result<User, ServiceError> {
        match self.users.get_by_student_id(student_id).await? {
            Some(user) if !user.is_admin => Ok(user),
            _ => Err(ServiceError::not_found("Student")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::test_support::migrated_pool;
    use crate::models::{Session, SessionData, SortOrder};
    use chrono::{Duration, Utc};

    async fn setup() -> (StudentService, Arc<dyn SessionRepository>) {
        let pool = migrated_pool().await;
        let users = SqlxUserRepository::boxed(pool.clone());
        let sessions = SqlxSessionRepository::boxed(pool);
        (StudentService::new(users, sessions.clone()), sessions)
    }

    fn input(student_id: &str, name: &str, email: &str) -> CreateStudentInput {
        CreateStudentInput {
            student_id: Some(student_id.to_string()),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some("password123".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (service, _) = setup().await;
        let created = service
            .create(input("S100", "Ann", "ann@example.edu"))
            .await
            .unwrap();
        assert_eq!(created.student_id.as_deref(), Some("S100"));

        let fetched = service.get("S100").await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.email, "ann@example.edu");
        assert!(matches!(
            service.get("S999").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_validation_and_conflicts() {
        let (service, _) = setup().await;
        service
            .create(input("S1", "Ann", "ann@example.edu"))
            .await
            .unwrap();

        let missing = CreateStudentInput {
            password: None,
            ..input("S2", "Bob", "bob@example.edu")
        };
        assert!(matches!(
            service.create(missing).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create(input("S2", "Bob", "bob-at-example")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.create(input("S1", "Bob", "bob@example.edu")).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            service.create(input("S2", "Bob", "ann@example.edu")).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update() {
        let (service, _) = setup().await;
        service.create(input("S1", "Ann", "ann@example.edu")).await.unwrap();
        service.create(input("S2", "Bob", "bob@example.edu")).await.unwrap();

        assert!(matches!(
            service.update("S1", UpdateStudentInput::default()).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service
                .update(
                    "S9",
                    UpdateStudentInput {
                        name: Some("X".to_string()),
                        email: None
                    }
                )
                .await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service
                .update(
                    "S1",
                    UpdateStudentInput {
                        name: None,
                        email: Some("bob@example.edu".to_string())
                    }
                )
                .await,
            Err(ServiceError::Conflict(_))
        ));

        let updated = service
            .update(
                "S1",
                UpdateStudentInput {
                    name: Some("Annie".to_string()),
                    email: Some("ann@example.edu".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.email, "ann@example.edu");
    }

    #[tokio::test]
    async fn test_delete_removes_sessions() {
        let (service, sessions) = setup().await;
        let student = service
            .create(input("S1", "Ann", "ann@example.edu"))
            .await
            .unwrap();

        let now = Utc::now();
        sessions
            .create(&Session {
                id: "tok".to_string(),
                user_id: student.id,
                data: SessionData {
                    user_id: student.id,
                    user_name: student.name.clone(),
                    user_email: student.email.clone(),
                    is_admin: false,
                    logged_in: true,
                },
                expires_at: now + Duration::hours(1),
                created_at: now,
            })
            .await
            .unwrap();

        service.delete("S1").await.unwrap();
        assert!(sessions.get_by_id("tok").await.unwrap().is_none());
        assert!(matches!(
            service.delete("S1").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_error_order() {
        let (service, _) = setup().await;
        service.create(input("S1", "Ann", "ann@example.edu")).await.unwrap();

        let change = |current: &str, new: &str| ChangePasswordInput {
            current_password: Some(current.to_string()),
            new_password: Some(new.to_string()),
        };

        // Short password wins over a missing student
        assert!(matches!(
            service.change_password("S9", change("wrong", "short")).await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.change_password("S9", change("wrong", "long-enough")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.change_password("S1", change("wrong", "long-enough")).await,
            Err(ServiceError::Unauthorized(_))
        ));
        service
            .change_password("S1", change("password123", "long-enough"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_hides_admins() {
        let pool = migrated_pool().await;
        let users = SqlxUserRepository::boxed(pool.clone());
        let service = StudentService::new(users.clone(), SqlxSessionRepository::boxed(pool));

        users
            .create(&User::new(
                Some("A0".to_string()),
                "Admin".to_string(),
                "admin@example.edu".to_string(),
                "hash".to_string(),
                true,
            ))
            .await
            .unwrap();
        service.create(input("S2", "Bea", "bea@example.edu")).await.unwrap();
        service.create(input("S1", "Cal", "cal@example.edu")).await.unwrap();

        let query = ListQuery {
            search: None,
            sort: StudentSort::StudentId,
            order: SortOrder::Desc,
        };
        let listed: Vec<_> = service
            .list(&query)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(listed, vec!["Bea", "Cal"]);
        assert!(matches!(
            service.get("A0").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
