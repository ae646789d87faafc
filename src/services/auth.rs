//! Authentication service
//!
//! - Login with email and password, creating a server-side session
//! - Session lookup with expiry enforcement
//! - Logout
//! - Self-service password change
//! - Bootstrap of the configured administrator account
//!
//! Unknown email and wrong password produce the same error so that responses
//! do not reveal which accounts exist.

use crate::config::AdminBootstrap;
use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{ChangePasswordInput, Session, SessionData, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::{validation, ServiceError};
use anyhow::Context;
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Default session lifetime in hours
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Login request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
    session_ttl_hours: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self::with_session_ttl(users, sessions, DEFAULT_SESSION_TTL_HOURS)
    }

    pub fn with_session_ttl(
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionRepository>,
        ttl_hours: i64,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl_hours: ttl_hours,
        }
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    ///
    /// - `Validation` if email or password is missing, the email is malformed
    ///   or the password is shorter than the minimum length
    /// - `Unauthorized` for unknown email or wrong password (same message)
    pub async fn login(&self, input: LoginInput) -> Result<(Session, User), ServiceError> {
        let (email, password) = match (input.email, input.password) {
            (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (e, p),
            _ => {
                return Err(ServiceError::Validation(
                    "Email and password are required".to_string(),
                ))
            }
        };
        let email = validation::email(&email)?;
        validation::password_length(&password)?;

        let user = match self.users.get_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::debug!("Login failed: no account for submitted email");
                return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !self.password_matches(&user, &password) {
            tracing::debug!(user_id = user.id, "Login failed: wrong password");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let session = self.create_session(&user).await?;
        tracing::info!(user_id = user.id, admin = user.is_admin, "User logged in");
        Ok((session, user))
    }

    /// Delete the session. Unknown tokens are ignored.
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Look up a live session by token.
    ///
    /// Expired sessions are deleted and reported as absent.
    pub async fn resolve_session(&self, token: &str) -> Result<Option<Session>, ServiceError> {
        let session = match self
            .sessions
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            if let Err(e) = self.sessions.delete(token).await {
                tracing::warn!("Failed to delete expired session: {:#}", e);
            }
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Change the password of the logged-in user
    pub async fn change_password(
        &self,
        user_id: i64,
        input: ChangePasswordInput,
    ) -> Result<(), ServiceError> {
        let current = validation::required(input.current_password, "current_password")?;
        let new = validation::required(input.new_password, "new_password")?;
        validation::password_length(&new)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))?;

        if !self.password_matches(&user, &current) {
            return Err(ServiceError::Unauthorized(
                "Current password is incorrect".to_string(),
            ));
        }

        let hash = hash_password(&new)?;
        self.users.update_password(user.id, &hash).await?;
        tracing::info!(user_id = user.id, "Password changed");
        Ok(())
    }

    /// Create the configured administrator if no account uses its email.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, admin: &AdminBootstrap) -> Result<bool, ServiceError> {
        let email = validation::email(&admin.email)?;
        validation::password_length(&admin.password)?;

        if self.users.get_by_email(&email).await?.is_some() {
            return Ok(false);
        }

        let hash = hash_password(&admin.password)?;
        let user = User::new(None, admin.name.clone(), email, hash, true);
        let created = self.users.create(&user).await?;
        tracing::info!(user_id = created.id, "Created administrator account");
        Ok(true)
    }

    /// Remove sessions past their expiry
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, ServiceError> {
        Ok(self.sessions.delete_expired().await?)
    }

    /// Hashes that cannot be parsed count as a mismatch.
    fn password_matches(&self, user: &User, password: &str) -> bool {
        match verify_password(password, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(user_id = user.id, "Unverifiable password hash: {:#}", e);
                false
            }
        }
    }

    async fn create_session(&self, user: &User) -> Result<Session, ServiceError> {
        let now = Utc::now();
        let expires_at = Duration::try_hours(self.session_ttl_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Session lifetime of {} hours is out of range",
                    self.session_ttl_hours
                )
            })?;
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            data: SessionData {
                user_id: user.id,
                user_name: user.name.clone(),
                user_email: user.email.clone(),
                is_admin: user.is_admin,
                logged_in: true,
            },
            expires_at,
            created_at: now,
        };

        let created = self
            .sessions
            .create(&session)
            .await
            .context("Failed to create session")?;
        Ok(created)
    }
}
