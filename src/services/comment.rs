//! Comment service
//!
//! Any logged-in user may read and post comments. Editing and deleting is
//! limited to the comment's author and administrators.

use crate::db::repositories::CommentRepository;
use crate::models::{Comment, CommentInput, CommentTarget, CommentView, SessionData};
use crate::services::{validation, ServiceError};
use chrono::Utc;
use std::sync::Arc;

/// Comment service
pub struct CommentService {
    repo: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentRepository>) -> Self {
        Self { repo }
    }

    /// Comments on a parent, oldest first, each marked for the viewer
    pub async fn list(
        &self,
        target: CommentTarget,
        target_id: i64,
        viewer: &SessionData,
    ) -> Result<Vec<CommentView>, ServiceError> {
        self.ensure_target(target, target_id).await?;
        let comments = self.repo.list_for(target, target_id).await?;
        Ok(comments
            .into_iter()
            .map(|c| CommentView::for_viewer(c, viewer.user_id, viewer.is_admin))
            .collect())
    }

    /// Post a comment as the session user
    pub async fn create(
        &self,
        target: CommentTarget,
        target_id: i64,
        viewer: &SessionData,
        input: CommentInput,
    ) -> Result<CommentView, ServiceError> {
        let text = validation::required(input.text, "text")?;
        self.ensure_target(target, target_id).await?;

        let comment = Comment {
            id: 0,
            target_type: target,
            target_id,
            user_id: Some(viewer.user_id),
            author: viewer.user_name.clone(),
            text,
            created_at: Utc::now(),
        };
        let created = self.repo.create(&comment).await?;
        tracing::debug!(id = created.id, %target, target_id, "Comment posted");
        Ok(CommentView::for_viewer(
            created,
            viewer.user_id,
            viewer.is_admin,
        ))
    }

    /// Replace a comment's text
    pub async fn update(
        &self,
        id: i64,
        viewer: &SessionData,
        input: CommentInput,
    ) -> Result<CommentView, ServiceError> {
        let text = validation::required(input.text, "text")?;
        let mut comment = self.editable(id, viewer).await?;

        if !self.repo.update_text(id, &text).await? {
            return Err(ServiceError::not_found("Comment"));
        }
        comment.text = text;
        Ok(CommentView::for_viewer(
            comment,
            viewer.user_id,
            viewer.is_admin,
        ))
    }

    pub async fn delete(&self, id: i64, viewer: &SessionData) -> Result<(), ServiceError> {
        self.editable(id, viewer).await?;
        if !self.repo.delete(id).await? {
            return Err(ServiceError::not_found("Comment"));
        }
        tracing::debug!(id, "Comment deleted");
        Ok(())
    }

    async fn ensure_target(&self, target: CommentTarget, target_id: i64) -> Result<(), ServiceError> {
        if !self.repo.target_exists(target, target_id).await? {
            let what = match target {
                CommentTarget::Assignment => "Assignment",
                CommentTarget::Week => "Week",
                CommentTarget::Resource => "Resource",
            };
            return Err(ServiceError::not_found(what));
        }
        Ok(())
    }

    async fn editable(&self, id: i64, viewer: &SessionData) -> Result<Comment, ServiceError> {
        let comment = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Comment"))?;
        if !comment.editable_by(viewer.user_id, viewer.is_admin) {
            return Err(ServiceError::Forbidden(
                "You can only modify your own comments".to_string(),
            ));
        }
        Ok(comment)
    }
}
