//! Shared API response types
//!
//! Successful responses carry `success: true` plus either `data`, a
//! `message`, or both.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::models::{SessionData, User};

/// `{success: true, message?, data}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// `{success: true, message}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Authenticated user as shown to the front end
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&SessionData> for UserSummary {
    fn from(data: &SessionData) -> Self {
        Self {
            id: data.user_id,
            name: data.user_name.clone(),
            email: data.user_email.clone(),
            is_admin: data.is_admin,
        }
    }
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

pub fn ok<T: Serialize>(data: T) -> Json<DataResponse<T>> {
    Json(DataResponse::new(data))
}

/// 201 with the created record
pub fn created<T: Serialize>(data: T, message: &str) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(DataResponse::with_message(data, message)),
    )
}

pub fn message(message: &str) -> Json<MessageResponse> {
    Json(MessageResponse::new(message))
}
