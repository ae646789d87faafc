//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-side session keyed by the cookie token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Attributes captured at login
    pub data: SessionData,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }

    pub fn is_admin(&self) -> bool {
        self.data.logged_in && self.data.is_admin
    }
}

/// Authenticated-user attributes stored with the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    #[serde(deserialize_with = "loose_bool", default)]
    pub is_admin: bool,
    #[serde(deserialize_with = "loose_bool", default)]
    pub logged_in: bool,
}

/// Accepts `true`, `1`, `"1"` and `"true"` as true; everything else is false.
fn loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        serde_json::Value::String(s) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}
