use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::group::GroupMembership;

pub const LOCAL_PROVIDER: &str = "local";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub auth_provider: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_local(&self) -> bool {
        self.auth_provider == LOCAL_PROVIDER
    }

    /// Name used for the default household group created at registration.
    pub fn display_name(&self) -> &str {
        match self.first_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name.trim(),
            _ => &self.email,
        }
    }
}

/// Profile returned by `GET /api/auth/profile`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i32,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub auth_provider: String,
    pub created_at: DateTime<Utc>,
    pub groups: Vec<GroupMembership>,
}

impl Profile {
    pub fn new(user: User, groups: Vec<GroupMembership>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            auth_provider: user.auth_provider,
            created_at: user.created_at,
            groups,
        }
    }
}
