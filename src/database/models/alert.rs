use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AlertStatus {
    Active,
    Inactive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Status must be 'active' or 'inactive'")]
pub struct InvalidAlertStatus;

impl FromStr for AlertStatus {
    type Err = InvalidAlertStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AlertStatus::Active),
            "inactive" => Ok(AlertStatus::Inactive),
            _ => Err(InvalidAlertStatus),
        }
    }
}

impl TryFrom<String> for AlertStatus {
    type Error = InvalidAlertStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub alert_type: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub status: AlertStatus,
    pub group_id: i32,
    pub user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Status arrives as a raw string so an unknown value is a 400 with a clear message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub name: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub status: Option<String>,
    pub user_id: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub alert_type: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
    pub user_id: Option<i32>,
}

impl AlertPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.alert_type.is_none()
            && self.message.is_none()
            && self.status.is_none()
            && self.user_id.is_none()
    }
}
