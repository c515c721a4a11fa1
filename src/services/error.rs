use thiserror::Error;

use crate::auth::password::PasswordError;

/// Errors raised by the service layer. Handlers convert these into `ApiError`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ServiceError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }
}

// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unique constraint").to_string();
                tracing::warn!("Unique violation on {}", constraint);
                return ServiceError::Conflict(conflict_message(&constraint).to_string());
            }
        }
        ServiceError::Database(err)
    }
}

/// Client-facing message for a named unique constraint.
fn conflict_message(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "User already exists",
        "user_groups_user_id_group_id_key" => "User is already a member of this group",
        "schedules_one_active_per_child" => "Another schedule for this child is already active",
        "group_invites_invite_code_key" => "Invite code collision, please retry",
        "menus_unique_slot" => "A menu already exists for this date, meal and child",
        _ => "Resource already exists",
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_constraints_have_specific_messages() {
        assert_eq!(conflict_message("users_email_key"), "User already exists");
        assert_eq!(
            conflict_message("schedules_one_active_per_child"),
            "Another schedule for this child is already active"
        );
        assert_eq!(conflict_message("something_else"), "Resource already exists");
    }

    #[test]
    fn non_database_sqlx_errors_stay_database_errors() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ServiceError::Database(sqlx::Error::RowNotFound)));
    }
}
