use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::password::{self, hash_password, is_valid_email, normalize_email, verify_password};
use crate::config::SecurityConfig;
use crate::database::models::group::GroupMembership;
use crate::database::models::user::LOCAL_PROVIDER;
use crate::database::models::{Group, Profile, Role, User};

use super::access;
use super::error::{ServiceError, ServiceResult};

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, auth_provider, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub auth_provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Accounts, credentials and profiles.
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the user, a default group and the owner membership in one transaction.
    pub async fn register(&self, input: Registration, security: &SecurityConfig) -> ServiceResult<(User, Group)> {
        let email = input
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ServiceError::validation("Email and password are required"))?;
        let provider = input
            .auth_provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(LOCAL_PROVIDER)
            .to_string();

        if !is_valid_email(&email) {
            return Err(ServiceError::invalid_field("email", "Invalid email address"));
        }

        let password_hash = if provider == LOCAL_PROVIDER {
            let password = input
                .password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| ServiceError::validation("Email and password are required"))?;
            password::validate_password(&password, security.min_password_length)?;
            Some(hash_password(password, security.bcrypt_cost).await?)
        } else {
            None
        };

        let mut tx = self.pool.begin().await?;

        let user: User = sqlx::query_as(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, auth_provider)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(&password_hash)
        .bind(trimmed(input.first_name))
        .bind(trimmed(input.last_name))
        .bind(&provider)
        .fetch_one(&mut *tx)
        .await?;

        let group: Group = sqlx::query_as(
            "INSERT INTO groups (name, owner_id) VALUES ($1, $2) RETURNING id, name, owner_id, created_at",
        )
        .bind(format!("{}'s Family", user.display_name()))
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_groups (user_id, group_id, role) VALUES ($1, $2, $3)")
            .bind(user.id)
            .bind(group.id)
            .bind(Role::Owner.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("Registered user {} with default group {}", user.id, group.id);
        Ok((user, group))
    }

    /// Checks credentials. Every failure is the same 401 so accounts cannot be probed.
    pub async fn authenticate(&self, email: Option<String>, password: Option<String>) -> ServiceResult<User> {
        let (email, password) = match (email, password) {
            (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => (normalize_email(&e), p),
            _ => return Err(ServiceError::validation("Email and password are required")),
        };

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::unauthorized("Invalid credentials"))?;

        let Some(hash) = user.password_hash.clone() else {
            tracing::warn!("Password login attempted for {} account {}", user.auth_provider, user.id);
            return Err(ServiceError::unauthorized("Invalid credentials"));
        };

        if !verify_password(password, hash).await? {
            tracing::warn!("Failed login for user {}", user.id);
            return Err(ServiceError::unauthorized("Invalid credentials"));
        }

        Ok(user)
    }

    pub async fn find(&self, user_id: i32) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS))
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn default_membership(&self, user_id: i32) -> ServiceResult<Option<(i32, Role)>> {
        access::default_membership(&self.pool, user_id).await
    }

    pub async fn membership_role(&self, user_id: i32, group_id: i32) -> ServiceResult<Option<Role>> {
        access::membership_role(&self.pool, user_id, group_id).await
    }

    pub async fn profile(&self, user_id: i32) -> ServiceResult<Profile> {
        let user = self
            .find(user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;
        let groups = self.memberships(user_id).await?;
        Ok(Profile::new(user, groups))
    }

    pub async fn update_profile(&self, user_id: i32, input: ProfileUpdate) -> ServiceResult<Profile> {
        let email = input
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ServiceError::validation("Email is required"))?;
        if !is_valid_email(&email) {
            return Err(ServiceError::invalid_field("email", "Invalid email address"));
        }

        let updated: Option<User> = sqlx::query_as(&format!(
            "UPDATE users
             SET email = $1, first_name = $2, last_name = $3, updated_at = NOW()
             WHERE id = $4
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&email)
        .bind(trimmed(input.first_name))
        .bind(trimmed(input.last_name))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::conflict("Email is already in use"),
            other => other,
        })?;

        let user = updated.ok_or_else(|| ServiceError::not_found("User not found"))?;
        let groups = self.memberships(user_id).await?;
        Ok(Profile::new(user, groups))
    }

    async fn memberships(&self, user_id: i32) -> ServiceResult<Vec<GroupMembership>> {
        let groups = sqlx::query_as(
            "SELECT g.id, g.name, ug.role
             FROM user_groups ug
             JOIN groups g ON g.id = ug.group_id
             WHERE ug.user_id = $1
             ORDER BY ug.joined_at ASC, ug.id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
