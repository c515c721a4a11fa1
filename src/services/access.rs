use sqlx::PgExecutor;

use crate::database::models::Role;

use super::error::{ServiceError, ServiceResult};

/// Role of `user_id` in `group_id`, if they are a member.
pub async fn membership_role<'e, E>(executor: E, user_id: i32, group_id: i32) -> ServiceResult<Option<Role>>
where
    E: PgExecutor<'e>,
{
    let role: Option<String> =
        sqlx::query_scalar("SELECT role FROM user_groups WHERE user_id = $1 AND group_id = $2")
            .bind(user_id)
            .bind(group_id)
            .fetch_optional(executor)
            .await?;

    role.map(|r| r.parse::<Role>())
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()))
}

pub async fn ensure_member<'e, E>(executor: E, user_id: i32, group_id: i32) -> ServiceResult<Role>
where
    E: PgExecutor<'e>,
{
    match membership_role(executor, user_id, group_id).await? {
        Some(role) => {
            tracing::debug!("User {} is {} of group {}", user_id, role, group_id);
            Ok(role)
        }
        None => {
            tracing::warn!("User {} denied access to group {}", user_id, group_id);
            Err(ServiceError::forbidden("Access denied"))
        }
    }
}

pub async fn ensure_owner<'e, E>(executor: E, user_id: i32, group_id: i32, action: &str) -> ServiceResult<()>
where
    E: PgExecutor<'e>,
{
    match membership_role(executor, user_id, group_id).await? {
        Some(Role::Owner) => Ok(()),
        Some(Role::Member) => {
            tracing::warn!("User {} is not an owner of group {}", user_id, group_id);
            Err(ServiceError::forbidden(format!("Only group owners can {}", action)))
        }
        None => {
            tracing::warn!("User {} denied access to group {}", user_id, group_id);
            Err(ServiceError::forbidden("Access denied"))
        }
    }
}

/// Earliest membership of a user, used as the default active group.
pub async fn default_membership<'e, E>(executor: E, user_id: i32) -> ServiceResult<Option<(i32, Role)>>
where
    E: PgExecutor<'e>,
{
    let row: Option<(i32, String)> = sqlx::query_as(
        "SELECT group_id, role FROM user_groups WHERE user_id = $1 ORDER BY joined_at ASC, id ASC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    row.map(|(group_id, role)| role.parse::<Role>().map(|role| (group_id, role)))
        .transpose()
        .map_err(|e| ServiceError::Validation(e.to_string()))
}
