use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::normalize_email;
use crate::database::models::{Group, GroupInvite, GroupMember, GroupSummary, Role};

use super::access::{ensure_member, ensure_owner, membership_role};
use super::error::{ServiceError, ServiceResult};

const INVITE_COLUMNS: &str = "id, invite_code, group_id, created_by, expires_at, used_by, used_at, created_at";

/// Groups, memberships and invite codes.
pub struct GroupService {
    pool: PgPool,
}

impl GroupService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i32, name: Option<String>) -> ServiceResult<Group> {
        let name = required_name(name)?;

        let mut tx = self.pool.begin().await?;
        let group: Group = sqlx::query_as(
            "INSERT INTO groups (name, owner_id) VALUES ($1, $2) RETURNING id, name, owner_id, created_at",
        )
        .bind(&name)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO user_groups (user_id, group_id, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(group.id)
            .bind(Role::Owner.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("User {} created group {}", user_id, group.id);
        Ok(group)
    }

    /// Groups the user belongs to, newest first.
    pub async fn list_for_user(&self, user_id: i32) -> ServiceResult<Vec<GroupSummary>> {
        let groups = sqlx::query_as(
            "SELECT g.id, g.name, g.owner_id, ug.role, g.created_at,
                    (SELECT COUNT(*) FROM user_groups m WHERE m.group_id = g.id) AS member_count
             FROM groups g
             JOIN user_groups ug ON ug.group_id = g.id AND ug.user_id = $1
             ORDER BY g.created_at DESC, g.id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(groups)
    }

    async fn find(&self, group_id: i32) -> ServiceResult<Group> {
        sqlx::query_as("SELECT id, name, owner_id, created_at FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Group not found"))
    }

    /// Group details with members, owners first.
    pub async fn get(&self, user_id: i32, group_id: i32) -> ServiceResult<(Group, Vec<GroupMember>)> {
        let group = self.find(group_id).await?;
        ensure_member(&self.pool, user_id, group_id).await?;

        let members = sqlx::query_as(
            "SELECT u.id, u.email, u.first_name, u.last_name, ug.role
             FROM user_groups ug
             JOIN users u ON u.id = ug.user_id
             WHERE ug.group_id = $1
             ORDER BY ug.role DESC, u.email ASC",
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((group, members))
    }

    /// Deletes the group; memberships, invites and all group data cascade.
    pub async fn delete(&self, user_id: i32, group_id: i32) -> ServiceResult<()> {
        self.find(group_id).await?;
        ensure_owner(&self.pool, user_id, group_id, "delete the group").await?;

        sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await?;

        tracing::info!("User {} deleted group {}", user_id, group_id);
        Ok(())
    }

    pub async fn create_invite(&self, user_id: i32, group_id: i32, expiry_days: i64) -> ServiceResult<GroupInvite> {
        self.find(group_id).await?;
        ensure_owner(&self.pool, user_id, group_id, "generate invite codes").await?;

        let invite = sqlx::query_as(&format!(
            "INSERT INTO group_invites (invite_code, group_id, created_by, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            INVITE_COLUMNS
        ))
        .bind(generate_invite_code())
        .bind(group_id)
        .bind(user_id)
        .bind(Utc::now() + Duration::days(expiry_days))
        .fetch_one(&self.pool)
        .await?;

        Ok(invite)
    }

    /// Joins the invite's group. The invite row is locked and consumed inside the
    /// same transaction as the membership insert.
    pub async fn accept_invite(&self, user_id: i32, code: Option<String>) -> ServiceResult<Group> {
        let code = code
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ServiceError::validation("Invite code is required"))?;

        let mut tx = self.pool.begin().await?;

        let invite: GroupInvite = sqlx::query_as(&format!(
            "SELECT {} FROM group_invites WHERE invite_code = $1 FOR UPDATE",
            INVITE_COLUMNS
        ))
        .bind(&code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::validation("Invalid invite code"))?;

        if invite.used_by.is_some() || invite.used_at.is_some() {
            return Err(ServiceError::validation("Invite code has already been used"));
        }
        if !invite.is_usable(Utc::now()) {
            return Err(ServiceError::validation("Invite code has expired"));
        }
        if membership_role(&mut *tx, user_id, invite.group_id).await?.is_some() {
            return Err(ServiceError::validation("You are already a member of this group"));
        }

        sqlx::query("INSERT INTO user_groups (user_id, group_id, role) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(invite.group_id)
            .bind(Role::Member.as_str())
            .execute(&mut *tx)
            .await?;

        let consumed = sqlx::query(
            "UPDATE group_invites SET used_by = $1, used_at = NOW() WHERE id = $2 AND used_by IS NULL",
        )
        .bind(user_id)
        .bind(invite.id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            return Err(ServiceError::validation("Invite code has already been used"));
        }

        let group: Group = sqlx::query_as("SELECT id, name, owner_id, created_at FROM groups WHERE id = $1")
            .bind(invite.group_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!("User {} joined group {} by invite", user_id, group.id);
        Ok(group)
    }

    pub async fn add_member(
        &self,
        owner_id: i32,
        group_id: i32,
        email: Option<String>,
        role: Option<String>,
    ) -> ServiceResult<GroupMember> {
        let email = email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ServiceError::validation("Email is required"))?;
        let role = parse_role(role.as_deref().unwrap_or("member"))?;

        self.find(group_id).await?;
        ensure_owner(&self.pool, owner_id, group_id, "add members").await?;

        let user: (i32, String, Option<String>, Option<String>) =
            sqlx::query_as("SELECT id, email, first_name, last_name FROM users WHERE email = $1")
                .bind(&email)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| ServiceError::not_found("User not found"))?;

        sqlx::query("INSERT INTO user_groups (user_id, group_id, role) VALUES ($1, $2, $3)")
            .bind(user.0)
            .bind(group_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await?;

        Ok(GroupMember {
            id: user.0,
            email: user.1,
            first_name: user.2,
            last_name: user.3,
            role,
        })
    }

    pub async fn remove_member(&self, owner_id: i32, group_id: i32, member_id: i32) -> ServiceResult<()> {
        self.find(group_id).await?;
        ensure_owner(&self.pool, owner_id, group_id, "remove members").await?;

        if member_id == owner_id {
            return Err(ServiceError::validation("You cannot remove yourself from the group"));
        }

        let removed = sqlx::query("DELETE FROM user_groups WHERE user_id = $1 AND group_id = $2")
            .bind(member_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(ServiceError::not_found("Member not found in this group"));
        }
        Ok(())
    }

    /// Changes a member's role. A group always keeps at least one owner.
    pub async fn change_role(
        &self,
        owner_id: i32,
        group_id: i32,
        member_id: i32,
        role: Option<String>,
    ) -> ServiceResult<Role> {
        let role = parse_role(
            role.as_deref()
                .ok_or_else(|| ServiceError::validation("Role is required"))?,
        )?;

        self.find(group_id).await?;
        ensure_owner(&self.pool, owner_id, group_id, "change member roles").await?;

        let mut tx = self.pool.begin().await?;

        // Lock the group's owner rows so concurrent demotions serialize
        let owners: Vec<i32> = sqlx::query_scalar(
            "SELECT user_id FROM user_groups WHERE group_id = $1 AND role = 'owner' FOR UPDATE",
        )
        .bind(group_id)
        .fetch_all(&mut *tx)
        .await?;

        let current = membership_role(&mut *tx, member_id, group_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Member not found in this group"))?;

        if current == Role::Owner && role == Role::Member && owners.len() <= 1 {
            return Err(ServiceError::validation("Cannot demote the last owner of the group"));
        }

        sqlx::query("UPDATE user_groups SET role = $1 WHERE user_id = $2 AND group_id = $3")
            .bind(role.as_str())
            .bind(member_id)
            .bind(group_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(role)
    }

    /// Deletes used or expired invite codes. Returns the number removed.
    pub async fn purge_invites(&self) -> ServiceResult<u64> {
        let result = sqlx::query(
            "DELETE FROM group_invites WHERE used_by IS NOT NULL OR used_at IS NOT NULL OR expires_at <= NOW()",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

fn required_name(name: Option<String>) -> ServiceResult<String> {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::validation("Group name is required"))
}

fn parse_role(raw: &str) -> ServiceResult<Role> {
    raw.parse::<Role>()
        .map_err(|e| ServiceError::invalid_field("role", e.to_string()))
}

/// 32 lowercase hex characters.
pub fn generate_invite_code() -> String {
    Uuid::new_v4().simple().to_string()
}
