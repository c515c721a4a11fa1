// handlers/protected/groups.rs - /api/groups handlers
//
// Groups are addressed by path, so these routes check membership per call
// instead of relying on the token's active group.

use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::GroupService;

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub invite_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: Option<String>,
}

/// POST /api/groups - Create a group owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<CreateGroupRequest>,
) -> ApiResult<Value> {
    let group = GroupService::new(state.pool.clone())
        .create(auth_user.user_id, payload.name)
        .await?;
    Ok(ApiResponse::created(json!({
        "message": "Group created successfully",
        "group": group,
    })))
}

/// GET /api/groups - Groups the caller belongs to
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    let groups = GroupService::new(state.pool.clone())
        .list_for_user(auth_user.user_id)
        .await?;
    Ok(ApiResponse::success(json!({ "groups": groups })))
}

/// GET /api/groups/:groupId - Group details and members
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(group_id): ApiPath<i32>,
) -> ApiResult<Value> {
    let (group, members) = GroupService::new(state.pool.clone())
        .get(auth_user.user_id, group_id)
        .await?;
    Ok(ApiResponse::success(json!({ "group": group, "members": members })))
}

/// DELETE /api/groups/:groupId - Delete a group (owner only)
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(group_id): ApiPath<i32>,
) -> ApiResult<Value> {
    GroupService::new(state.pool.clone())
        .delete(auth_user.user_id, group_id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Group deleted successfully" })))
}

/// POST /api/groups/:groupId/invite - Generate an invite code (owner only)
pub async fn invite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(group_id): ApiPath<i32>,
) -> ApiResult<Value> {
    let invite = GroupService::new(state.pool.clone())
        .create_invite(auth_user.user_id, group_id, state.config.groups.invite_expiry_days)
        .await?;
    Ok(ApiResponse::success(json!({
        "invite_code": invite.invite_code,
        "expiresAt": invite.expires_at,
        "groupId": invite.group_id,
        "message": "Invite code generated successfully",
    })))
}

/// POST /api/groups/invite/accept - Join a group with an invite code
pub async fn accept_invite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<AcceptInviteRequest>,
) -> ApiResult<Value> {
    let group = GroupService::new(state.pool.clone())
        .accept_invite(auth_user.user_id, payload.invite_code)
        .await?;
    Ok(ApiResponse::success(json!({
        "message": "Successfully joined the group",
        "group": group,
    })))
}

/// POST /api/groups/:groupId/members - Add an existing user by email (owner only)
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(group_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> ApiResult<Value> {
    let member = GroupService::new(state.pool.clone())
        .add_member(auth_user.user_id, group_id, payload.email, payload.role)
        .await?;
    Ok(ApiResponse::created(json!({
        "message": "Member added successfully",
        "member": member,
    })))
}

/// DELETE /api/groups/:groupId/members/:memberId - Remove a member (owner only)
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath((group_id, member_id)): ApiPath<(i32, i32)>,
) -> ApiResult<Value> {
    GroupService::new(state.pool.clone())
        .remove_member(auth_user.user_id, group_id, member_id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Member removed successfully" })))
}

/// PATCH /api/groups/:groupId/members/:memberId - Change a member's role (owner only)
pub async fn change_role(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath((group_id, member_id)): ApiPath<(i32, i32)>,
    ApiJson(payload): ApiJson<ChangeRoleRequest>,
) -> ApiResult<Value> {
    let role = GroupService::new(state.pool.clone())
        .change_role(auth_user.user_id, group_id, member_id, payload.role)
        .await?;
    Ok(ApiResponse::success(json!({
        "message": "Member role updated successfully",
        "role": role,
    })))
}
