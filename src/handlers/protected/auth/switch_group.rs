use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{generate_jwt, Claims, TokenKind};
use crate::error::ApiError;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchGroupRequest {
    pub group_id: Option<i32>,
}

/// POST /api/auth/switch-group - Issue an access token for another group
pub async fn switch_group_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<SwitchGroupRequest>,
) -> ApiResult<Value> {
    let group_id = payload
        .group_id
        .ok_or_else(|| ApiError::bad_request("groupId is required"))?;

    let role = UserService::new(state.pool.clone())
        .membership_role(auth_user.user_id, group_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("User {} tried to switch to group {}", auth_user.user_id, group_id);
            ApiError::forbidden("You are not a member of this group")
        })?;

    let claims = Claims::new(
        TokenKind::Access,
        auth_user.user_id,
        auth_user.email,
        auth_user.auth_provider,
        Some((group_id, role)),
        &state.config.security,
    );

    Ok(ApiResponse::success(json!({
        "accessToken": generate_jwt(&claims, &state.config.security)?,
        "groupId": group_id,
        "role": role,
    })))
}
