use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::Profile;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::user_service::ProfileUpdate;
use crate::services::UserService;

/// GET /api/auth/profile - Current user with group memberships
pub async fn profile_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Profile> {
    let profile = UserService::new(state.pool.clone())
        .profile(auth_user.user_id)
        .await?;
    Ok(ApiResponse::success(profile))
}

/// PUT /api/auth/profile - Update email and names
pub async fn profile_put(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<ProfileUpdate>,
) -> ApiResult<Value> {
    let profile = UserService::new(state.pool.clone())
        .update_profile(auth_user.user_id, payload)
        .await?;

    let mut body = serde_json::to_value(profile).map_err(|e| {
        tracing::error!("Failed to serialize profile: {}", e);
        crate::error::ApiError::internal_server_error("Failed to serialize profile")
    })?;
    body["message"] = json!("Profile updated successfully");
    Ok(ApiResponse::success(body))
}
