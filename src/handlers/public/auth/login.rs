// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{cookie::refresh_cookie, issue_token_pair};
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /api/auth/login - Authenticate with email and password
///
/// The token's active group is the user's earliest membership.
pub async fn login_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<Value> {
    let security = &state.config.security;
    let users = UserService::new(state.pool.clone());

    let user = users.authenticate(payload.email, payload.password).await?;
    let membership = users.default_membership(user.id).await?;

    let (access_token, refresh_token) =
        issue_token_pair(user.id, &user.email, &user.auth_provider, membership, security)?;

    tracing::info!("User {} logged in", user.id);

    Ok(ApiResponse::success(json!({
        "message": "Login successful",
        "user": user,
        "groupId": membership.map(|(id, _)| id),
        "role": membership.map(|(_, role)| role),
        "accessToken": access_token,
    }))
    .with_cookie(refresh_cookie(&refresh_token, security)))
}
