// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::{extract::State, http::HeaderMap};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::cookie::{read_cookie, REFRESH_COOKIE};
use crate::auth::{generate_jwt, validate_jwt, Claims, TokenKind};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

/// POST /api/auth/refresh - Exchange the refresh cookie for a new access token
pub async fn refresh_post(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Value> {
    let security = &state.config.security;

    let token = read_cookie(&headers, REFRESH_COOKIE)
        .ok_or_else(|| ApiError::bad_request("Refresh token is required"))?;

    let claims = validate_jwt(&token, TokenKind::Refresh, security).map_err(|e| {
        tracing::warn!("Rejected refresh token: {}", e);
        ApiError::unauthorized("Invalid or expired refresh token")
    })?;

    let users = UserService::new(state.pool.clone());
    let user = users
        .find(claims.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    // Keep the token's group while the user still belongs to it
    let membership = match claims.group_id {
        Some(group_id) => match users.membership_role(user.id, group_id).await? {
            Some(role) => Some((group_id, role)),
            None => users.default_membership(user.id).await?,
        },
        None => users.default_membership(user.id).await?,
    };

    let access = Claims::new(
        TokenKind::Access,
        user.id,
        user.email,
        user.auth_provider,
        membership,
        security,
    );

    Ok(ApiResponse::success(json!({
        "accessToken": generate_jwt(&access, security)?,
    })))
}
