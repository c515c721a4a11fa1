// handlers/public/auth/register.rs - POST /api/auth/register handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::{cookie::refresh_cookie, issue_token_pair};
use crate::database::models::Role;
use crate::handlers::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_service::Registration;
use crate::services::UserService;

/// POST /api/auth/register - Create an account and its default family group
///
/// Responds 201 with the user, the new group and an access token. The refresh
/// token is set as an httpOnly cookie.
pub async fn register_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> ApiResult<Value> {
    let security = &state.config.security;
    let (user, group) = UserService::new(state.pool.clone())
        .register(payload, security)
        .await?;

    let (access_token, refresh_token) = issue_token_pair(
        user.id,
        &user.email,
        &user.auth_provider,
        Some((group.id, Role::Owner)),
        security,
    )?;

    tracing::info!("Registered user {} with group {}", user.id, group.id);

    Ok(ApiResponse::created(json!({
        "message": "User registered successfully",
        "user": user,
        "group": { "id": group.id, "name": group.name },
        "accessToken": access_token,
    }))
    .with_cookie(refresh_cookie(&refresh_token, security)))
}
