// handlers/public/auth/logout.rs - POST /api/auth/logout handler

use axum::extract::State;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::cookie::clear_refresh_cookie;
use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/auth/logout - Clear the refresh cookie
pub async fn logout_post(State(state): State<AppState>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "message": "Logged out successfully" }))
        .with_cookie(clear_refresh_cookie(&state.config.security)))
}
