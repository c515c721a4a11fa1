// handlers/protected/feed.rs - /api/feed handlers (feed-tracking database)

use axum::extract::State;
use serde_json::Value;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::FeedService;

/// GET /api/feed/latest - Most recent nappy log entries
pub async fn latest(State(state): State<AppState>) -> ApiResult<Vec<Value>> {
    let pool = state
        .feedsync
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("Feed tracking database is not configured"))?;
    let entries = FeedService::new(pool).latest().await?;
    Ok(ApiResponse::success(entries))
}
