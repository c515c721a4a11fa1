// handlers/protected/alerts.rs - /api/alerts handlers (active group)

use axum::extract::{Extension, State};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::alert::{AlertPatch, NewAlert};
use crate::database::models::Alert;
use crate::handlers::extract::{ApiJson, ApiPath};
use crate::middleware::{ActiveGroup, ApiResponse, ApiResult, AuthUser};
use crate::services::AlertService;

/// GET /api/alerts - Alerts visible to the caller, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
) -> ApiResult<Vec<Alert>> {
    let alerts = AlertService::new(state.pool.clone())
        .list(group.id, auth_user.user_id, false)
        .await?;
    Ok(ApiResponse::success(alerts))
}

/// GET /api/alerts/active
pub async fn list_active(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
) -> ApiResult<Vec<Alert>> {
    let alerts = AlertService::new(state.pool.clone())
        .list(group.id, auth_user.user_id, true)
        .await?;
    Ok(ApiResponse::success(alerts))
}

/// GET /api/alerts/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Alert> {
    let alert = AlertService::new(state.pool.clone())
        .get(group.id, auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::success(alert))
}

/// POST /api/alerts
pub async fn create(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<NewAlert>,
) -> ApiResult<Alert> {
    let alert = AlertService::new(state.pool.clone()).create(group.id, payload).await?;
    Ok(ApiResponse::created(alert))
}

/// PATCH /api/alerts/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<AlertPatch>,
) -> ApiResult<Alert> {
    let alert = AlertService::new(state.pool.clone())
        .update(group.id, auth_user.user_id, id, patch)
        .await?;
    Ok(ApiResponse::success(alert))
}

/// DELETE /api/alerts/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    AlertService::new(state.pool.clone())
        .delete(group.id, auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Alert deleted successfully" })))
}
