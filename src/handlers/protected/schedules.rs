// handlers/protected/schedules.rs - /api/schedules and /api/schedule-items handlers
//
// Access follows the group of the schedule's child, not the token's active group.

use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::schedule::{
    CopySchedule, NewSchedule, NewScheduleItem, ScheduleItemPatch, ScheduleUpdate,
};
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::ScheduleService;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleListQuery {
    pub child_id: Option<i32>,
}

/// GET /api/schedules?childId= - Schedules of a child
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiQuery(query): ApiQuery<ScheduleListQuery>,
) -> ApiResult<Value> {
    let schedules = ScheduleService::new(state.pool.clone())
        .list(auth_user.user_id, query.child_id)
        .await?;
    Ok(ApiResponse::success(json!({ "schedules": schedules })))
}

/// GET /api/schedules/:id - Schedule with items ordered by start time
pub async fn get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    let (schedule, items) = ScheduleService::new(state.pool.clone())
        .get(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::success(json!({ "schedule": schedule, "items": items })))
}

/// POST /api/schedules
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiJson(payload): ApiJson<NewSchedule>,
) -> ApiResult<Value> {
    let schedule = ScheduleService::new(state.pool.clone())
        .create(auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::created(json!({ "schedule": schedule })))
}

/// PUT /api/schedules/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ScheduleUpdate>,
) -> ApiResult<Value> {
    let schedule = ScheduleService::new(state.pool.clone())
        .update(auth_user.user_id, id, payload)
        .await?;
    Ok(ApiResponse::success(json!({ "schedule": schedule })))
}

/// POST /api/schedules/:id/activate - Make this the child's only active schedule
pub async fn activate(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    ScheduleService::new(state.pool.clone())
        .activate(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Schedule activated successfully" })))
}

/// DELETE /api/schedules/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    ScheduleService::new(state.pool.clone())
        .delete(auth_user.user_id, id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Schedule deleted successfully" })))
}

/// POST /api/schedules/:id/copy - Copy a schedule and its items to another child
pub async fn copy(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<CopySchedule>,
) -> ApiResult<Value> {
    let schedule = ScheduleService::new(state.pool.clone())
        .copy(auth_user.user_id, id, payload)
        .await?;
    Ok(ApiResponse::created(json!({ "schedule": schedule })))
}

/// POST /api/schedules/:id/items
pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<NewScheduleItem>,
) -> ApiResult<Value> {
    let item = ScheduleService::new(state.pool.clone())
        .create_item(auth_user.user_id, id, payload)
        .await?;
    Ok(ApiResponse::created(json!({ "item": item })))
}

/// PATCH /api/schedule-items/:itemId
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(item_id): ApiPath<i32>,
    ApiJson(patch): ApiJson<ScheduleItemPatch>,
) -> ApiResult<Value> {
    let item = ScheduleService::new(state.pool.clone())
        .update_item(auth_user.user_id, item_id, patch)
        .await?;
    Ok(ApiResponse::success(json!({ "item": item })))
}

/// DELETE /api/schedule-items/:itemId
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    ApiPath(item_id): ApiPath<i32>,
) -> ApiResult<Value> {
    ScheduleService::new(state.pool.clone())
        .delete_item(auth_user.user_id, item_id)
        .await?;
    Ok(ApiResponse::success(json!({ "message": "Schedule item deleted successfully" })))
}
