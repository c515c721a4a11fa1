// handlers/protected/children.rs - /api/children handlers (active group)

use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ActiveGroup, ApiResponse, ApiResult, AuthUser};
use crate::services::access::ensure_member;
use crate::services::ChildService;

#[derive(Debug, Deserialize)]
pub struct ChildRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildListQuery {
    pub group_id: Option<i32>,
}

/// POST /api/children - Add a child to the active group
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<ChildRequest>,
) -> ApiResult<Value> {
    let child = ChildService::new(state.pool.clone())
        .create(group.id, auth_user.user_id, payload.name)
        .await?;
    Ok(ApiResponse::created(json!({
        "message": "Child created successfully",
        "child": child,
    })))
}

/// GET /api/children - Children of the active group, or of `groupId` when the caller belongs to it
pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiQuery(query): ApiQuery<ChildListQuery>,
) -> ApiResult<Value> {
    let group_id = match query.group_id {
        Some(requested) if requested != group.id => {
            ensure_member(&state.pool, auth_user.user_id, requested).await?;
            requested
        }
        _ => group.id,
    };

    let children = ChildService::new(state.pool.clone()).list(group_id).await?;
    Ok(ApiResponse::success(json!({ "children": children })))
}

/// GET /api/children/:childId
pub async fn get(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(child_id): ApiPath<i32>,
) -> ApiResult<Value> {
    let child = ChildService::new(state.pool.clone()).get(group.id, child_id).await?;
    Ok(ApiResponse::success(json!({ "child": child })))
}

/// PATCH /api/children/:childId - Rename a child
pub async fn update(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(child_id): ApiPath<i32>,
    ApiJson(payload): ApiJson<ChildRequest>,
) -> ApiResult<Value> {
    let child = ChildService::new(state.pool.clone())
        .update(group.id, child_id, payload.name)
        .await?;
    Ok(ApiResponse::success(json!({
        "message": "Child updated successfully",
        "child": child,
    })))
}

/// DELETE /api/children/:childId
pub async fn delete(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(child_id): ApiPath<i32>,
) -> ApiResult<Value> {
    ChildService::new(state.pool.clone()).delete(group.id, child_id).await?;
    Ok(ApiResponse::success(json!({ "message": "Child deleted successfully" })))
}
