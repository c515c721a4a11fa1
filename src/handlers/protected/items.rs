// handlers/protected/items.rs - /api/items handlers (food inventory of the active group)

use axum::extract::{Extension, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::food::{FoodPatch, NewFood};
use crate::database::models::Food;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ActiveGroup, ApiResponse, ApiResult};
use crate::services::{FoodFilter, FoodService};

#[derive(Debug, Deserialize)]
pub struct DeleteManyRequest {
    #[serde(default)]
    pub ids: Vec<i32>,
}

/// GET /api/items - Inventory ordered by name, optionally filtered by `type` and `inStock`
pub async fn list(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiQuery(filter): ApiQuery<FoodFilter>,
) -> ApiResult<Vec<Food>> {
    let items = FoodService::new(state.pool.clone()).list(group.id, &filter).await?;
    Ok(ApiResponse::success(items))
}

/// GET /api/items/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Food> {
    let item = FoodService::new(state.pool.clone()).get(group.id, id).await?;
    Ok(ApiResponse::success(item))
}

/// POST /api/items - Add a food item
pub async fn create(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<NewFood>,
) -> ApiResult<Food> {
    let item = FoodService::new(state.pool.clone()).create(group.id, payload).await?;
    Ok(ApiResponse::created(item))
}

/// PATCH /api/items/:id - Partial update
pub async fn update(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(patch): ApiJson<FoodPatch>,
) -> ApiResult<Food> {
    let item = FoodService::new(state.pool.clone()).update(group.id, id, patch).await?;
    Ok(ApiResponse::success(item))
}

/// DELETE /api/items/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    FoodService::new(state.pool.clone()).delete(group.id, id).await?;
    Ok(ApiResponse::success(json!({ "message": "Food item deleted successfully" })))
}

/// DELETE /api/items and POST /api/items/delete-multiple - Bulk delete by id
pub async fn delete_many(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<DeleteManyRequest>,
) -> ApiResult<Value> {
    let deleted = FoodService::new(state.pool.clone())
        .delete_many(group.id, &payload.ids)
        .await?;
    Ok(ApiResponse::success(json!({
        "message": format!("Deleted {} food items", deleted),
        "deleted": deleted,
    })))
}
