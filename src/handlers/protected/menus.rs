// handlers/protected/menus.rs - /api/menus handlers (active group)

use axum::extract::{Extension, State};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::database::models::menu::{
    LegacyMenuDocument, LegacyPayload, MenuFilter, MenuUpdate, NewMenu, Substitution,
};
use crate::database::models::MenuView;
use crate::handlers::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{ActiveGroup, ApiResponse, ApiResult, AuthUser};
use crate::services::MenuService;

#[derive(Debug, Deserialize)]
pub struct LegacyQuery {
    pub date: Option<NaiveDate>,
}

/// GET /api/menus - Menus with items, filtered by `date` and `childId`
pub async fn list(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiQuery(filter): ApiQuery<MenuFilter>,
) -> ApiResult<Vec<MenuView>> {
    let menus = MenuService::new(state.pool.clone()).list(group.id, &filter).await?;
    Ok(ApiResponse::success(menus))
}

/// GET /api/menus/dates - Distinct dates that have menus, ascending
pub async fn dates(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
) -> ApiResult<Value> {
    let dates = MenuService::new(state.pool.clone()).dates(group.id).await?;
    Ok(ApiResponse::success(json!({ "dates": dates })))
}

/// GET /api/menus/bydate/:date
pub async fn by_date(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(date): ApiPath<NaiveDate>,
) -> ApiResult<Vec<MenuView>> {
    let menus = MenuService::new(state.pool.clone()).by_date(group.id, date).await?;
    Ok(ApiResponse::success(menus))
}

/// GET /api/menus/:id
pub async fn get(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone()).get(group.id, id).await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus - Create a menu with its items
pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<NewMenu>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone())
        .create(group.id, auth_user.user_id, payload)
        .await?;
    Ok(ApiResponse::created(menu))
}

/// PUT /api/menus/:id - Update a menu; allocated items are kept as they are
pub async fn update(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<MenuUpdate>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone()).update(group.id, id, payload).await?;
    Ok(ApiResponse::success(menu))
}

/// DELETE /api/menus/:id
pub async fn delete(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResult<Value> {
    MenuService::new(state.pool.clone()).delete(group.id, id).await?;
    Ok(ApiResponse::success(json!({ "message": "Menu deleted successfully" })))
}

/// POST /api/menus/:menuId/items/:itemId/allocate - Take the item's food out of stock
pub async fn allocate(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath((menu_id, item_id)): ApiPath<(i32, i32)>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone())
        .allocate(group.id, menu_id, item_id)
        .await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus/:menuId/items/:itemId/deallocate - Return the item's food to stock
pub async fn deallocate(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath((menu_id, item_id)): ApiPath<(i32, i32)>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone())
        .deallocate(group.id, menu_id, item_id)
        .await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus/:menuId/items/:itemId/substitute - Swap the item's food
pub async fn substitute(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiPath((menu_id, item_id)): ApiPath<(i32, i32)>,
    ApiJson(payload): ApiJson<Substitution>,
) -> ApiResult<MenuView> {
    let menu = MenuService::new(state.pool.clone())
        .substitute(group.id, menu_id, item_id, payload)
        .await?;
    Ok(ApiResponse::success(menu))
}

/// POST /api/menus/legacy - Import one legacy document or an array of them
pub async fn legacy_import(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(group): Extension<ActiveGroup>,
    ApiJson(payload): ApiJson<LegacyPayload>,
) -> ApiResult<Value> {
    let menus = MenuService::new(state.pool.clone())
        .import_legacy(group.id, auth_user.user_id, payload.into_documents())
        .await?;
    Ok(ApiResponse::created(json!({ "menus": menus })))
}

/// GET /api/menus/legacy - Menus grouped by date in the legacy document shape
pub async fn legacy_export(
    State(state): State<AppState>,
    Extension(group): Extension<ActiveGroup>,
    ApiQuery(query): ApiQuery<LegacyQuery>,
) -> ApiResult<Vec<LegacyMenuDocument>> {
    let documents = MenuService::new(state.pool.clone())
        .export_legacy(group.id, query.date)
        .await?;
    Ok(ApiResponse::success(documents))
}
