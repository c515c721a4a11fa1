use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::database::models::menu::{
    LegacyMenuDocument, MenuFilter, MenuUpdate, NewMenu, NewMenuItem, Substitution,
};
use crate::database::models::{Menu, MenuItemView, MenuView};

use super::error::{ServiceError, ServiceResult};

const MENU_COLUMNS: &str = "id, date, meal_type, child_id, group_id, created_by, created_at, updated_at";

// Breakfast, Lunch, Dinner, Snack within a day
const MEAL_ORDER: &str =
    "CASE meal_type WHEN 'Breakfast' THEN 0 WHEN 'Lunch' THEN 1 WHEN 'Dinner' THEN 2 ELSE 3 END";

/// Row of a menu item locked for an allocation change.
#[derive(Debug, sqlx::FromRow)]
struct LockedItem {
    id: i32,
    menu_id: i32,
    food_id: Option<i32>,
    quantity: i32,
    allocated: bool,
}

/// Menu planning plus the allocation workflow against food stock.
pub struct MenuService {
    pool: PgPool,
}

impl MenuService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, group_id: i32, filter: &MenuFilter) -> ServiceResult<Vec<MenuView>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM menus WHERE group_id = ", MENU_COLUMNS));
        query.push_bind(group_id);
        if let Some(date) = filter.date {
            query.push(" AND date = ").push_bind(date);
        }
        if let Some(child_id) = filter.child_id {
            query.push(" AND child_id = ").push_bind(child_id);
        }
        query.push(format!(" ORDER BY date ASC, {}, id ASC", MEAL_ORDER));

        let menus = query.build_query_as::<Menu>().fetch_all(&self.pool).await?;
        self.with_items(menus).await
    }

    /// Distinct menu dates, ascending.
    pub async fn dates(&self, group_id: i32) -> ServiceResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar("SELECT DISTINCT date FROM menus WHERE group_id = $1 ORDER BY date ASC")
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(dates)
    }

    pub async fn by_date(&self, group_id: i32, date: NaiveDate) -> ServiceResult<Vec<MenuView>> {
        let menus = self
            .list(group_id, &MenuFilter { date: Some(date), child_id: None })
            .await?;
        if menus.is_empty() {
            return Err(ServiceError::not_found(format!("No menus found for {}", date)));
        }
        Ok(menus)
    }

    pub async fn get(&self, group_id: i32, menu_id: i32) -> ServiceResult<MenuView> {
        let menu: Menu = sqlx::query_as(&format!("SELECT {} FROM menus WHERE id = $1 AND group_id = $2", MENU_COLUMNS))
            .bind(menu_id)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Menu not found"))?;

        self.with_items(vec![menu])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Menu not found"))
    }

    async fn with_items(&self, menus: Vec<Menu>) -> ServiceResult<Vec<MenuView>> {
        if menus.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = menus.iter().map(|m| m.id).collect();
        let items = sqlx::query_as(
            "SELECT mi.id, mi.menu_id, mi.food_id, COALESCE(mi.name, f.name) AS name,
                    mi.quantity, mi.allocated, mi.allocated_at, mi.sort_order,
                    f.quantity AS available
             FROM menu_items mi
             LEFT JOIN food f ON f.id = mi.food_id
             WHERE mi.menu_id = ANY($1)
             ORDER BY mi.menu_id, mi.sort_order ASC, mi.id ASC",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(MenuView::assemble(menus, items))
    }

    pub async fn create(&self, group_id: i32, user_id: i32, input: NewMenu) -> ServiceResult<MenuView> {
        let mut tx = self.pool.begin().await?;
        let menu_id = insert_menu(&mut tx, group_id, user_id, &input).await?;
        tx.commit().await?;

        tracing::debug!("Created menu {} in group {}", menu_id, group_id);
        self.get(group_id, menu_id).await
    }

    /// Updates menu fields and replaces its unallocated items. Allocated items stay;
    /// an entry referring to one must leave it unchanged.
    pub async fn update(&self, group_id: i32, menu_id: i32, input: MenuUpdate) -> ServiceResult<MenuView> {
        let mut tx = self.pool.begin().await?;

        let menu: Menu = sqlx::query_as(&format!(
            "SELECT {} FROM menus WHERE id = $1 AND group_id = $2 FOR UPDATE",
            MENU_COLUMNS
        ))
        .bind(menu_id)
        .bind(group_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ServiceError::not_found("Menu not found"))?;

        if let Some(child_id) = input.child_id {
            ensure_child_in_group(&mut tx, group_id, child_id).await?;
        }

        sqlx::query("UPDATE menus SET date = $1, meal_type = $2, child_id = $3, updated_at = NOW() WHERE id = $4")
            .bind(input.date.unwrap_or(menu.date))
            .bind(input.meal_type.unwrap_or(menu.meal_type).as_str())
            .bind(input.child_id.or(menu.child_id))
            .bind(menu_id)
            .execute(&mut *tx)
            .await?;

        if let Some(items) = input.items {
            let allocated: Vec<(i32, Option<i32>, i32)> = sqlx::query_as(
                "SELECT id, food_id, quantity FROM menu_items WHERE menu_id = $1 AND allocated",
            )
            .bind(menu_id)
            .fetch_all(&mut *tx)
            .await?;

            let mut replacements = Vec::with_capacity(items.len());
            for item in items {
                match item.id.and_then(|id| allocated.iter().find(|(a, _, _)| *a == id)) {
                    Some((_, food_id, quantity)) => {
                        let changed = item.food_id.is_some_and(|f| Some(f) != *food_id) || item.quantity != *quantity;
                        if changed {
                            return Err(ServiceError::conflict("Allocated menu items cannot be changed"));
                        }
                    }
                    None => replacements.push(item),
                }
            }

            validate_items(&mut tx, group_id, &replacements).await?;
            sqlx::query("DELETE FROM menu_items WHERE menu_id = $1 AND NOT allocated")
                .bind(menu_id)
                .execute(&mut *tx)
                .await?;
            let offset = allocated.len() as i32;
            insert_items(&mut tx, menu_id, &replacements, offset).await?;
        }

        tx.commit().await?;
        self.get(group_id, menu_id).await
    }

    /// Deletes a menu. Allocated stock is not returned.
    pub async fn delete(&self, group_id: i32, menu_id: i32) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM menus WHERE id = $1 AND group_id = $2")
            .bind(menu_id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::not_found("Menu not found"));
        }
        Ok(())
    }

    /// Marks an item consumed and takes its quantity out of stock.
    pub async fn allocate(&self, group_id: i32, menu_id: i32, item_id: i32) -> ServiceResult<MenuView> {
        let mut tx = self.pool.begin().await?;
        let item = lock_item(&mut tx, group_id, menu_id, item_id).await?;

        if item.allocated {
            return Err(ServiceError::conflict("Menu item is already allocated"));
        }
        let food_id = item
            .food_id
            .ok_or_else(|| ServiceError::validation("Menu item has no food to allocate"))?;

        // Conditional decrement: stock can never go below zero
        let taken = sqlx::query(
            "UPDATE food
             SET quantity = quantity - $1, last_allocated = CURRENT_DATE, updated_at = NOW()
             WHERE id = $2 AND group_id = $3 AND quantity >= $1",
        )
        .bind(item.quantity)
        .bind(food_id)
        .bind(group_id)
        .execute(&mut *tx)
        .await?;
        if taken.rows_affected() == 0 {
            tracing::debug!("Allocation of item {} refused: insufficient stock of food {}", item.id, food_id);
            return Err(ServiceError::conflict("Insufficient stock to allocate this item"));
        }

        sqlx::query("UPDATE menu_items SET allocated = TRUE, allocated_at = NOW() WHERE id = $1")
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        touch_menu(&mut tx, item.menu_id).await?;
        tx.commit().await?;

        tracing::info!("Allocated menu item {} ({} of food {})", item.id, item.quantity, food_id);
        self.get(group_id, menu_id).await
    }

    /// Reverses an allocation, restocking the food if it still exists.
    pub async fn deallocate(&self, group_id: i32, menu_id: i32, item_id: i32) -> ServiceResult<MenuView> {
        let mut tx = self.pool.begin().await?;
        let item = lock_item(&mut tx, group_id, menu_id, item_id).await?;

        if !item.allocated {
            return Err(ServiceError::conflict("Menu item is not allocated"));
        }
        if let Some(food_id) = item.food_id {
            sqlx::query("UPDATE food SET quantity = quantity + $1, updated_at = NOW() WHERE id = $2 AND group_id = $3")
                .bind(item.quantity)
                .bind(food_id)
                .bind(group_id)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE menu_items SET allocated = FALSE, allocated_at = NULL WHERE id = $1")
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        touch_menu(&mut tx, item.menu_id).await?;
        tx.commit().await?;

        self.get(group_id, menu_id).await
    }

    /// Points an unallocated item at another food from the group.
    pub async fn substitute(
        &self,
        group_id: i32,
        menu_id: i32,
        item_id: i32,
        input: Substitution,
    ) -> ServiceResult<MenuView> {
        let mut tx = self.pool.begin().await?;
        let item = lock_item(&mut tx, group_id, menu_id, item_id).await?;

        if item.allocated {
            return Err(ServiceError::conflict("Allocated menu items cannot be substituted"));
        }
        let quantity = input.quantity.unwrap_or(item.quantity);
        if quantity <= 0 {
            return Err(ServiceError::invalid_field("quantity", "Quantity must be greater than zero"));
        }

        let stock: i32 = sqlx::query_scalar("SELECT quantity FROM food WHERE id = $1 AND group_id = $2")
            .bind(input.food_id)
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::validation("Substitute food not found in this group"))?;
        if stock < quantity {
            return Err(ServiceError::validation("Substitute food is out of stock"));
        }

        sqlx::query("UPDATE menu_items SET food_id = $1, quantity = $2, name = NULL WHERE id = $3")
            .bind(input.food_id)
            .bind(quantity)
            .bind(item.id)
            .execute(&mut *tx)
            .await?;
        touch_menu(&mut tx, item.menu_id).await?;
        tx.commit().await?;

        self.get(group_id, menu_id).await
    }

    /// Imports legacy documents in one transaction; one menu per section.
    pub async fn import_legacy(
        &self,
        group_id: i32,
        user_id: i32,
        documents: Vec<LegacyMenuDocument>,
    ) -> ServiceResult<Vec<MenuView>> {
        if documents.is_empty() {
            return Err(ServiceError::validation("At least one menu document is required"));
        }

        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::new();
        for document in &documents {
            for menu in document.to_new_menus() {
                ids.push(insert_menu(&mut tx, group_id, user_id, &menu).await?);
            }
        }
        tx.commit().await?;

        tracing::info!("Imported {} legacy menus into group {}", ids.len(), group_id);
        let menus: Vec<Menu> = sqlx::query_as(&format!(
            "SELECT {} FROM menus WHERE id = ANY($1) ORDER BY date ASC, {}, id ASC",
            MENU_COLUMNS, MEAL_ORDER
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        self.with_items(menus).await
    }

    pub async fn export_legacy(&self, group_id: i32, date: Option<NaiveDate>) -> ServiceResult<Vec<LegacyMenuDocument>> {
        let views = self.list(group_id, &MenuFilter { date, child_id: None }).await?;
        Ok(LegacyMenuDocument::from_views(&views))
    }
}

async fn insert_menu(conn: &mut PgConnection, group_id: i32, user_id: i32, input: &NewMenu) -> ServiceResult<i32> {
    if let Some(child_id) = input.child_id {
        ensure_child_in_group(conn, group_id, child_id).await?;
    }
    validate_items(conn, group_id, &input.items).await?;

    let menu_id: i32 = sqlx::query_scalar(
        "INSERT INTO menus (date, meal_type, child_id, group_id, created_by)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id",
    )
    .bind(input.date)
    .bind(input.meal_type.as_str())
    .bind(input.child_id)
    .bind(group_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    insert_items(conn, menu_id, &input.items, 0).await?;
    Ok(menu_id)
}

async fn ensure_child_in_group(conn: &mut PgConnection, group_id: i32, child_id: i32) -> ServiceResult<()> {
    let found: Option<i32> = sqlx::query_scalar("SELECT id FROM children WHERE id = $1 AND group_id = $2")
        .bind(child_id)
        .bind(group_id)
        .fetch_optional(&mut *conn)
        .await?;
    found
        .map(|_| ())
        .ok_or_else(|| ServiceError::validation(format!("Child {} not found in this group", child_id)))
}

/// Quantities must be positive, foods must belong to the group, and an item
/// without a food needs a name.
async fn validate_items(conn: &mut PgConnection, group_id: i32, items: &[NewMenuItem]) -> ServiceResult<()> {
    for item in items {
        check_item_shape(item)?;
        if let Some(food_id) = item.food_id {
            let found: Option<i32> = sqlx::query_scalar("SELECT id FROM food WHERE id = $1 AND group_id = $2")
                .bind(food_id)
                .bind(group_id)
                .fetch_optional(&mut *conn)
                .await?;
            if found.is_none() {
                return Err(ServiceError::validation(format!("Food {} not found in this group", food_id)));
            }
        }
    }
    Ok(())
}

fn check_item_shape(item: &NewMenuItem) -> ServiceResult<()> {
    if item.quantity <= 0 {
        return Err(ServiceError::invalid_field("quantity", "Quantity must be greater than zero"));
    }
    let named = item.name.as_deref().is_some_and(|n| !n.trim().is_empty());
    if item.food_id.is_none() && !named {
        return Err(ServiceError::validation("Each menu item needs a foodId or a name"));
    }
    Ok(())
}

async fn insert_items(conn: &mut PgConnection, menu_id: i32, items: &[NewMenuItem], offset: i32) -> ServiceResult<()> {
    for (index, item) in items.iter().enumerate() {
        sqlx::query(
            "INSERT INTO menu_items (menu_id, food_id, name, quantity, sort_order) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(menu_id)
        .bind(item.food_id)
        .bind(item.name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
        .bind(item.quantity)
        .bind(offset + index as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn lock_item(conn: &mut PgConnection, group_id: i32, menu_id: i32, item_id: i32) -> ServiceResult<LockedItem> {
    sqlx::query_as(
        "SELECT mi.id, mi.menu_id, mi.food_id, mi.quantity, mi.allocated
         FROM menu_items mi
         JOIN menus m ON m.id = mi.menu_id
         WHERE mi.id = $1 AND mi.menu_id = $2 AND m.group_id = $3
         FOR UPDATE OF mi",
    )
    .bind(item_id)
    .bind(menu_id)
    .bind(group_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| ServiceError::not_found("Menu item not found"))
}

async fn touch_menu(conn: &mut PgConnection, menu_id: i32) -> ServiceResult<()> {
    sqlx::query("UPDATE menus SET updated_at = NOW() WHERE id = $1")
        .bind(menu_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::food::NewFood;
    use crate::database::models::MealType;
    use crate::services::FoodService;
    use crate::testing::TestContext;

    fn item(food_id: Option<i32>, quantity: i32, name: Option<&str>) -> NewMenuItem {
        NewMenuItem {
            id: None,
            food_id,
            quantity,
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn item_shape_rules() {
        assert!(check_item_shape(&item(Some(1), 1, None)).is_ok());
        assert!(check_item_shape(&item(None, 1, Some("Toast"))).is_ok());
        assert!(check_item_shape(&item(None, 1, Some("  "))).is_err());
        assert!(matches!(
            check_item_shape(&item(Some(1), 0, None)),
            Err(ServiceError::InvalidField { .. })
        ));
    }

    async fn stocked_food(ctx: &TestContext, group_id: i32, quantity: i32) -> i32 {
        FoodService::new(ctx.pool.clone())
            .create(
                group_id,
                NewFood {
                    name: "Lentils".into(),
                    quantity,
                    unit: Some("portion".into()),
                    food_type: None,
                    date_prepared: None,
                    expiry_date: None,
                    last_allocated: None,
                },
            )
            .await
            .unwrap()
            .id
    }

    fn lunch(items: Vec<NewMenuItem>) -> NewMenu {
        NewMenu {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            meal_type: MealType::Lunch,
            child_id: None,
            items,
        }
    }

    #[tokio::test]
    async fn allocation_requires_stock_and_round_trips() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = MenuService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("menu-alloc").await.unwrap();
        let food_id = stocked_food(&ctx, group.id, 3).await;

        let menu = service
            .create(group.id, owner.id, lunch(vec![item(Some(food_id), 2, None), item(Some(food_id), 2, None)]))
            .await
            .unwrap();
        assert_eq!(menu.items[0].name.as_deref(), Some("Lentils"));
        assert_eq!(menu.items[0].available, Some(3));

        let first = menu.items[0].id;
        let second = menu.items[1].id;

        let after = service.allocate(group.id, menu.id, first).await.unwrap();
        assert!(after.items[0].allocated);
        assert_eq!(after.items[0].available, Some(1));

        assert!(matches!(
            service.allocate(group.id, menu.id, first).await,
            Err(ServiceError::Conflict(_))
        ));
        // Only one portion left for a two-portion item
        assert!(matches!(
            service.allocate(group.id, menu.id, second).await,
            Err(ServiceError::Conflict(_))
        ));

        let restored = service.deallocate(group.id, menu.id, first).await.unwrap();
        assert!(!restored.items[0].allocated);
        assert_eq!(restored.items[0].available, Some(3));
    }

    #[tokio::test]
    async fn duplicate_slot_and_foreign_food_are_rejected() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = MenuService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("menu-dup").await.unwrap();
        let (_, other) = ctx.create_user_with_group("menu-dup-other").await.unwrap();
        let foreign = stocked_food(&ctx, other.id, 1).await;

        service.create(group.id, owner.id, lunch(vec![])).await.unwrap();
        assert!(matches!(
            service.create(group.id, owner.id, lunch(vec![])).await,
            Err(ServiceError::Conflict(_))
        ));

        let mut dinner = lunch(vec![item(Some(foreign), 1, None)]);
        dinner.meal_type = MealType::Dinner;
        assert!(matches!(
            service.create(group.id, owner.id, dinner).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_keeps_allocated_items() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = MenuService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("menu-update").await.unwrap();
        let food_id = stocked_food(&ctx, group.id, 5).await;

        let menu = service
            .create(group.id, owner.id, lunch(vec![item(Some(food_id), 1, None), item(None, 1, Some("Toast"))]))
            .await
            .unwrap();
        let allocated_id = menu.items[0].id;
        service.allocate(group.id, menu.id, allocated_id).await.unwrap();

        let updated = service
            .update(
                group.id,
                menu.id,
                MenuUpdate {
                    items: Some(vec![item(None, 2, Some("Yoghurt"))]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let names: Vec<_> = updated.items.iter().filter_map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["Lentils".to_string(), "Yoghurt".to_string()]);

        let mut change = item(Some(food_id), 4, None);
        change.id = Some(allocated_id);
        assert!(matches!(
            service
                .update(group.id, menu.id, MenuUpdate { items: Some(vec![change]), ..Default::default() })
                .await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn substitution_checks_stock() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = MenuService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("menu-sub").await.unwrap();
        let original = stocked_food(&ctx, group.id, 2).await;
        let empty = stocked_food(&ctx, group.id, 0).await;
        let spare = stocked_food(&ctx, group.id, 4).await;

        let menu = service
            .create(group.id, owner.id, lunch(vec![item(Some(original), 1, None)]))
            .await
            .unwrap();
        let item_id = menu.items[0].id;

        assert!(matches!(
            service
                .substitute(group.id, menu.id, item_id, Substitution { food_id: empty, quantity: None })
                .await,
            Err(ServiceError::Validation(_))
        ));

        let swapped = service
            .substitute(group.id, menu.id, item_id, Substitution { food_id: spare, quantity: Some(2) })
            .await
            .unwrap();
        assert_eq!(swapped.items[0].food_id, Some(spare));
        assert_eq!(swapped.items[0].quantity, 2);
    }
}
