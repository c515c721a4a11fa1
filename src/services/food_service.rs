use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::food::{FoodPatch, NewFood};
use crate::database::models::Food;

use super::error::{ServiceError, ServiceResult};

const FOOD_COLUMNS: &str = "id, name, quantity, unit, type, date_prepared, expiry_date, last_allocated, group_id, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodFilter {
    #[serde(rename = "type")]
    pub food_type: Option<String>,
    pub in_stock: Option<bool>,
}

/// Food inventory of a group.
pub struct FoodService {
    pool: PgPool,
}

impl FoodService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, group_id: i32, filter: &FoodFilter) -> ServiceResult<Vec<Food>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM food WHERE group_id = ", FOOD_COLUMNS));
        query.push_bind(group_id);

        if let Some(food_type) = filter.food_type.as_deref().filter(|t| !t.is_empty()) {
            query.push(" AND LOWER(type) = LOWER(").push_bind(food_type.to_string()).push(")");
        }
        match filter.in_stock {
            Some(true) => {
                query.push(" AND quantity > 0");
            }
            Some(false) => {
                query.push(" AND quantity = 0");
            }
            None => {}
        }
        query.push(" ORDER BY name ASC, id ASC");

        let items = query.build_query_as::<Food>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    pub async fn get(&self, group_id: i32, id: i32) -> ServiceResult<Food> {
        sqlx::query_as(&format!("SELECT {} FROM food WHERE id = $1 AND group_id = $2", FOOD_COLUMNS))
            .bind(id)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Food item not found"))
    }

    pub async fn create(&self, group_id: i32, input: NewFood) -> ServiceResult<Food> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::invalid_field("name", "Name is required"));
        }
        check_quantity(input.quantity)?;

        let food = sqlx::query_as(&format!(
            "INSERT INTO food (name, quantity, unit, type, date_prepared, expiry_date, last_allocated, group_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {}",
            FOOD_COLUMNS
        ))
        .bind(&name)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(&input.food_type)
        .bind(input.date_prepared)
        .bind(input.expiry_date)
        .bind(input.last_allocated)
        .bind(group_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(food)
    }

    pub async fn update(&self, group_id: i32, id: i32, patch: FoodPatch) -> ServiceResult<Food> {
        if patch.is_empty() {
            return Err(ServiceError::validation("No fields to update"));
        }
        if let Some(quantity) = patch.quantity {
            check_quantity(quantity)?;
        }
        if matches!(patch.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(ServiceError::invalid_field("name", "Name must not be empty"));
        }

        let mut query = build_food_update(group_id, id, patch);
        query
            .build_query_as::<Food>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Food item not found"))
    }

    pub async fn delete(&self, group_id: i32, id: i32) -> ServiceResult<()> {
        let deleted = sqlx::query("DELETE FROM food WHERE id = $1 AND group_id = $2")
            .bind(id)
            .bind(group_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::not_found("Food item not found"));
        }
        Ok(())
    }

    /// Deletes the listed ids that belong to the group; others are ignored.
    pub async fn delete_many(&self, group_id: i32, ids: &[i32]) -> ServiceResult<u64> {
        if ids.is_empty() {
            return Err(ServiceError::validation("ids must be a non-empty array"));
        }
        let deleted = sqlx::query("DELETE FROM food WHERE group_id = $1 AND id = ANY($2)")
            .bind(group_id)
            .bind(ids)
            .execute(&self.pool)
            .await?;
        Ok(deleted.rows_affected())
    }
}

fn check_quantity(quantity: i32) -> ServiceResult<()> {
    if quantity < 0 {
        return Err(ServiceError::invalid_field("quantity", "Quantity must not be negative"));
    }
    Ok(())
}

/// `UPDATE food SET ...` touching only the supplied fields.
fn build_food_update(group_id: i32, id: i32, patch: FoodPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE food SET ");
    let mut set = query.separated(", ");

    if let Some(name) = patch.name {
        set.push("name = ").push_bind_unseparated(name.trim().to_string());
    }
    if let Some(quantity) = patch.quantity {
        set.push("quantity = ").push_bind_unseparated(quantity);
    }
    if let Some(unit) = patch.unit {
        set.push("unit = ").push_bind_unseparated(unit);
    }
    if let Some(food_type) = patch.food_type {
        set.push("type = ").push_bind_unseparated(food_type);
    }
    if let Some(date) = patch.date_prepared {
        set.push("date_prepared = ").push_bind_unseparated(date);
    }
    if let Some(date) = patch.expiry_date {
        set.push("expiry_date = ").push_bind_unseparated(date);
    }
    if let Some(date) = patch.last_allocated {
        set.push("last_allocated = ").push_bind_unseparated(date);
    }
    set.push("updated_at = NOW()");

    query
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND group_id = ")
        .push_bind(group_id)
        .push(format!(" RETURNING {}", FOOD_COLUMNS));
    query
}
