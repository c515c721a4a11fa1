use sqlx::PgPool;

use crate::database::models::Child;

use super::error::{ServiceError, ServiceResult};

const CHILD_COLUMNS: &str = "id, name, group_id, created_by, created_at, updated_at";

pub struct ChildService {
    pool: PgPool,
}

impl ChildService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, group_id: i32, user_id: i32, name: Option<String>) -> ServiceResult<Child> {
        let name = child_name(name)?;
        let child = sqlx::query_as(&format!(
            "INSERT INTO children (name, group_id, created_by) VALUES ($1, $2, $3) RETURNING {}",
            CHILD_COLUMNS
        ))
        .bind(&name)
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(child)
    }

    pub async fn list(&self, group_id: i32) -> ServiceResult<Vec<Child>> {
        let children = sqlx::query_as(&format!(
            "SELECT {} FROM children WHERE group_id = $1 ORDER BY created_at DESC, id DESC",
            CHILD_COLUMNS
        ))
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(children)
    }

    pub async fn get(&self, group_id: i32, child_id: i32) -> ServiceResult<Child> {
        sqlx::query_as(&format!(
            "SELECT {} FROM children WHERE id = $1 AND group_id = $2",
            CHILD_COLUMNS
        ))
        .bind(child_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Child not found"))
    }

    pub async fn update(&self, group_id: i32, child_id: i32, name: Option<String>) -> ServiceResult<Child> {
        let name = child_name(name)?;
        sqlx::query_as(&format!(
            "UPDATE children SET name = $1, updated_at = NOW() WHERE id = $2 AND group_id = $3 RETURNING {}",
            CHILD_COLUMNS
        ))
        .bind(&name)
        .bind(child_id)
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Child not found"))
    }

    /// Deletes a child. Its menus become child-less; where the group already
    /// has a child-less menu in the same slot, the items move into that menu.
    pub async fn delete(&self, group_id: i32, child_id: i32) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM children WHERE id = $1 AND group_id = $2 FOR UPDATE")
            .bind(child_id)
            .bind(group_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::not_found("Child not found"))?;

        let merged = sqlx::query(
            "UPDATE menu_items mi
             SET menu_id = shared.id,
                 sort_order = mi.sort_order + COALESCE(
                     (SELECT MAX(sort_order) + 1 FROM menu_items WHERE menu_id = shared.id), 0)
             FROM menus own
             JOIN menus shared
               ON shared.group_id = own.group_id
              AND shared.date = own.date
              AND shared.meal_type = own.meal_type
              AND shared.child_id IS NULL
             WHERE mi.menu_id = own.id AND own.child_id = $1",
        )
        .bind(child_id)
        .execute(&mut *tx)
        .await?;

        let dropped = sqlx::query(
            "DELETE FROM menus own
             USING menus shared
             WHERE own.child_id = $1
               AND shared.group_id = own.group_id
               AND shared.date = own.date
               AND shared.meal_type = own.meal_type
               AND shared.child_id IS NULL",
        )
        .bind(child_id)
        .execute(&mut *tx)
        .await?;

        if dropped.rows_affected() > 0 {
            tracing::debug!(
                "Merged {} menu items from {} menus of child {} into shared slots",
                merged.rows_affected(),
                dropped.rows_affected(),
                child_id
            );
        }

        sqlx::query("DELETE FROM children WHERE id = $1")
            .bind(child_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn child_name(name: Option<String>) -> ServiceResult<String> {
    name.map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ServiceError::validation("Child name is required"))
}
