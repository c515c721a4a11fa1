use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::models::alert::{AlertPatch, NewAlert};
use crate::database::models::{Alert, AlertStatus};

use super::access::membership_role;
use super::error::{ServiceError, ServiceResult};

const ALERT_COLUMNS: &str = "id, name, type, message, status, group_id, user_id, created_at, updated_at";

/// Alerts of a group. A user sees untargeted alerts and those targeted at them.
pub struct AlertService {
    pool: PgPool,
}

impl AlertService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, group_id: i32, user_id: i32, active_only: bool) -> ServiceResult<Vec<Alert>> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM alerts WHERE group_id = ", ALERT_COLUMNS));
        query
            .push_bind(group_id)
            .push(" AND (user_id IS NULL OR user_id = ")
            .push_bind(user_id)
            .push(")");
        if active_only {
            query.push(" AND status = 'active'");
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let alerts = query.build_query_as::<Alert>().fetch_all(&self.pool).await?;
        Ok(alerts)
    }

    pub async fn get(&self, group_id: i32, user_id: i32, id: i32) -> ServiceResult<Alert> {
        sqlx::query_as(&format!(
            "SELECT {} FROM alerts WHERE id = $1 AND group_id = $2 AND (user_id IS NULL OR user_id = $3)",
            ALERT_COLUMNS
        ))
        .bind(id)
        .bind(group_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Alert not found"))
    }

    pub async fn create(&self, group_id: i32, input: NewAlert) -> ServiceResult<Alert> {
        let name = required(input.name, "name")?;
        let alert_type = required(input.alert_type, "type")?;
        let message = required(input.message, "message")?;
        let status = parse_status(input.status.as_deref().unwrap_or("active"))?;
        if let Some(target) = input.user_id {
            self.ensure_target(group_id, target).await?;
        }

        let alert = sqlx::query_as(&format!(
            "INSERT INTO alerts (name, type, message, status, group_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            ALERT_COLUMNS
        ))
        .bind(&name)
        .bind(&alert_type)
        .bind(&message)
        .bind(status.as_str())
        .bind(group_id)
        .bind(input.user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(alert)
    }

    pub async fn update(&self, group_id: i32, user_id: i32, id: i32, patch: AlertPatch) -> ServiceResult<Alert> {
        if patch.is_empty() {
            return Err(ServiceError::validation("No fields to update"));
        }
        let status = patch.status.as_deref().map(parse_status).transpose()?;
        if let Some(target) = patch.user_id {
            self.ensure_target(group_id, target).await?;
        }
        // Visibility check doubles as the 404
        self.get(group_id, user_id, id).await?;

        let mut query = QueryBuilder::<Postgres>::new("UPDATE alerts SET ");
        let mut set = query.separated(", ");
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(required(name, "name")?);
        }
        if let Some(alert_type) = patch.alert_type {
            set.push("type = ").push_bind_unseparated(required(alert_type, "type")?);
        }
        if let Some(message) = patch.message {
            set.push("message = ").push_bind_unseparated(required(message, "message")?);
        }
        if let Some(status) = status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(target) = patch.user_id {
            set.push("user_id = ").push_bind_unseparated(target);
        }
        set.push("updated_at = NOW()");
        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND group_id = ")
            .push_bind(group_id)
            .push(format!(" RETURNING {}", ALERT_COLUMNS));

        query
            .build_query_as::<Alert>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Alert not found"))
    }

    pub async fn delete(&self, group_id: i32, user_id: i32, id: i32) -> ServiceResult<()> {
        let deleted = sqlx::query(
            "DELETE FROM alerts WHERE id = $1 AND group_id = $2 AND (user_id IS NULL OR user_id = $3)",
        )
        .bind(id)
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if deleted.rows_affected() == 0 {
            return Err(ServiceError::not_found("Alert not found"));
        }
        Ok(())
    }

    async fn ensure_target(&self, group_id: i32, target: i32) -> ServiceResult<()> {
        match membership_role(&self.pool, target, group_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::invalid_field(
                "userId",
                "Target user is not a member of this group",
            )),
        }
    }
}

fn required(value: String, field: &str) -> ServiceResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ServiceError::invalid_field(field, format!("{} is required", field)));
    }
    Ok(value)
}

fn parse_status(raw: &str) -> ServiceResult<AlertStatus> {
    raw.parse::<AlertStatus>()
        .map_err(|e| ServiceError::invalid_field("status", e.to_string()))
}
