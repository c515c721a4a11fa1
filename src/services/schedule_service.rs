use chrono::NaiveTime;
use sqlx::{PgConnection, PgPool};

use crate::database::models::schedule::{
    parse_time, CopySchedule, NewSchedule, NewScheduleItem, ScheduleItemPatch, ScheduleUpdate,
};
use crate::database::models::{Schedule, ScheduleItem};

use super::access::ensure_member;
use super::error::{ServiceError, ServiceResult};

const SCHEDULE_COLUMNS: &str = "id, name, child_id, group_id, is_active, created_by, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, schedule_id, start_time, end_time, activity_name, description, notes, sort_order, created_at, updated_at";

/// Daily schedules per child. Access follows membership of the child's group,
/// not the caller's active group.
pub struct ScheduleService {
    pool: PgPool,
}

impl ScheduleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn child_group(&self, child_id: i32) -> ServiceResult<Option<i32>> {
        let group_id = sqlx::query_scalar("SELECT group_id FROM children WHERE id = $1")
            .bind(child_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group_id)
    }

    /// Loads a schedule and checks the caller may touch it.
    async fn authorized_schedule(&self, user_id: i32, schedule_id: i32) -> ServiceResult<Schedule> {
        let schedule: Schedule = sqlx::query_as(&format!("SELECT {} FROM schedules WHERE id = $1", SCHEDULE_COLUMNS))
            .bind(schedule_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ServiceError::not_found("Schedule not found"))?;
        ensure_member(&self.pool, user_id, schedule.group_id).await?;
        Ok(schedule)
    }

    pub async fn list(&self, user_id: i32, child_id: Option<i32>) -> ServiceResult<Vec<Schedule>> {
        let child_id = child_id.ok_or_else(|| ServiceError::validation("childId is required"))?;
        let group_id = self
            .child_group(child_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Child not found"))?;
        ensure_member(&self.pool, user_id, group_id).await?;

        let schedules = sqlx::query_as(&format!(
            "SELECT {} FROM schedules WHERE child_id = $1 ORDER BY created_at DESC, id DESC",
            SCHEDULE_COLUMNS
        ))
        .bind(child_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(schedules)
    }

    /// Schedule with its items by start time.
    pub async fn get(&self, user_id: i32, schedule_id: i32) -> ServiceResult<(Schedule, Vec<ScheduleItem>)> {
        let schedule = self.authorized_schedule(user_id, schedule_id).await?;
        let items = sqlx::query_as(&format!(
            "SELECT {} FROM schedule_items WHERE schedule_id = $1 ORDER BY start_time ASC, sort_order ASC, id ASC",
            ITEM_COLUMNS
        ))
        .bind(schedule_id)
        .fetch_all(&self.pool)
        .await?;
        Ok((schedule, items))
    }

    pub async fn create(&self, user_id: i32, input: NewSchedule) -> ServiceResult<Schedule> {
        let (child_id, name) = match (input.child_id, non_empty(input.name)) {
            (Some(child_id), Some(name)) => (child_id, name),
            _ => return Err(ServiceError::validation("childId and name are required")),
        };
        let group_id = self
            .child_group(child_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Child not found"))?;
        ensure_member(&self.pool, user_id, group_id).await?;

        let mut tx = self.pool.begin().await?;
        if input.is_active {
            deactivate_siblings(&mut tx, child_id, None).await?;
        }
        let schedule = sqlx::query_as(&format!(
            "INSERT INTO schedules (name, child_id, group_id, is_active, created_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            SCHEDULE_COLUMNS
        ))
        .bind(&name)
        .bind(child_id)
        .bind(group_id)
        .bind(input.is_active)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(schedule)
    }

    pub async fn update(&self, user_id: i32, schedule_id: i32, input: ScheduleUpdate) -> ServiceResult<Schedule> {
        let schedule = self.authorized_schedule(user_id, schedule_id).await?;
        let name = match input.name {
            Some(name) => Some(
                non_empty(Some(name)).ok_or_else(|| ServiceError::validation("Schedule name must not be empty"))?,
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        if input.is_active == Some(true) {
            deactivate_siblings(&mut tx, schedule.child_id, Some(schedule_id)).await?;
        }
        let updated = sqlx::query_as(&format!(
            "UPDATE schedules
             SET name = COALESCE($1, name), is_active = COALESCE($2, is_active), updated_at = NOW()
             WHERE id = $3
             RETURNING {}",
            SCHEDULE_COLUMNS
        ))
        .bind(name)
        .bind(input.is_active)
        .bind(schedule_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// Makes this the child's only active schedule.
    pub async fn activate(&self, user_id: i32, schedule_id: i32) -> ServiceResult<()> {
        let schedule = self.authorized_schedule(user_id, schedule_id).await?;

        let mut tx = self.pool.begin().await?;
        deactivate_siblings(&mut tx, schedule.child_id, Some(schedule_id)).await?;
        sqlx::query("UPDATE schedules SET is_active = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(schedule_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!("Activated schedule {} for child {}", schedule_id, schedule.child_id);
        Ok(())
    }

    pub async fn delete(&self, user_id: i32, schedule_id: i32) -> ServiceResult<()> {
        self.authorized_schedule(user_id, schedule_id).await?;
        sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Copies a schedule and its items to another child. The copy starts inactive.
    pub async fn copy(&self, user_id: i32, schedule_id: i32, input: CopySchedule) -> ServiceResult<Schedule> {
        let target_child_id = input
            .target_child_id
            .ok_or_else(|| ServiceError::validation("targetChildId is required"))?;
        let source = self.authorized_schedule(user_id, schedule_id).await?;

        let target_group = self
            .child_group(target_child_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Target child not found"))?;
        if ensure_member(&self.pool, user_id, target_group).await.is_err() {
            return Err(ServiceError::forbidden("Access denied to target group"));
        }

        let name = non_empty(input.name).unwrap_or_else(|| format!("{} (Copy)", source.name));

        let mut tx = self.pool.begin().await?;
        let copy: Schedule = sqlx::query_as(&format!(
            "INSERT INTO schedules (name, child_id, group_id, is_active, created_by)
             VALUES ($1, $2, $3, FALSE, $4)
             RETURNING {}",
            SCHEDULE_COLUMNS
        ))
        .bind(&name)
        .bind(target_child_id)
        .bind(target_group)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO schedule_items (schedule_id, start_time, end_time, activity_name, description, notes, sort_order)
             SELECT $1, start_time, end_time, activity_name, description, notes, sort_order
             FROM schedule_items WHERE schedule_id = $2
             ORDER BY start_time ASC",
        )
        .bind(copy.id)
        .bind(schedule_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("Copied schedule {} to {} for child {}", schedule_id, copy.id, target_child_id);
        Ok(copy)
    }

    pub async fn create_item(&self, user_id: i32, schedule_id: i32, input: NewScheduleItem) -> ServiceResult<ScheduleItem> {
        let (start, end, activity) = match (input.start_time, input.end_time, non_empty(input.activity_name)) {
            (Some(start), Some(end), Some(activity)) => (start, end, activity),
            _ => {
                return Err(ServiceError::validation(
                    "startTime, endTime, and activityName are required",
                ))
            }
        };
        let start = time_field("startTime", &start)?;
        let end = time_field("endTime", &end)?;
        self.authorized_schedule(user_id, schedule_id).await?;

        let item = sqlx::query_as(&format!(
            "INSERT INTO schedule_items (schedule_id, start_time, end_time, activity_name, description, notes, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(schedule_id)
        .bind(start)
        .bind(end)
        .bind(&activity)
        .bind(input.description.unwrap_or_default())
        .bind(input.notes.unwrap_or_default())
        .bind(input.sort_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    async fn authorized_item_group(&self, user_id: i32, item_id: i32) -> ServiceResult<()> {
        let group_id: i32 = sqlx::query_scalar(
            "SELECT s.group_id FROM schedule_items si JOIN schedules s ON s.id = si.schedule_id WHERE si.id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ServiceError::not_found("Schedule item not found"))?;
        ensure_member(&self.pool, user_id, group_id).await?;
        Ok(())
    }

    pub async fn update_item(&self, user_id: i32, item_id: i32, patch: ScheduleItemPatch) -> ServiceResult<ScheduleItem> {
        let start = patch.start_time.as_deref().map(|t| time_field("startTime", t)).transpose()?;
        let end = patch.end_time.as_deref().map(|t| time_field("endTime", t)).transpose()?;
        self.authorized_item_group(user_id, item_id).await?;

        let item = sqlx::query_as(&format!(
            "UPDATE schedule_items
             SET start_time = COALESCE($1, start_time),
                 end_time = COALESCE($2, end_time),
                 activity_name = COALESCE($3, activity_name),
                 description = COALESCE($4, description),
                 notes = COALESCE($5, notes),
                 sort_order = COALESCE($6, sort_order),
                 updated_at = NOW()
             WHERE id = $7
             RETURNING {}",
            ITEM_COLUMNS
        ))
        .bind(start)
        .bind(end)
        .bind(non_empty(patch.activity_name))
        .bind(patch.description)
        .bind(patch.notes)
        .bind(patch.sort_order)
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(item)
    }

    pub async fn delete_item(&self, user_id: i32, item_id: i32) -> ServiceResult<()> {
        self.authorized_item_group(user_id, item_id).await?;
        sqlx::query("DELETE FROM schedule_items WHERE id = $1")
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

async fn deactivate_siblings(conn: &mut PgConnection, child_id: i32, keep: Option<i32>) -> ServiceResult<()> {
    sqlx::query("UPDATE schedules SET is_active = FALSE, updated_at = NOW() WHERE child_id = $1 AND is_active AND id IS DISTINCT FROM $2")
        .bind(child_id)
        .bind(keep)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

fn time_field(field: &str, raw: &str) -> ServiceResult<NaiveTime> {
    parse_time(raw).ok_or_else(|| {
        ServiceError::invalid_field(field, format!("{} must be HH:MM or HH:MM:SS", field))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ChildService;
    use crate::testing::TestContext;

    #[test]
    fn time_field_errors_name_the_field() {
        match time_field("endTime", "noon") {
            Err(ServiceError::InvalidField { field, .. }) => assert_eq!(field, "endTime"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(time_field("startTime", "06:45").is_ok());
    }

    fn new_schedule(child_id: i32, name: &str, is_active: bool) -> NewSchedule {
        NewSchedule {
            child_id: Some(child_id),
            name: Some(name.into()),
            is_active,
        }
    }

    async fn active_count(ctx: &TestContext, child_id: i32) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM schedules WHERE child_id = $1 AND is_active")
            .bind(child_id)
            .fetch_one(&ctx.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn one_active_schedule_per_child() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = ScheduleService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("sched-owner").await.unwrap();
        let child = ChildService::new(ctx.pool.clone())
            .create(group.id, owner.id, Some("Max".into()))
            .await
            .unwrap();

        let weekday = service.create(owner.id, new_schedule(child.id, "Weekday", true)).await.unwrap();
        let weekend = service.create(owner.id, new_schedule(child.id, "Weekend", true)).await.unwrap();
        assert_eq!(active_count(&ctx, child.id).await, 1);

        service.activate(owner.id, weekday.id).await.unwrap();
        assert_eq!(active_count(&ctx, child.id).await, 1);
        let (reloaded, _) = service.get(owner.id, weekend.id).await.unwrap();
        assert!(!reloaded.is_active);

        // Direct writes that bypass the service are stopped by the index
        let direct = sqlx::query("UPDATE schedules SET is_active = TRUE WHERE id = $1")
            .bind(weekend.id)
            .execute(&ctx.pool)
            .await;
        assert!(matches!(ServiceError::from(direct.unwrap_err()), ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn copy_duplicates_items_and_starts_inactive() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = ScheduleService::new(ctx.pool.clone());
        let children = ChildService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("sched-copy").await.unwrap();
        let first = children.create(group.id, owner.id, Some("Ada".into())).await.unwrap();
        let second = children.create(group.id, owner.id, Some("Bo".into())).await.unwrap();

        let source = service.create(owner.id, new_schedule(first.id, "Routine", true)).await.unwrap();
        for (start, end, activity) in [("12:00", "13:00", "Nap"), ("07:00", "07:30", "Breakfast")] {
            service
                .create_item(
                    owner.id,
                    source.id,
                    NewScheduleItem {
                        start_time: Some(start.into()),
                        end_time: Some(end.into()),
                        activity_name: Some(activity.into()),
                        description: None,
                        notes: None,
                        sort_order: 0,
                    },
                )
                .await
                .unwrap();
        }

        let copy = service
            .copy(owner.id, source.id, CopySchedule { target_child_id: Some(second.id), name: None })
            .await
            .unwrap();
        assert_eq!(copy.name, "Routine (Copy)");
        assert!(!copy.is_active);

        let (_, items) = service.get(owner.id, copy.id).await.unwrap();
        let activities: Vec<_> = items.iter().map(|i| i.activity_name.as_str()).collect();
        assert_eq!(activities, vec!["Breakfast", "Nap"]);
    }

    #[tokio::test]
    async fn outsiders_are_denied() {
        let Some(ctx) = TestContext::connect().await else { return };
        let service = ScheduleService::new(ctx.pool.clone());
        let (owner, group) = ctx.create_user_with_group("sched-private").await.unwrap();
        let outsider = ctx.create_user("sched-outsider").await.unwrap();
        let child = ChildService::new(ctx.pool.clone())
            .create(group.id, owner.id, Some("Cy".into()))
            .await
            .unwrap();

        assert!(matches!(
            service.list(outsider.id, Some(child.id)).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(service.list(owner.id, None).await, Err(ServiceError::Validation(_))));
        assert!(matches!(service.list(owner.id, Some(-1)).await, Err(ServiceError::NotFound(_))));
    }
}
