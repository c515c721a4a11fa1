use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A food item in a group's inventory.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Food {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub unit: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub food_type: Option<String>,
    pub date_prepared: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub last_allocated: Option<NaiveDate>,
    pub group_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/items`. Lowercase field names from older clients are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFood {
    pub name: String,
    pub quantity: i32,
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub food_type: Option<String>,
    #[serde(alias = "dateprepared")]
    pub date_prepared: Option<NaiveDate>,
    #[serde(alias = "expirydate")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(alias = "lastallocated")]
    pub last_allocated: Option<NaiveDate>,
}

/// Body of `PATCH /api/items/:id`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodPatch {
    pub name: Option<String>,
    pub quantity: Option<i32>,
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub food_type: Option<String>,
    #[serde(alias = "dateprepared")]
    pub date_prepared: Option<NaiveDate>,
    #[serde(alias = "expirydate")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(alias = "lastallocated")]
    pub last_allocated: Option<NaiveDate>,
}

impl FoodPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.quantity.is_none()
            && self.unit.is_none()
            && self.food_type.is_none()
            && self.date_prepared.is_none()
            && self.expiry_date.is_none()
            && self.last_allocated.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_lowercase_aliases() {
        let food: NewFood = serde_json::from_value(json!({
            "name": "Carrot puree",
            "quantity": 4,
            "type": "vegetable",
            "dateprepared": "2024-03-01",
            "lastallocated": "2024-03-02"
        }))
        .unwrap();

        assert_eq!(food.food_type.as_deref(), Some("vegetable"));
        assert_eq!(food.date_prepared, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(food.last_allocated, NaiveDate::from_ymd_opt(2024, 3, 2));
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(FoodPatch::default().is_empty());
        let patch: FoodPatch = serde_json::from_value(json!({"quantity": 0})).unwrap();
        assert!(!patch.is_empty());
    }
}
