use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner, MealType::Snack];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown meal type '{0}', expected Breakfast, Lunch, Dinner or Snack")]
pub struct InvalidMealType(pub String);

impl FromStr for MealType {
    type Err = InvalidMealType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MealType::ALL
            .into_iter()
            .find(|meal| meal.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidMealType(s.to_string()))
    }
}

impl TryFrom<String> for MealType {
    type Error = InvalidMealType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Menu {
    pub id: i32,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub meal_type: MealType,
    pub child_id: Option<i32>,
    pub group_id: i32,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A menu item joined with its food. `name` falls back to the food's name and
/// `available` is the food's current stock.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemView {
    pub id: i32,
    #[serde(skip_serializing)]
    pub menu_id: i32,
    pub food_id: Option<i32>,
    pub name: Option<String>,
    pub quantity: i32,
    pub allocated: bool,
    pub allocated_at: Option<DateTime<Utc>>,
    pub sort_order: i32,
    pub available: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuView {
    pub id: i32,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub child_id: Option<i32>,
    pub group_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<MenuItemView>,
}

impl MenuView {
    /// Attach items to their menus, keeping the order of `menus`.
    pub fn assemble(menus: Vec<Menu>, items: Vec<MenuItemView>) -> Vec<MenuView> {
        let mut by_menu: BTreeMap<i32, Vec<MenuItemView>> = BTreeMap::new();
        for item in items {
            by_menu.entry(item.menu_id).or_default().push(item);
        }

        menus
            .into_iter()
            .map(|menu| MenuView {
                items: by_menu.remove(&menu.id).unwrap_or_default(),
                id: menu.id,
                date: menu.date,
                meal_type: menu.meal_type,
                child_id: menu.child_id,
                group_id: menu.group_id,
                created_at: menu.created_at,
                updated_at: menu.updated_at,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    /// Existing item id, only meaningful on update
    pub id: Option<i32>,
    pub food_id: Option<i32>,
    pub quantity: i32,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenu {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub child_id: Option<i32>,
    #[serde(default)]
    pub items: Vec<NewMenuItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuUpdate {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub child_id: Option<i32>,
    pub items: Option<Vec<NewMenuItem>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub food_id: i32,
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuFilter {
    pub date: Option<NaiveDate>,
    pub child_id: Option<i32>,
}

// Legacy document representation: one date with a section per meal.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyItem {
    #[serde(default)]
    pub name: Option<String>,
    pub quantity: i32,
    /// Food id
    #[serde(default)]
    pub id: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacySection {
    #[serde(default)]
    pub items: Vec<LegacyItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMenuDocument {
    #[serde(deserialize_with = "deserialize_legacy_date")]
    pub date: NaiveDate,
    #[serde(rename = "Breakfast", default, skip_serializing_if = "Option::is_none")]
    pub breakfast: Option<LegacySection>,
    #[serde(rename = "Lunch", default, skip_serializing_if = "Option::is_none")]
    pub lunch: Option<LegacySection>,
    #[serde(rename = "Dinner", default, skip_serializing_if = "Option::is_none")]
    pub dinner: Option<LegacySection>,
    #[serde(rename = "Snack", default, skip_serializing_if = "Option::is_none")]
    pub snack: Option<LegacySection>,
}

/// `POST /api/menus/legacy` accepts a single document or an array of them.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LegacyPayload {
    Many(Vec<LegacyMenuDocument>),
    One(LegacyMenuDocument),
}

impl LegacyPayload {
    pub fn into_documents(self) -> Vec<LegacyMenuDocument> {
        match self {
            LegacyPayload::Many(docs) => docs,
            LegacyPayload::One(doc) => vec![doc],
        }
    }
}

/// Legacy clients send either `2024-03-01` or a full ISO timestamp.
fn deserialize_legacy_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_legacy_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw)))
}

fn parse_legacy_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc).date_naive()))
}

impl LegacyMenuDocument {
    fn section(&self, meal: MealType) -> Option<&LegacySection> {
        match meal {
            MealType::Breakfast => self.breakfast.as_ref(),
            MealType::Lunch => self.lunch.as_ref(),
            MealType::Dinner => self.dinner.as_ref(),
            MealType::Snack => self.snack.as_ref(),
        }
    }

    fn section_mut(&mut self, meal: MealType) -> &mut LegacySection {
        let slot = match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
            MealType::Snack => &mut self.snack,
        };
        slot.get_or_insert_with(LegacySection::default)
    }

    /// One menu per present section. Legacy menus have no child.
    pub fn to_new_menus(&self) -> Vec<NewMenu> {
        MealType::ALL
            .into_iter()
            .filter_map(|meal| {
                self.section(meal).map(|section| NewMenu {
                    date: self.date,
                    meal_type: meal,
                    child_id: None,
                    items: section
                        .items
                        .iter()
                        .map(|item| NewMenuItem {
                            id: None,
                            food_id: item.id,
                            quantity: item.quantity,
                            name: item.name.clone(),
                        })
                        .collect(),
                })
            })
            .collect()
    }

    /// Fold menus into one document per date, ascending.
    pub fn from_views(views: &[MenuView]) -> Vec<LegacyMenuDocument> {
        let mut by_date: BTreeMap<NaiveDate, LegacyMenuDocument> = BTreeMap::new();

        for view in views {
            let doc = by_date.entry(view.date).or_insert_with(|| LegacyMenuDocument {
                date: view.date,
                breakfast: None,
                lunch: None,
                dinner: None,
                snack: None,
            });
            let section = doc.section_mut(view.meal_type);
            section.items.extend(view.items.iter().map(|item| LegacyItem {
                name: item.name.clone(),
                quantity: item.quantity,
                id: item.food_id,
            }));
        }

        by_date.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meal_type_is_case_insensitive() {
        assert_eq!("lunch".parse::<MealType>(), Ok(MealType::Lunch));
        assert_eq!(" DINNER ".parse::<MealType>(), Ok(MealType::Dinner));
        assert!("brunch".parse::<MealType>().is_err());

        let parsed: MealType = serde_json::from_value(json!("snack")).unwrap();
        assert_eq!(parsed, MealType::Snack);
        assert_eq!(serde_json::to_value(MealType::Snack).unwrap(), "Snack");
    }

    #[test]
    fn legacy_document_accepts_timestamp_dates() {
        let doc: LegacyMenuDocument = serde_json::from_value(json!({
            "date": "2024-03-01T00:00:00.000Z",
            "Lunch": {"items": [{"name": "Peas", "quantity": 2, "id": 5}]},
            "Dinner": {"items": []}
        }))
        .unwrap();

        assert_eq!(doc.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let menus = doc.to_new_menus();
        assert_eq!(menus.len(), 2);
        assert_eq!(menus[0].meal_type, MealType::Lunch);
        assert_eq!(menus[0].items[0].food_id, Some(5));
        assert_eq!(menus[1].meal_type, MealType::Dinner);
        assert!(menus[1].items.is_empty());
    }

    #[test]
    fn legacy_payload_single_or_many() {
        let one: LegacyPayload = serde_json::from_value(json!({"date": "2024-03-01"})).unwrap();
        assert_eq!(one.into_documents().len(), 1);

        let many: LegacyPayload =
            serde_json::from_value(json!([{"date": "2024-03-01"}, {"date": "2024-03-02"}])).unwrap();
        assert_eq!(many.into_documents().len(), 2);
    }

    fn view(id: i32, date: NaiveDate, meal: MealType, items: Vec<MenuItemView>) -> MenuView {
        MenuView {
            id,
            date,
            meal_type: meal,
            child_id: None,
            group_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items,
        }
    }

    fn item(id: i32, menu_id: i32, food_id: i32, name: &str) -> MenuItemView {
        MenuItemView {
            id,
            menu_id,
            food_id: Some(food_id),
            name: Some(name.into()),
            quantity: 1,
            allocated: false,
            allocated_at: None,
            sort_order: 0,
            available: Some(3),
        }
    }

    #[test]
    fn views_fold_into_documents_by_date() {
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let views = vec![
            view(1, d1, MealType::Lunch, vec![item(1, 1, 10, "Rice")]),
            view(2, d0, MealType::Dinner, vec![item(2, 2, 11, "Soup")]),
            view(3, d1, MealType::Lunch, vec![item(3, 3, 12, "Peas")]),
        ];

        let docs = LegacyMenuDocument::from_views(&views);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].date, d0);
        assert_eq!(docs[1].lunch.as_ref().map(|s| s.items.len()), Some(2));
        assert!(docs[1].dinner.is_none());

        let json = serde_json::to_value(&docs[0]).unwrap();
        assert_eq!(json["Dinner"]["items"][0]["id"], 11);
        assert!(json.get("Lunch").is_none());
    }

    #[test]
    fn assemble_groups_items_per_menu() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let menus = vec![
            Menu {
                id: 7,
                date,
                meal_type: MealType::Lunch,
                child_id: None,
                group_id: 1,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            Menu {
                id: 8,
                date,
                meal_type: MealType::Dinner,
                child_id: Some(2),
                group_id: 1,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        ];
        let items = vec![item(1, 8, 10, "Rice"), item(2, 7, 11, "Soup"), item(3, 8, 12, "Peas")];

        let views = MenuView::assemble(menus, items);
        assert_eq!(views[0].id, 7);
        assert_eq!(views[0].items.len(), 1);
        assert_eq!(views[1].items.len(), 2);
    }
}
