//! Meal Entry MCP Tools
//!
//! Tools for logging, listing and deleting meal entries.

use serde::Serialize;

use crate::analytics::is_valid_timezone;
use crate::db::{Database, DbError};
use crate::models::{parse_date, DateRange, MealEntry, MealEntryCreate, MealType};

/// Response for log_meal
#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub id: i64,
    pub product_name: String,
    pub meal_type: MealType,
    pub date: String,
    pub quantity: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub calories: f64,
}

impl From<MealEntry> for LogMealResponse {
    fn from(entry: MealEntry) -> Self {
        Self {
            id: entry.id,
            product_name: entry.product_name,
            meal_type: entry.meal_type,
            date: entry.date.to_string(),
            quantity: entry.nutrients.quantity,
            protein: entry.nutrients.protein,
            fat: entry.nutrients.fat,
            carbs: entry.nutrients.carbs,
            calories: entry.nutrients.calories,
        }
    }
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub from: String,
    pub to: String,
    pub entries: Vec<LogMealResponse>,
    pub total_calories: f64,
    pub count: usize,
}

/// Response for delete_meal_entry
#[derive(Debug, Serialize)]
pub struct DeleteMealEntryResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Log a portion of a product as a meal entry
pub fn log_meal(
    db: &Database,
    product_id: i64,
    meal_type: &str,
    date: &str,
    timezone: &str,
    quantity: f64,
) -> Result<LogMealResponse, String> {
    let meal_type = MealType::from_str(meal_type).ok_or_else(|| {
        format!(
            "Invalid meal_type '{}'. Must be one of: breakfast, lunch, dinner, snack, lateSnack",
            meal_type
        )
    })?;
    let date = parse_date(date)?;
    if !is_valid_timezone(timezone) {
        return Err(format!("Unknown timezone '{}'", timezone));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err("quantity must be greater than 0".to_string());
    }

    let data = MealEntryCreate {
        product_id,
        meal_type,
        date,
        timezone: timezone.trim().to_string(),
        quantity,
    };

    let entry = db
        .with_conn(|conn| MealEntry::create(conn, &data))
        .map_err(|e| match e {
            DbError::NotFound(_) => format!("Product {} not found", product_id),
            e => format!("Failed to log meal: {}", e),
        })?;

    tracing::info!(id = entry.id, date = %entry.date, meal_type = entry.meal_type.as_str(), "Meal logged");

    Ok(entry.into())
}

/// List meal entries between two dates, inclusive
pub fn list_meals(db: &Database, from: &str, to: &str) -> Result<ListMealsResponse, String> {
    let range = DateRange::new(parse_date(from)?, parse_date(to)?).map_err(|e| e.to_string())?;

    let entries = db
        .with_conn(|conn| MealEntry::list_in_range(conn, &range))
        .map_err(|e| format!("Failed to list meals: {}", e))?;

    let total_calories = entries.iter().map(|e| e.nutrients.calories).sum();
    let entries: Vec<LogMealResponse> = entries.into_iter().map(LogMealResponse::from).collect();

    Ok(ListMealsResponse {
        from: range.from.to_string(),
        to: range.to.to_string(),
        count: entries.len(),
        entries,
        total_calories,
    })
}

/// Delete a meal entry
pub fn delete_meal_entry(db: &Database, id: i64) -> Result<DeleteMealEntryResponse, String> {
    let deleted = db
        .with_conn(|conn| MealEntry::delete(conn, id))
        .map_err(|e| format!("Failed to delete meal entry: {}", e))?;

    if !deleted {
        return Err(format!("Meal entry {} not found", id));
    }

    Ok(DeleteMealEntryResponse {
        success: true,
        deleted_id: id,
    })
}
