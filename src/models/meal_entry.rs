//! Meal Entry model
//!
//! A logged portion of a product on a local calendar day.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{DateRange, DatedNutritionEntry, MealType, NutrientVector, Product};
use crate::db::{DbError, DbResult};

/// A meal entry with nutrients at the eaten quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub meal_type: MealType,
    pub date: NaiveDate,
    pub timezone: String,
    pub nutrients: NutrientVector,
    pub created_at: String,
}

/// Data for logging a meal entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntryCreate {
    pub product_id: i64,
    pub meal_type: MealType,
    pub date: NaiveDate,
    pub timezone: String,
    pub quantity: f64,
}

/// Read a text column through `parse`, reporting failures against that column
pub(crate) fn parse_text_column<T, E>(
    row: &Row,
    column: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> rusqlite::Result<T>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let idx = row.as_ref().column_index(column)?;
    let text: String = row.get(idx)?;
    parse(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

pub(crate) fn parse_stored_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

impl MealEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            product_id: row.get("product_id")?,
            product_name: row.get("product_name")?,
            meal_type: parse_text_column(row, "meal_type", |s| {
                MealType::from_str(s).ok_or_else(|| format!("unknown meal type '{}'", s))
            })?,
            date: parse_text_column(row, "date", parse_stored_date)?,
            timezone: row.get("timezone")?,
            nutrients: NutrientVector {
                protein: row.get("protein")?,
                fat: row.get("fat")?,
                carbs: row.get("carbs")?,
                calories: row.get("calories")?,
                quantity: row.get("quantity")?,
            },
            created_at: row.get("created_at")?,
        })
    }

    /// Log a portion of a product.
    ///
    /// Nutrients are scaled from the product's reference vector to the eaten
    /// quantity and stored with the entry.
    pub fn create(conn: &Connection, data: &MealEntryCreate) -> DbResult<Self> {
        let product = Product::get_by_id(conn, data.product_id)?
            .ok_or_else(|| DbError::NotFound(format!("product {}", data.product_id)))?;

        let nutrients = product.portion(data.quantity)?;

        conn.execute(
            r#"
            INSERT INTO meal_entries (
                product_id, product_name, meal_type, date, timezone,
                quantity, protein, fat, carbs, calories
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                product.id,
                product.name,
                data.meal_type.as_str(),
                data.date.format("%Y-%m-%d").to_string(),
                data.timezone,
                nutrients.quantity,
                nutrients.protein,
                nutrients.fat,
                nutrients.carbs,
                nutrients.calories,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("meal entry {}", id)))
    }

    /// Get a meal entry by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_entries WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// All entries whose local day falls in `range`, ordered by day then id
    pub fn list_in_range(conn: &Connection, range: &DateRange) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM meal_entries
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date, id
            "#,
        )?;

        let entries = stmt
            .query_map(
                params![
                    range.from.format("%Y-%m-%d").to_string(),
                    range.to.format("%Y-%m-%d").to_string()
                ],
                Self::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Delete a meal entry
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Aggregation view of this entry
    pub fn to_dated_entry(&self) -> DatedNutritionEntry {
        DatedNutritionEntry {
            date: self.date,
            meal_type: self.meal_type,
            product_id: self.product_id.map(|id| id.to_string()),
            product_name: self.product_name.clone(),
            nutrients: self.nutrients,
        }
    }
}
