//! Weight Entry model
//!
//! Body weight readings, one or more per local calendar day.

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::meal_entry::{parse_stored_date, parse_text_column};
use crate::db::{DbError, DbResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntry {
    pub id: i64,
    pub weight_kg: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Data for recording a weight reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightEntryCreate {
    pub weight_kg: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

impl WeightEntry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            weight_kg: row.get("weight_kg")?,
            date: parse_text_column(row, "date", parse_stored_date)?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    pub fn create(conn: &Connection, data: &WeightEntryCreate) -> DbResult<Self> {
        conn.execute(
            "INSERT INTO weight_entries (weight_kg, date, notes) VALUES (?1, ?2, ?3)",
            params![
                data.weight_kg,
                data.date.format("%Y-%m-%d").to_string(),
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or_else(|| DbError::NotFound(format!("weight entry {}", id)))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM weight_entries WHERE id = ?1")?;

        match stmt.query_row([id], Self::from_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Most recent readings first, at most `limit`
    pub fn list_recent(conn: &Connection, limit: i64) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM weight_entries ORDER BY date DESC, id DESC LIMIT ?1",
        )?;

        let entries = stmt
            .query_map([limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Readings on or after `since`, oldest first
    pub fn list_since(conn: &Connection, since: NaiveDate) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT * FROM weight_entries WHERE date >= ?1 ORDER BY date, id",
        )?;

        let entries = stmt
            .query_map([since.format("%Y-%m-%d").to_string()], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM weight_entries WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
