//! Weight MCP Tools
//!
//! Recording, listing and deleting body weight readings.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::db::Database;
use crate::models::{parse_date, WeightEntry, WeightEntryCreate};
use crate::nutrition::{weekly_change, WEEKLY_CHANGE_DAYS};

/// Accepted body weight, kg
pub const MIN_WEIGHT_KG: f64 = 30.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;

/// Response for list_weights
#[derive(Debug, Serialize)]
pub struct ListWeightsResponse {
    pub entries: Vec<WeightEntry>,
    pub latest: Option<WeightEntry>,
    /// Newest minus oldest reading over the last seven days, null with fewer than two
    pub weekly_change: Option<f64>,
    pub count: usize,
}

/// Response for delete_weight_entry
#[derive(Debug, Serialize)]
pub struct DeleteWeightEntryResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Record a weight reading; `date` defaults to `today`
pub fn log_weight(
    db: &Database,
    weight_kg: f64,
    date: Option<&str>,
    notes: Option<String>,
    today: NaiveDate,
) -> Result<WeightEntry, String> {
    if !weight_kg.is_finite() || !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&weight_kg) {
        return Err(format!(
            "weight_kg must be between {} and {}",
            MIN_WEIGHT_KG, MAX_WEIGHT_KG
        ));
    }
    let date = match date {
        Some(d) => parse_date(d)?,
        None => today,
    };

    let data = WeightEntryCreate {
        weight_kg,
        date,
        notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
    };

    let entry = db
        .with_conn(|conn| WeightEntry::create(conn, &data))
        .map_err(|e| format!("Failed to record weight: {}", e))?;

    tracing::info!(id = entry.id, date = %entry.date, weight_kg = entry.weight_kg, "Weight recorded");

    Ok(entry)
}

/// Most recent readings with the weekly change as of `today`
pub fn list_weights(db: &Database, limit: i64, today: NaiveDate) -> Result<ListWeightsResponse, String> {
    if limit <= 0 {
        return Err("limit must be greater than 0".to_string());
    }

    let window_start = today - Duration::days(WEEKLY_CHANGE_DAYS - 1);
    let (entries, recent) = db
        .with_conn(|conn| {
            Ok((
                WeightEntry::list_recent(conn, limit)?,
                WeightEntry::list_since(conn, window_start)?,
            ))
        })
        .map_err(|e| format!("Failed to list weights: {}", e))?;

    let history: Vec<(NaiveDate, f64)> = recent.iter().map(|e| (e.date, e.weight_kg)).collect();

    Ok(ListWeightsResponse {
        latest: entries.first().cloned(),
        weekly_change: weekly_change(&history, today),
        count: entries.len(),
        entries,
    })
}

pub fn delete_weight_entry(db: &Database, id: i64) -> Result<DeleteWeightEntryResponse, String> {
    let deleted = db
        .with_conn(|conn| WeightEntry::delete(conn, id))
        .map_err(|e| format!("Failed to delete weight entry: {}", e))?;

    if !deleted {
        return Err(format!("Weight entry {} not found", id));
    }

    Ok(DeleteWeightEntryResponse {
        success: true,
        deleted_id: id,
    })
}
