//! Data-fetch collaborator
//!
//! Supplies the raw entries for a resolved date range on a cache miss.

use async_trait::async_trait;

use super::AnalyticsError;
use crate::db::Database;
use crate::models::{DateRange, DatedNutritionEntry, MealEntry};

#[async_trait]
pub trait EntrySource: Send + Sync + 'static {
    async fn fetch_entries(&self, range: DateRange) -> Result<Vec<DatedNutritionEntry>, AnalyticsError>;
}

/// Entries read from the local SQLite meal log
#[derive(Clone)]
pub struct SqliteEntrySource {
    database: Database,
}

impl SqliteEntrySource {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl EntrySource for SqliteEntrySource {
    async fn fetch_entries(&self, range: DateRange) -> Result<Vec<DatedNutritionEntry>, AnalyticsError> {
        let database = self.database.clone();
        let rows = tokio::task::spawn_blocking(move || {
            database.with_conn(|conn| MealEntry::list_in_range(conn, &range))
        })
        .await
        .map_err(|e| AnalyticsError::Fetch(format!("Fetch task failed: {}", e)))?
        .map_err(|e| AnalyticsError::Fetch(e.to_string()))?;

        tracing::debug!(
            from = %range.from,
            to = %range.to,
            count = rows.len(),
            "Fetched meal entries"
        );

        Ok(rows.iter().map(MealEntry::to_dated_entry).collect())
    }
}
