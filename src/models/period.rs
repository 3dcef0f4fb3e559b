//! Analytics period windows
//!
//! A period is either a named window resolved relative to "today" or an
//! explicit inclusive date range.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::nutrition::error::{NutritionError, NutritionResult};

/// Selected analytics period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalyticsPeriod {
    Day,
    Week,
    Month,
    Range { from: NaiveDate, to: NaiveDate },
}

impl Default for AnalyticsPeriod {
    fn default() -> Self {
        AnalyticsPeriod::Week
    }
}

/// Concrete inclusive date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> NutritionResult<Self> {
        if from > to {
            return Err(NutritionError::InvalidPeriod { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Number of calendar days covered, inclusive
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

impl AnalyticsPeriod {
    /// Explicit range, rejecting `from > to`
    pub fn range(from: NaiveDate, to: NaiveDate) -> NutritionResult<Self> {
        DateRange::new(from, to)?;
        Ok(AnalyticsPeriod::Range { from, to })
    }

    /// Parse a period name, or build a range when both bounds are given.
    ///
    /// Dates use the ISO `YYYY-MM-DD` format.
    pub fn parse(name: Option<&str>, from: Option<&str>, to: Option<&str>) -> Result<Self, String> {
        match (from, to) {
            (Some(from), Some(to)) => {
                let from = parse_date(from)?;
                let to = parse_date(to)?;
                Self::range(from, to).map_err(|e| e.to_string())
            }
            (Some(_), None) | (None, Some(_)) => {
                Err("Both 'from' and 'to' are required for a date range".to_string())
            }
            (None, None) => match name.unwrap_or("week").to_lowercase().as_str() {
                "day" => Ok(AnalyticsPeriod::Day),
                "week" => Ok(AnalyticsPeriod::Week),
                "month" => Ok(AnalyticsPeriod::Month),
                other => Err(format!("Unknown period '{}': expected day, week or month", other)),
            },
        }
    }

    /// Cache key: the literal name for named windows, `from:<from>|to:<to>`
    /// for explicit ranges.
    pub fn key(&self) -> String {
        match self {
            AnalyticsPeriod::Day => "day".to_string(),
            AnalyticsPeriod::Week => "week".to_string(),
            AnalyticsPeriod::Month => "month".to_string(),
            AnalyticsPeriod::Range { from, to } => format!("from:{}|to:{}", from, to),
        }
    }

    /// Resolve to concrete bounds relative to `today`. Weeks start on Monday.
    pub fn resolve(&self, today: NaiveDate) -> NutritionResult<DateRange> {
        match *self {
            AnalyticsPeriod::Day => DateRange::new(today, today),
            AnalyticsPeriod::Week => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                DateRange::new(monday, monday + Duration::days(6))
            }
            AnalyticsPeriod::Month => {
                let first = today.with_day(1).unwrap_or(today);
                let next_month = if first.month() == 12 {
                    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
                };
                let last = next_month.and_then(|d| d.pred_opt()).unwrap_or(today);
                DateRange::new(first, last)
            }
            AnalyticsPeriod::Range { from, to } => DateRange::new(from, to),
        }
    }
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {} (expected YYYY-MM-DD)", s, e))
}
