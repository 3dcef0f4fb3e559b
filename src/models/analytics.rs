//! Analytics output types
//!
//! Raw numeric results of period aggregation. Display formatting is left to
//! the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::MealType;

/// Metric selector for trend series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Calories,
    Protein,
    Fat,
    Carbs,
}

impl TrendMetric {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "calories" | "kcal" => Some(TrendMetric::Calories),
            "protein" | "proteins" => Some(TrendMetric::Protein),
            "fat" | "fats" => Some(TrendMetric::Fat),
            "carbs" | "carbohydrates" => Some(TrendMetric::Carbs),
            _ => None,
        }
    }
}

/// Period KPIs. Averages divide by the number of distinct days with entries
/// and are zero when there are none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryKpi {
    pub total_calories: f64,
    pub average_daily_calories: f64,
    pub total_protein: f64,
    pub average_daily_protein: f64,
    pub total_fat: f64,
    pub average_daily_fat: f64,
    pub total_carbs: f64,
    pub average_daily_carbs: f64,
    pub meals_count: usize,
    pub days_count: usize,
}

impl SummaryKpi {
    /// No entries in the period, as opposed to entries that sum to zero
    pub fn is_insufficient(&self) -> bool {
        self.meals_count == 0
    }
}

/// Sums of every metric for one day that has at least one entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
}

impl DailyTotals {
    pub fn value(&self, metric: TrendMetric) -> f64 {
        match metric {
            TrendMetric::Calories => self.calories,
            TrendMetric::Protein => self.protein,
            TrendMetric::Fat => self.fat,
            TrendMetric::Carbs => self.carbs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Sparse per-day series for one metric, ascending by date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSeries {
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    pub fn from_daily(daily: &[DailyTotals], metric: TrendMetric) -> Self {
        Self {
            metric,
            points: daily
                .iter()
                .map(|d| TrendPoint {
                    date: d.date,
                    value: d.value(metric),
                })
                .collect(),
        }
    }

    /// An empty series means "not enough data for a trend", never zero.
    pub fn is_insufficient(&self) -> bool {
        self.points.is_empty()
    }
}

/// Share of macro energy per macronutrient, integer percent 0-100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroShare {
    pub protein_pct: f64,
    pub fat_pct: f64,
    pub carbs_pct: f64,
    /// Energy the shares were computed from; zero means no usable data
    pub total_macro_kcal: f64,
}

impl MacroShare {
    pub fn is_insufficient(&self) -> bool {
        self.total_macro_kcal <= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealTypeCalories {
    pub meal_type: MealType,
    pub calories: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSnapshot {
    pub macro_share: MacroShare,
    /// Meal types present in the period, in order of first occurrence
    pub by_meal_type: Vec<MealTypeCalories>,
}

/// Dominant macronutrient of a product's energy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MacroTag {
    Protein,
    Fat,
    Carbs,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub id: String,
    pub name: String,
    pub calories: f64,
    pub macro_tag: MacroTag,
}

/// Everything the analytics view shows for one period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsAggregate {
    pub summary: SummaryKpi,
    pub trend: Vec<DailyTotals>,
    pub distribution: DistributionSnapshot,
    pub top_products: Vec<TopProduct>,
}

impl AnalyticsAggregate {
    pub fn trend_series(&self, metric: TrendMetric) -> TrendSeries {
        TrendSeries::from_daily(&self.trend, metric)
    }
}
