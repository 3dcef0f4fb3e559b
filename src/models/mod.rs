//! Data models
//!
//! Nutrient vectors, entries, periods, analytics payloads and the SQLite-backed
//! product, meal and weight entities.

mod analytics;
mod entry;
mod meal_entry;
mod nutrition;
mod period;
mod product;
mod profile;
mod weight_entry;

pub use analytics::{
    AnalyticsAggregate, DailyTotals, DistributionSnapshot, MacroShare, MacroTag, MealTypeCalories,
    SummaryKpi, TopProduct, TrendMetric, TrendPoint, TrendSeries,
};
pub use entry::{entries_from_records, DatedNutritionEntry, MealRecord, MealType};
pub use meal_entry::{MealEntry, MealEntryCreate};
pub use nutrition::NutrientVector;
pub use period::{AnalyticsPeriod, DateRange};
pub(crate) use period::parse_date;
pub use product::{Product, ProductCreate, ProductUpdate};
pub use profile::{ActivityLevel, Gender, TargetWeightType};
pub use weight_entry::{WeightEntry, WeightEntryCreate};
