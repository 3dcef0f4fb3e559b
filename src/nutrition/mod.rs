//! Nutrition calculation module
//!
//! Portion scaling, calorie derivation, body metrics and period aggregation.

pub mod aggregator;
pub mod body;
pub mod calories;
pub mod error;
pub mod scaler;

pub use aggregator::{
    aggregate, daily_totals, distribution, summarize, top_products, trend, validate_entries,
};
pub use body::{
    age_on, calculate_bmi, calculate_bmr, progress_percentage, recommended_calories, weekly_change,
    BmiCategory, WEEKLY_CHANGE_DAYS,
};
pub use calories::{derive_calories, KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
pub use error::{NutritionError, NutritionResult};
pub use scaler::{recalculate_nutrients, round_to, scale_nutrients};
