//! Calorie derivation from macronutrients
//!
//! Fixed energy densities: protein and carbohydrate 4 kcal/g, fat 9 kcal/g.

use super::error::{check_nutrient, NutritionResult};

pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;

/// Derive calories from macro grams, rounded to the nearest whole kcal.
///
/// Only used when the user edits macros of a self-defined product. Calories
/// that come from an external product label are authoritative and must not be
/// replaced by this value.
pub fn derive_calories(protein: f64, fat: f64, carbs: f64) -> NutritionResult<f64> {
    let protein = check_nutrient("protein", protein)?;
    let fat = check_nutrient("fat", fat)?;
    let carbs = check_nutrient("carbs", carbs)?;

    Ok((protein * KCAL_PER_GRAM_PROTEIN + fat * KCAL_PER_GRAM_FAT + carbs * KCAL_PER_GRAM_CARBS)
        .round())
}
