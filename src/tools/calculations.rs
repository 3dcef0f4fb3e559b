//! Calculation MCP Tools
//!
//! Stateless portion scaling, calorie derivation and body metrics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{parse_date, ActivityLevel, Gender, NutrientVector, TargetWeightType};
use crate::nutrition::{self, BmiCategory};

/// Response for scale_portion
#[derive(Debug, Serialize)]
pub struct ScalePortionResponse {
    pub quantity: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbs: f64,
    pub calories: f64,
}

impl From<NutrientVector> for ScalePortionResponse {
    fn from(v: NutrientVector) -> Self {
        Self {
            quantity: v.quantity,
            protein: v.protein,
            fat: v.fat,
            carbs: v.carbs,
            calories: v.calories,
        }
    }
}

/// Response for derive_calories
#[derive(Debug, Serialize)]
pub struct DeriveCaloriesResponse {
    pub calories: f64,
    /// Label calories minus derived calories, when label calories were given
    pub label_difference: Option<f64>,
}

/// Response for body_metrics
#[derive(Debug, Serialize)]
pub struct BodyMetricsResponse {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub age: u32,
    pub bmr: f64,
    pub recommended_calories: f64,
    /// Share of the recommended calories already eaten, 0-100
    pub progress_percentage: Option<f64>,
}

/// Input for body_metrics
#[derive(Debug, Clone, Default)]
pub struct BodyMetricsInput<'a> {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: Option<u32>,
    pub birthday: Option<&'a str>,
    pub gender: &'a str,
    pub activity_level: Option<&'a str>,
    pub target: Option<&'a str>,
    pub consumed_calories: Option<f64>,
}

/// Scale reference nutrients to a target quantity
pub fn scale_portion(
    protein: f64,
    fat: f64,
    carbs: f64,
    calories: f64,
    base_quantity: f64,
    target_quantity: f64,
) -> Result<ScalePortionResponse, String> {
    let scaled = nutrition::recalculate_nutrients(protein, fat, carbs, calories, base_quantity, target_quantity)
        .map_err(|e| format!("Cannot scale portion: {}", e))?;
    Ok(scaled.into())
}

/// Derive calories from macros, optionally comparing with label calories
pub fn derive_calories(
    protein: f64,
    fat: f64,
    carbs: f64,
    label_calories: Option<f64>,
) -> Result<DeriveCaloriesResponse, String> {
    let calories = nutrition::derive_calories(protein, fat, carbs)
        .map_err(|e| format!("Cannot derive calories: {}", e))?;
    Ok(DeriveCaloriesResponse {
        calories,
        label_difference: label_calories.map(|label| label - calories),
    })
}

/// BMI, BMR and recommended daily calories
pub fn body_metrics(input: BodyMetricsInput<'_>, today: NaiveDate) -> Result<BodyMetricsResponse, String> {
    let gender = Gender::from_str(input.gender)
        .ok_or_else(|| format!("Invalid gender '{}'. Must be male or female", input.gender))?;
    let activity = match input.activity_level {
        Some(s) => ActivityLevel::from_str(s)
            .ok_or_else(|| format!("Invalid activity_level '{}'. Must be first..fifth or 1..5", s))?,
        None => ActivityLevel::First,
    };
    let target = match input.target {
        Some(s) => TargetWeightType::from_str(s)
            .ok_or_else(|| format!("Invalid target '{}'. Must be lose, save or gain", s))?,
        None => TargetWeightType::Save,
    };
    let age = match (input.age, input.birthday) {
        (Some(age), _) => age,
        (None, Some(birthday)) => nutrition::age_on(parse_date(birthday)?, today),
        (None, None) => return Err("Either age or birthday is required".to_string()),
    };

    let bmi = nutrition::calculate_bmi(input.weight_kg, input.height_cm).map_err(|e| e.to_string())?;
    let bmr = nutrition::calculate_bmr(input.weight_kg, input.height_cm, age, gender)
        .map_err(|e| e.to_string())?;
    let recommended = nutrition::recommended_calories(input.weight_kg, input.height_cm, age, gender, activity, target)
        .map_err(|e| e.to_string())?;

    Ok(BodyMetricsResponse {
        bmi: nutrition::round_to(bmi, 1),
        bmi_category: BmiCategory::from_bmi(bmi),
        age,
        bmr,
        recommended_calories: recommended,
        progress_percentage: input
            .consumed_calories
            .map(|eaten| nutrition::progress_percentage(eaten, recommended)),
    })
}
