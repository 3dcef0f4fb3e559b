//! Error types for nutrient calculations and aggregation.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the scaler, the calorie deriver, body metrics and the
/// period aggregator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NutritionError {
    #[error("invalid quantity for {field}: {value}")]
    InvalidQuantity { field: &'static str, value: f64 },

    #[error("invalid nutrient value for {field}: {value}")]
    InvalidNutrientValue { field: &'static str, value: f64 },

    #[error("invalid entry at index {index}: {reason}")]
    InvalidEntry { index: usize, reason: String },

    #[error("invalid period: {from} is after {to}")]
    InvalidPeriod { from: NaiveDate, to: NaiveDate },

    #[error("invalid measurement for {field}: {value}")]
    InvalidMeasurement { field: &'static str, value: f64 },
}

/// Result type for nutrition calculations
pub type NutritionResult<T> = Result<T, NutritionError>;

/// Reject negative, NaN and infinite nutrient values.
pub(crate) fn check_nutrient(field: &'static str, value: f64) -> NutritionResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(NutritionError::InvalidNutrientValue { field, value });
    }
    Ok(value)
}
