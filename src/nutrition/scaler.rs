//! Portion scaling
//!
//! Rescales a reference nutrient vector to a requested quantity.

use super::error::{check_nutrient, NutritionError, NutritionResult};
use crate::models::NutrientVector;

/// Decimal places kept for gram values
pub const GRAM_PRECISION: i32 = 1;

/// Decimal places kept for calories
pub const CALORIE_PRECISION: i32 = 0;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Scale `base` (given at `base.quantity`) to `target_quantity`.
///
/// Grams are rounded to one decimal place, calories to whole kcal. A zero
/// target yields an all-zero vector. The base quantity must be positive and
/// finite; no fallback is substituted here, callers resolve defaults first.
pub fn scale_nutrients(base: &NutrientVector, target_quantity: f64) -> NutritionResult<NutrientVector> {
    if !base.quantity.is_finite() || base.quantity <= 0.0 {
        return Err(NutritionError::InvalidQuantity {
            field: "base_quantity",
            value: base.quantity,
        });
    }
    if !target_quantity.is_finite() || target_quantity < 0.0 {
        return Err(NutritionError::InvalidQuantity {
            field: "target_quantity",
            value: target_quantity,
        });
    }
    check_nutrient("protein", base.protein)?;
    check_nutrient("fat", base.fat)?;
    check_nutrient("carbs", base.carbs)?;
    check_nutrient("calories", base.calories)?;

    let multiplier = target_quantity / base.quantity;

    Ok(NutrientVector {
        protein: round_to(base.protein * multiplier, GRAM_PRECISION),
        fat: round_to(base.fat * multiplier, GRAM_PRECISION),
        carbs: round_to(base.carbs * multiplier, GRAM_PRECISION),
        calories: round_to(base.calories * multiplier, CALORIE_PRECISION),
        quantity: target_quantity,
    })
}

/// Explicit-argument form of [`scale_nutrients`]
pub fn recalculate_nutrients(
    base_protein: f64,
    base_fat: f64,
    base_carbs: f64,
    base_calories: f64,
    base_quantity: f64,
    target_quantity: f64,
) -> NutritionResult<NutrientVector> {
    let base = NutrientVector::new(base_protein, base_fat, base_carbs, base_calories, base_quantity);
    scale_nutrients(&base, target_quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chicken() -> NutrientVector {
        NutrientVector::new(23.6, 2.0, 0.4, 113.0, 100.0)
    }

    #[test]
    fn test_scale_linear() {
        let scaled = scale_nutrients(&chicken(), 150.0).unwrap();
        assert!((scaled.protein - 35.4).abs() < 0.05);
        assert!((scaled.fat - 3.0).abs() < 0.05);
        assert!((scaled.carbs - 0.6).abs() < 0.05);
        assert_eq!(scaled.calories, 170.0);
        assert_eq!(scaled.quantity, 150.0);
    }

    #[test]
    fn test_scale_linearity_grid() {
        let base = NutrientVector::new(12.3, 4.5, 67.8, 345.0, 80.0);
        for target in [0.0, 1.0, 33.0, 80.0, 125.5, 400.0] {
            let scaled = scale_nutrients(&base, target).unwrap();
            let expected = base.protein * target / base.quantity;
            assert!((scaled.protein - expected).abs() <= 0.05 + 1e-9, "target {}", target);
        }
    }

    #[test]
    fn test_scale_identity() {
        let base = chicken();
        assert_eq!(scale_nutrients(&base, base.quantity).unwrap(), base);
    }

    #[test]
    fn test_scale_to_zero() {
        let scaled = scale_nutrients(&chicken(), 0.0).unwrap();
        assert_eq!(scaled, NutrientVector::zero(0.0));
    }

    #[test]
    fn test_zero_base_quantity_fails() {
        let mut base = chicken();
        base.quantity = 0.0;
        assert_eq!(
            scale_nutrients(&base, 100.0),
            Err(NutritionError::InvalidQuantity { field: "base_quantity", value: 0.0 })
        );
        assert!(recalculate_nutrients(1.0, 1.0, 1.0, 10.0, -100.0, 50.0).is_err());
        assert!(recalculate_nutrients(1.0, 1.0, 1.0, 10.0, f64::NAN, 50.0).is_err());
        assert!(recalculate_nutrients(1.0, 1.0, 1.0, 10.0, f64::INFINITY, 50.0).is_err());
    }

    #[test]
    fn test_negative_target_fails() {
        assert!(matches!(
            scale_nutrients(&chicken(), -1.0),
            Err(NutritionError::InvalidQuantity { field: "target_quantity", .. })
        ));
    }

    #[test]
    fn test_negative_base_nutrient_fails() {
        assert!(matches!(
            recalculate_nutrients(1.0, -2.0, 1.0, 10.0, 100.0, 50.0),
            Err(NutritionError::InvalidNutrientValue { field: "fat", .. })
        ));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.25, 1), 1.3);
        assert_eq!(round_to(169.5, 0), 170.0);
        assert_eq!(round_to(0.04, 1), 0.0);
    }
}
