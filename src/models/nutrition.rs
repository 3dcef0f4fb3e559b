//! Shared nutrient vector
//!
//! Used across products, meal entries and the period aggregator.

use serde::{Deserialize, Serialize};

use crate::nutrition::calories::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use crate::nutrition::error::{check_nutrient, NutritionError, NutritionResult};

/// Nutrient content of a product at a specific quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientVector {
    pub protein: f64,  // grams
    pub fat: f64,      // grams
    pub carbs: f64,    // grams
    pub calories: f64, // kcal
    pub quantity: f64, // in the product's unit, usually grams
}

impl NutrientVector {
    pub fn new(protein: f64, fat: f64, carbs: f64, calories: f64, quantity: f64) -> Self {
        Self {
            protein,
            fat,
            carbs,
            calories,
            quantity,
        }
    }

    /// All nutrient fields zero at the given quantity
    pub fn zero(quantity: f64) -> Self {
        Self {
            quantity,
            ..Self::default()
        }
    }

    /// Check that every nutrient field is finite and non-negative.
    ///
    /// Quantity must be finite and non-negative; a zero quantity is a valid
    /// (empty) portion.
    pub fn validate(&self) -> NutritionResult<()> {
        check_nutrient("protein", self.protein)?;
        check_nutrient("fat", self.fat)?;
        check_nutrient("carbs", self.carbs)?;
        check_nutrient("calories", self.calories)?;
        if !self.quantity.is_finite() || self.quantity < 0.0 {
            return Err(NutritionError::InvalidQuantity {
                field: "quantity",
                value: self.quantity,
            });
        }
        Ok(())
    }

    /// Energy from macros using the 4-9-4 densities, unrounded
    pub fn macro_kcal(&self) -> f64 {
        self.protein * KCAL_PER_GRAM_PROTEIN
            + self.fat * KCAL_PER_GRAM_FAT
            + self.carbs * KCAL_PER_GRAM_CARBS
    }

    /// Supplied calories minus macro-derived calories.
    ///
    /// Label values round each macro independently, so small discrepancies are
    /// expected and preserved.
    pub fn calorie_discrepancy(&self) -> f64 {
        self.calories - self.macro_kcal()
    }

    /// Whether supplied calories match the macros within `tolerance` kcal
    pub fn is_calorie_consistent(&self, tolerance: f64) -> bool {
        self.calorie_discrepancy().abs() <= tolerance
    }

    /// Add another vector's nutrients and quantity to this one
    pub fn add(&self, other: &NutrientVector) -> Self {
        Self {
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            carbs: self.carbs + other.carbs,
            calories: self.calories + other.calories,
            quantity: self.quantity + other.quantity,
        }
    }
}

impl std::ops::Add for NutrientVector {
    type Output = NutrientVector;

    fn add(self, other: NutrientVector) -> NutrientVector {
        NutrientVector::add(&self, &other)
    }
}

impl std::iter::Sum for NutrientVector {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(NutrientVector::default(), |acc, n| acc + n)
    }
}
