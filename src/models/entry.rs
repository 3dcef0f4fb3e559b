//! Dated nutrition entries
//!
//! The unit of input for period analytics: one consumed portion on one
//! calendar day.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::NutrientVector;
use crate::nutrition::error::{NutritionError, NutritionResult};

/// Meal type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MealType {
    #[serde(alias = "BREAKFAST")]
    Breakfast,
    #[serde(alias = "LUNCH")]
    Lunch,
    #[serde(alias = "DINNER")]
    Dinner,
    #[serde(alias = "SUPPER", alias = "SNACK")]
    Snack,
    #[serde(alias = "LATE_SUPPER", alias = "late_snack")]
    LateSnack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::LateSnack => "lateSnack",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Some(MealType::Breakfast),
            "lunch" => Some(MealType::Lunch),
            "dinner" => Some(MealType::Dinner),
            "snack" | "supper" => Some(MealType::Snack),
            "latesnack" | "late_snack" | "late_supper" => Some(MealType::LateSnack),
            _ => None,
        }
    }
}

/// One meal-element record, with nutrients at the consumed quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedNutritionEntry {
    /// Calendar day in the timezone the entry was recorded in
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub product_id: Option<String>,
    pub product_name: String,
    pub nutrients: NutrientVector,
}

impl DatedNutritionEntry {
    pub fn new(
        date: NaiveDate,
        meal_type: MealType,
        product_name: impl Into<String>,
        nutrients: NutrientVector,
    ) -> Self {
        Self {
            date,
            meal_type,
            product_id: None,
            product_name: product_name.into(),
            nutrients,
        }
    }

    /// Build from a timezone-aware timestamp, keeping its local calendar day.
    pub fn at<Tz: TimeZone>(
        recorded_at: &DateTime<Tz>,
        meal_type: MealType,
        product_name: impl Into<String>,
        nutrients: NutrientVector,
    ) -> Self {
        Self::new(recorded_at.date_naive(), meal_type, product_name, nutrients)
    }

    pub fn with_product_id(mut self, id: impl Into<String>) -> Self {
        self.product_id = Some(id.into());
        self
    }

    /// Grouping identity for top-product ranking
    pub fn product_key(&self) -> &str {
        self.product_id.as_deref().unwrap_or(&self.product_name)
    }
}

/// Meal record as received from a data-fetch collaborator, before shape
/// validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecord {
    pub date: Option<NaiveDate>,
    pub meal_type: Option<MealType>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub nutrients: Option<NutrientVector>,
}

impl MealRecord {
    /// Validate the record's shape and nutrient values.
    ///
    /// `index` is the record's position in its batch and is reported in the
    /// error.
    pub fn into_entry(self, index: usize) -> NutritionResult<DatedNutritionEntry> {
        let invalid = |reason: &str| NutritionError::InvalidEntry {
            index,
            reason: reason.to_string(),
        };

        let date = self.date.ok_or_else(|| invalid("missing date"))?;
        let meal_type = self.meal_type.ok_or_else(|| invalid("missing meal type"))?;
        let nutrients = self.nutrients.ok_or_else(|| invalid("missing nutrients"))?;
        nutrients.validate().map_err(|e| invalid(&e.to_string()))?;

        let product_name = self
            .product_name
            .or_else(|| self.product_id.clone())
            .unwrap_or_default();

        Ok(DatedNutritionEntry {
            date,
            meal_type,
            product_id: self.product_id,
            product_name,
            nutrients,
        })
    }
}

/// Validate a batch of records, failing on the first malformed one.
pub fn entries_from_records(records: Vec<MealRecord>) -> NutritionResult<Vec<DatedNutritionEntry>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_entry(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_meal_type_wire_names() {
        let parsed: Vec<MealType> =
            serde_json::from_str(r#"["breakfast","lateSnack","SUPPER","LATE_SUPPER","DINNER"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                MealType::Breakfast,
                MealType::LateSnack,
                MealType::Snack,
                MealType::LateSnack,
                MealType::Dinner
            ]
        );
        assert_eq!(serde_json::to_string(&MealType::LateSnack).unwrap(), "\"lateSnack\"");
        assert_eq!(MealType::from_str("Late_Supper"), Some(MealType::LateSnack));
        assert_eq!(MealType::from_str("brunch"), None);
    }

    #[test]
    fn test_entry_keeps_local_calendar_day() {
        // 23:30 at UTC+3 on June 1st is still June 1st for the user
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let recorded = tz.with_ymd_and_hms(2024, 6, 1, 23, 30, 0).unwrap();
        let entry = DatedNutritionEntry::at(
            &recorded,
            MealType::LateSnack,
            "Kefir",
            NutrientVector::new(3.0, 2.5, 4.0, 53.0, 100.0),
        );
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn test_record_validation() {
        let ok = MealRecord {
            date: NaiveDate::from_ymd_opt(2024, 6, 1),
            meal_type: Some(MealType::Lunch),
            product_id: Some("42".into()),
            product_name: None,
            nutrients: Some(NutrientVector::new(1.0, 1.0, 1.0, 17.0, 10.0)),
        };
        let entry = ok.clone().into_entry(0).unwrap();
        assert_eq!(entry.product_name, "42");
        assert_eq!(entry.product_key(), "42");

        let missing_date = MealRecord { date: None, ..ok.clone() };
        assert_eq!(
            missing_date.into_entry(3),
            Err(NutritionError::InvalidEntry { index: 3, reason: "missing date".into() })
        );

        let missing_nutrients = MealRecord { nutrients: None, ..ok.clone() };
        assert!(entries_from_records(vec![ok.clone(), missing_nutrients]).is_err());

        let negative = MealRecord {
            nutrients: Some(NutrientVector::new(1.0, -1.0, 1.0, 17.0, 10.0)),
            ..ok
        };
        assert!(matches!(
            negative.into_entry(1),
            Err(NutritionError::InvalidEntry { index: 1, .. })
        ));
    }
}
