//! Body metrics
//!
//! BMI, basal metabolic rate (Mifflin-St Jeor), recommended daily calories,
//! age and daily progress.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use super::error::{NutritionError, NutritionResult};
use super::scaler::round_to;
use crate::models::{ActivityLevel, Gender, TargetWeightType};

/// BMI classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if bmi < 25.0 {
            BmiCategory::Normal
        } else if bmi < 30.0 {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }
}

fn check_measurement(field: &'static str, value: f64) -> NutritionResult<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(NutritionError::InvalidMeasurement { field, value });
    }
    Ok(value)
}

/// Body mass index from weight in kg and height in cm
pub fn calculate_bmi(weight_kg: f64, height_cm: f64) -> NutritionResult<f64> {
    let weight = check_measurement("weight", weight_kg)?;
    let height_m = check_measurement("height", height_cm)? / 100.0;
    Ok(weight / (height_m * height_m))
}

/// Basal metabolic rate in kcal/day
pub fn calculate_bmr(weight_kg: f64, height_cm: f64, age: u32, gender: Gender) -> NutritionResult<f64> {
    let weight = check_measurement("weight", weight_kg)?;
    let height = check_measurement("height", height_cm)?;
    let base = 10.0 * weight + 6.25 * height - 5.0 * age as f64;
    Ok(match gender {
        Gender::Male => base + 5.0,
        Gender::Female => base - 161.0,
    })
}

/// Recommended daily calories, rounded to whole kcal
pub fn recommended_calories(
    weight_kg: f64,
    height_cm: f64,
    age: u32,
    gender: Gender,
    activity: ActivityLevel,
    target: TargetWeightType,
) -> NutritionResult<f64> {
    let bmr = calculate_bmr(weight_kg, height_cm, age, gender)?;
    Ok((bmr * activity.multiplier() * target.multiplier()).round())
}

/// Percentage of a daily target reached, capped at 100. A zero target is 0.
pub fn progress_percentage(current: f64, target: f64) -> f64 {
    if target == 0.0 || !target.is_finite() || !current.is_finite() {
        return 0.0;
    }
    ((current / target) * 100.0).round().min(100.0)
}

/// Full years between `birthday` and `today`
pub fn age_on(birthday: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birthday.year();
    if (today.month(), today.day()) < (birthday.month(), birthday.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// Days covered by [`weekly_change`], today included
pub const WEEKLY_CHANGE_DAYS: i64 = 7;

/// Weight change over the last seven days, newest minus oldest reading.
///
/// `history` is `(day, kg)` in recording order. Readings outside
/// `today - 6 ..= today` are ignored; fewer than two readings in the window
/// give `None`. Rounded to 0.1 kg.
pub fn weekly_change(history: &[(NaiveDate, f64)], today: NaiveDate) -> Option<f64> {
    let window_start = today - Duration::days(WEEKLY_CHANGE_DAYS - 1);
    let mut recent: Vec<(NaiveDate, f64)> = history
        .iter()
        .copied()
        .filter(|(day, _)| *day >= window_start && *day <= today)
        .collect();
    if recent.len() < 2 {
        return None;
    }
    // Stable, so same-day readings keep recording order
    recent.sort_by_key(|(day, _)| *day);
    let (_, oldest) = recent[0];
    let (_, latest) = recent[recent.len() - 1];
    Some(round_to(latest - oldest, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bmi_and_category() {
        let bmi = calculate_bmi(70.0, 175.0).unwrap();
        assert!((bmi - 22.857).abs() < 0.001);
        assert_eq!(BmiCategory::from_bmi(bmi), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_bmi_rejects_zero_height() {
        assert_eq!(
            calculate_bmi(70.0, 0.0),
            Err(NutritionError::InvalidMeasurement { field: "height", value: 0.0 })
        );
    }

    #[test]
    fn test_bmr_mifflin_st_jeor() {
        // 10*80 + 6.25*180 - 5*30 + 5 = 1780
        assert_eq!(calculate_bmr(80.0, 180.0, 30, Gender::Male), Ok(1780.0));
        // 10*60 + 6.25*165 - 5*25 - 161 = 1345.25
        assert_eq!(calculate_bmr(60.0, 165.0, 25, Gender::Female), Ok(1345.25));
    }

    #[test]
    fn test_recommended_calories() {
        // 1780 * 1.55 * 0.8 = 2207.2
        let kcal = recommended_calories(
            80.0,
            180.0,
            30,
            Gender::Male,
            ActivityLevel::Third,
            TargetWeightType::Lose,
        )
        .unwrap();
        assert_eq!(kcal, 2207.0);
    }

    #[test]
    fn test_progress_percentage() {
        assert_eq!(progress_percentage(500.0, 0.0), 0.0);
        assert_eq!(progress_percentage(1000.0, 2000.0), 50.0);
        assert_eq!(progress_percentage(2500.0, 2000.0), 100.0);
    }

    #[test]
    fn test_age_on_birthday_edge() {
        let birthday = date(1990, 6, 15);
        assert_eq!(age_on(birthday, date(2024, 6, 14)), 33);
        assert_eq!(age_on(birthday, date(2024, 6, 15)), 34);
        assert_eq!(age_on(birthday, date(1980, 1, 1)), 0);
    }

    #[test]
    fn test_weekly_change_needs_two_readings_in_window() {
        let today = date(2024, 6, 12);
        assert_eq!(weekly_change(&[], today), None);
        assert_eq!(weekly_change(&[(date(2024, 6, 10), 80.0)], today), None);

        // The older reading is outside the window, leaving one
        let history = [(date(2024, 6, 5), 81.0), (date(2024, 6, 11), 80.0)];
        assert_eq!(weekly_change(&history, today), None);
    }

    #[test]
    fn test_weekly_change_latest_minus_oldest() {
        let today = date(2024, 6, 12);
        let history = [
            (date(2024, 6, 1), 83.0),
            (date(2024, 6, 6), 81.2),
            (date(2024, 6, 9), 80.7),
            (date(2024, 6, 12), 80.9),
        ];
        assert_eq!(weekly_change(&history, today), Some(-0.3));

        // Order of the input does not matter across days
        let reversed: Vec<_> = history.iter().rev().copied().collect();
        assert_eq!(weekly_change(&reversed, today), Some(-0.3));

        // Future readings are outside the window
        let with_future = [(date(2024, 6, 6), 81.0), (date(2024, 6, 13), 70.0)];
        assert_eq!(weekly_change(&with_future, today), None);
    }
}
