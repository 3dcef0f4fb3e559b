//! Period aggregation
//!
//! Folds dated nutrition entries into KPIs, per-day trends, macro and meal-type
//! distributions and a top-products ranking. Every operation validates its
//! input first and is total over valid input, including the empty list.

use std::collections::{BTreeMap, HashMap};

use super::calories::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use super::error::{NutritionError, NutritionResult};
use crate::models::{
    AnalyticsAggregate, DailyTotals, DatedNutritionEntry, DistributionSnapshot, MacroShare,
    MacroTag, MealTypeCalories, NutrientVector, SummaryKpi, TopProduct, TrendMetric, TrendSeries,
};

/// Share of a product's macro energy above which it is tagged by that macro
const DOMINANT_MACRO_SHARE: f64 = 0.5;

/// Reject entries whose nutrients are negative or not finite
pub fn validate_entries(entries: &[DatedNutritionEntry]) -> NutritionResult<()> {
    for (index, entry) in entries.iter().enumerate() {
        entry
            .nutrients
            .validate()
            .map_err(|e| NutritionError::InvalidEntry {
                index,
                reason: e.to_string(),
            })?;
    }
    Ok(())
}

fn per_day(total: f64, days: usize) -> f64 {
    if days > 0 {
        total / days as f64
    } else {
        0.0
    }
}

/// Period totals and zero-guarded daily averages
pub fn summarize(entries: &[DatedNutritionEntry]) -> NutritionResult<SummaryKpi> {
    validate_entries(entries)?;

    let totals: NutrientVector = entries.iter().map(|e| e.nutrients).sum();
    let days_count = entries
        .iter()
        .map(|e| e.date)
        .collect::<std::collections::HashSet<_>>()
        .len();

    Ok(SummaryKpi {
        total_calories: totals.calories,
        average_daily_calories: per_day(totals.calories, days_count),
        total_protein: totals.protein,
        average_daily_protein: per_day(totals.protein, days_count),
        total_fat: totals.fat,
        average_daily_fat: per_day(totals.fat, days_count),
        total_carbs: totals.carbs,
        average_daily_carbs: per_day(totals.carbs, days_count),
        meals_count: entries.len(),
        days_count,
    })
}

/// Per-day sums for every metric, ascending by date, days without entries omitted
pub fn daily_totals(entries: &[DatedNutritionEntry]) -> NutritionResult<Vec<DailyTotals>> {
    validate_entries(entries)?;

    let mut by_date: BTreeMap<chrono::NaiveDate, NutrientVector> = BTreeMap::new();
    for entry in entries {
        let day = by_date.entry(entry.date).or_default();
        *day = *day + entry.nutrients;
    }

    Ok(by_date
        .into_iter()
        .map(|(date, n)| DailyTotals {
            date,
            calories: n.calories,
            protein: n.protein,
            fat: n.fat,
            carbs: n.carbs,
        })
        .collect())
}

/// Sparse trend for one metric
pub fn trend(entries: &[DatedNutritionEntry], metric: TrendMetric) -> NutritionResult<TrendSeries> {
    let daily = daily_totals(entries)?;
    Ok(TrendSeries::from_daily(&daily, metric))
}

fn macro_share(totals: &NutrientVector) -> MacroShare {
    let protein_kcal = totals.protein * KCAL_PER_GRAM_PROTEIN;
    let fat_kcal = totals.fat * KCAL_PER_GRAM_FAT;
    let carbs_kcal = totals.carbs * KCAL_PER_GRAM_CARBS;
    let total = protein_kcal + fat_kcal + carbs_kcal;

    if total <= 0.0 {
        return MacroShare::default();
    }

    MacroShare {
        protein_pct: (protein_kcal / total * 100.0).round(),
        fat_pct: (fat_kcal / total * 100.0).round(),
        carbs_pct: (carbs_kcal / total * 100.0).round(),
        total_macro_kcal: total,
    }
}

/// Macro energy shares and calories per meal type
pub fn distribution(entries: &[DatedNutritionEntry]) -> NutritionResult<DistributionSnapshot> {
    validate_entries(entries)?;

    let totals: NutrientVector = entries.iter().map(|e| e.nutrients).sum();

    let mut by_meal_type: Vec<MealTypeCalories> = Vec::new();
    for entry in entries {
        match by_meal_type.iter_mut().find(|m| m.meal_type == entry.meal_type) {
            Some(existing) => existing.calories += entry.nutrients.calories,
            None => by_meal_type.push(MealTypeCalories {
                meal_type: entry.meal_type,
                calories: entry.nutrients.calories,
            }),
        }
    }

    Ok(DistributionSnapshot {
        macro_share: macro_share(&totals),
        by_meal_type,
    })
}

fn macro_tag(totals: &NutrientVector) -> MacroTag {
    let share = macro_share(totals);
    if share.is_insufficient() {
        return MacroTag::Mixed;
    }
    let threshold = DOMINANT_MACRO_SHARE * 100.0;
    if share.protein_pct >= threshold {
        MacroTag::Protein
    } else if share.fat_pct >= threshold {
        MacroTag::Fat
    } else if share.carbs_pct >= threshold {
        MacroTag::Carbs
    } else {
        MacroTag::Mixed
    }
}

/// Products ranked by contributed calories, descending.
///
/// Products are identified by id when present, otherwise by name. Ties keep
/// first-occurrence order.
pub fn top_products(entries: &[DatedNutritionEntry], limit: usize) -> NutritionResult<Vec<TopProduct>> {
    validate_entries(entries)?;

    let mut order: Vec<(String, String, NutrientVector)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        let key = entry.product_key();
        match index.get(key) {
            Some(&i) => order[i].2 = order[i].2 + entry.nutrients,
            None => {
                index.insert(key, order.len());
                order.push((key.to_string(), entry.product_name.clone(), entry.nutrients));
            }
        }
    }

    let mut ranked: Vec<TopProduct> = order
        .into_iter()
        .map(|(id, name, totals)| TopProduct {
            id,
            name,
            calories: totals.calories,
            macro_tag: macro_tag(&totals),
        })
        .collect();

    // sort_by is stable, so equal totals stay in first-occurrence order
    ranked.sort_by(|a, b| b.calories.total_cmp(&a.calories));
    ranked.truncate(limit);
    Ok(ranked)
}

/// Full payload for one period
pub fn aggregate(entries: &[DatedNutritionEntry], top_limit: usize) -> NutritionResult<AnalyticsAggregate> {
    Ok(AnalyticsAggregate {
        summary: summarize(entries)?,
        trend: daily_totals(entries)?,
        distribution: distribution(entries)?,
        top_products: top_products(entries, top_limit)?,
    })
}
