//! Analytics MCP Tools
//!
//! Period KPIs, trends, distribution and top products from the analytics
//! store.

use serde::Serialize;

use crate::analytics::AnalyticsStore;
use crate::models::{
    AnalyticsAggregate, AnalyticsPeriod, DailyTotals, DistributionSnapshot, SummaryKpi, TopProduct,
    TrendMetric, TrendPoint,
};

/// Response for get_analytics and refresh_analytics
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub period: AnalyticsPeriod,
    pub summary: SummaryKpi,
    pub daily: Vec<DailyTotals>,
    pub distribution: DistributionSnapshot,
    pub top_products: Vec<TopProduct>,
    /// No entries in the period; zeros below are placeholders, not measurements
    pub insufficient_data: bool,
}

impl AnalyticsResponse {
    fn new(period: AnalyticsPeriod, aggregate: &AnalyticsAggregate) -> Self {
        Self {
            period,
            summary: aggregate.summary.clone(),
            daily: aggregate.trend.clone(),
            distribution: aggregate.distribution.clone(),
            top_products: aggregate.top_products.clone(),
            insufficient_data: aggregate.summary.is_insufficient(),
        }
    }
}

/// Response for get_trend
#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub period: AnalyticsPeriod,
    pub metric: TrendMetric,
    pub points: Vec<TrendPoint>,
    pub insufficient_data: bool,
}

/// Select `period` and return its analytics, from cache when available
pub async fn get_analytics(
    store: &AnalyticsStore,
    period: AnalyticsPeriod,
    force: bool,
) -> Result<AnalyticsResponse, String> {
    if store.period() != period {
        store.set_period(period);
    }
    let aggregate = store
        .fetch_all_for_period(force)
        .await
        .map_err(|e| format!("Failed to load analytics: {}", e))?;
    Ok(AnalyticsResponse::new(period, &aggregate))
}

/// Per-day series of one metric for `period`
pub async fn get_trend(
    store: &AnalyticsStore,
    period: AnalyticsPeriod,
    metric: &str,
) -> Result<TrendResponse, String> {
    let metric = TrendMetric::from_str(metric).ok_or_else(|| {
        format!("Invalid metric '{}'. Must be one of: calories, protein, fat, carbs", metric)
    })?;

    if store.period() != period {
        store.set_period(period);
    }
    let aggregate = store
        .fetch_all_for_period(false)
        .await
        .map_err(|e| format!("Failed to load analytics: {}", e))?;

    let series = aggregate.trend_series(metric);
    Ok(TrendResponse {
        period,
        metric,
        insufficient_data: series.is_insufficient(),
        points: series.points,
    })
}

/// Drop cached analytics and reload.
///
/// With `period`, that period is selected and only its cache entry dropped;
/// otherwise every cached period is dropped and the selection reloaded.
pub async fn refresh_analytics(
    store: &AnalyticsStore,
    period: Option<AnalyticsPeriod>,
) -> Result<AnalyticsResponse, String> {
    if let Some(p) = period {
        if store.period() != p {
            store.set_period(p);
        }
    }
    store.invalidate(period.as_ref());
    let selected = store.period();
    let aggregate = store
        .fetch_all_for_period(true)
        .await
        .map_err(|e| format!("Failed to refresh analytics: {}", e))?;
    Ok(AnalyticsResponse::new(selected, &aggregate))
}
