//! Aggregate cache keyed by period
//!
//! Entries never expire; callers invalidate on explicit refresh. Each entry
//! remembers the bounds it was computed for, so a named period whose window
//! has moved with the calendar reads as a miss.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{AnalyticsAggregate, AnalyticsPeriod, DateRange};

#[derive(Debug)]
struct CacheEntry {
    range: DateRange,
    aggregate: Arc<AnalyticsAggregate>,
}

#[derive(Debug, Default)]
pub struct AnalyticsCache {
    entries: HashMap<String, CacheEntry>,
}

impl AnalyticsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached aggregate for `period`, only if it was computed for `range`
    pub fn get(&self, period: &AnalyticsPeriod, range: &DateRange) -> Option<Arc<AnalyticsAggregate>> {
        self.entries
            .get(&period.key())
            .filter(|e| e.range == *range)
            .map(|e| e.aggregate.clone())
    }

    pub fn put(&mut self, period: &AnalyticsPeriod, range: DateRange, aggregate: Arc<AnalyticsAggregate>) {
        self.entries.insert(period.key(), CacheEntry { range, aggregate });
    }

    /// Drop one period, or every period when `None`
    pub fn invalidate(&mut self, period: Option<&AnalyticsPeriod>) {
        match period {
            Some(p) => {
                self.entries.remove(&p.key());
            }
            None => self.entries.clear(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bounds(from: u32, to: u32) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, from).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, to).unwrap(),
        )
        .unwrap()
    }

    fn range(from: u32, to: u32) -> AnalyticsPeriod {
        let b = bounds(from, to);
        AnalyticsPeriod::range(b.from, b.to).unwrap()
    }

    #[test]
    fn test_get_put_invalidate() {
        let mut cache = AnalyticsCache::new();
        let week = bounds(10, 16);
        assert!(cache.get(&AnalyticsPeriod::Week, &week).is_none());

        let agg = Arc::new(AnalyticsAggregate::default());
        cache.put(&AnalyticsPeriod::Week, week, agg.clone());
        cache.put(&range(1, 7), bounds(1, 7), agg.clone());
        assert!(Arc::ptr_eq(&cache.get(&AnalyticsPeriod::Week, &week).unwrap(), &agg));

        // Equal bounds share the key
        assert!(cache.get(&range(1, 7), &bounds(1, 7)).is_some());
        assert!(cache.get(&range(1, 8), &bounds(1, 8)).is_none());

        cache.invalidate(Some(&AnalyticsPeriod::Week));
        assert!(cache.get(&AnalyticsPeriod::Week, &week).is_none());
        assert_eq!(cache.len(), 1);

        cache.invalidate(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_moved_window_is_a_miss() {
        let mut cache = AnalyticsCache::new();
        let day = bounds(11, 11);
        cache.put(&AnalyticsPeriod::Day, day, Arc::new(AnalyticsAggregate::default()));

        assert!(cache.get(&AnalyticsPeriod::Day, &day).is_some());
        assert!(cache.get(&AnalyticsPeriod::Day, &bounds(12, 12)).is_none());
        // A miss does not evict; the next put replaces it
        assert_eq!(cache.len(), 1);
    }
}
