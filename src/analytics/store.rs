//! Analytics store
//!
//! Holds the selected period, the aggregate on display and the per-period
//! cache, and coordinates fetches so that concurrent requests for one period
//! share a single load.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use futures::future::{BoxFuture, FutureExt, Shared};

use super::{AnalyticsCache, AnalyticsError, Clock, EntrySource};
use crate::models::{
    AnalyticsAggregate, AnalyticsPeriod, DateRange, DistributionSnapshot, MacroShare, SummaryKpi, TopProduct,
    TrendMetric, TrendSeries,
};
use crate::nutrition::aggregate;

/// Number of ranked products kept per period unless configured otherwise
pub const DEFAULT_TOP_PRODUCTS: usize = 10;

type LoadResult = Result<Arc<AnalyticsAggregate>, AnalyticsError>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

struct InFlight {
    request_id: u64,
    /// Bounds the fetch was resolved to; a later request for other bounds does not join it
    range: DateRange,
    load: SharedLoad,
}

#[derive(Default)]
struct StoreState {
    period: AnalyticsPeriod,
    current: Option<Arc<AnalyticsAggregate>>,
    error: Option<String>,
    cache: AnalyticsCache,
    in_flight: HashMap<String, InFlight>,
    /// Newest request id per period key; only that request may write the cache
    latest_request: HashMap<String, u64>,
    next_request_id: u64,
}

enum Start {
    Cached(Arc<AnalyticsAggregate>),
    Wait(SharedLoad),
}

fn lock_state(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared handle to the analytics state. Clones refer to the same store.
#[derive(Clone)]
pub struct AnalyticsStore {
    state: Arc<Mutex<StoreState>>,
    source: Arc<dyn EntrySource>,
    clock: Arc<dyn Clock>,
    top_limit: usize,
}

impl AnalyticsStore {
    pub fn new(source: Arc<dyn EntrySource>, clock: Arc<dyn Clock>, top_limit: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            source,
            clock,
            top_limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        lock_state(&self.state)
    }

    // ========================================================================
    // Period selection
    // ========================================================================

    pub fn period(&self) -> AnalyticsPeriod {
        self.lock().period
    }

    /// Current local day according to the store's clock
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Select a period. A cached aggregate for its current bounds is shown
    /// immediately, otherwise the display is empty until the next load
    /// completes.
    pub fn set_period(&self, period: AnalyticsPeriod) {
        let range = period.resolve(self.clock.today()).ok();
        let mut state = self.lock();
        let shown = range.and_then(|r| state.cache.get(&period, &r));
        state.current = shown;
        state.error = None;
        state.period = period;
        tracing::debug!(key = %period.key(), cached = state.current.is_some(), "Period selected");
    }

    /// Load the selected period
    pub async fn fetch_all_for_period(&self, force: bool) -> LoadResult {
        let period = self.period();
        self.load(period, force).await
    }

    /// Load the aggregate for `period`.
    ///
    /// Without `force` a cached aggregate is returned as is and a request for
    /// a period already being fetched joins that fetch, provided both were
    /// resolved to the same bounds. With `force` a new fetch always starts
    /// and supersedes any older one for the same period. The result is shown
    /// only if `period` is still selected when it lands.
    ///
    /// The fetch runs as its own task, so it completes and updates the store
    /// even if every caller stops waiting.
    pub async fn load(&self, period: AnalyticsPeriod, force: bool) -> LoadResult {
        match self.start(period, force)? {
            Start::Cached(aggregate) => Ok(aggregate),
            Start::Wait(load) => load.await,
        }
    }

    fn start(&self, period: AnalyticsPeriod, force: bool) -> Result<Start, AnalyticsError> {
        let key = period.key();
        // Named windows follow the calendar, so resolve on every request
        let range = period.resolve(self.clock.today())?;

        let mut state = self.lock();

        if !force {
            if let Some(hit) = state.cache.get(&period, &range) {
                tracing::debug!(key = %key, "Analytics cache hit");
                if state.period.key() == key {
                    state.current = Some(hit.clone());
                    state.error = None;
                }
                return Ok(Start::Cached(hit));
            }
            if let Some(pending) = state.in_flight.get(&key).filter(|f| f.range == range) {
                tracing::debug!(key = %key, request_id = pending.request_id, "Joining in-flight fetch");
                return Ok(Start::Wait(pending.load.clone()));
            }
        }

        state.next_request_id += 1;
        let request_id = state.next_request_id;
        state.latest_request.insert(key.clone(), request_id);

        let source = self.source.clone();
        let top_limit = self.top_limit;
        let shared_state = self.state.clone();
        let task_key = key.clone();
        // The task cannot finish before this guard drops, so in_flight is set first
        let handle = tokio::spawn(async move {
            let result: LoadResult = async {
                let entries = source.fetch_entries(range).await?;
                let aggregate = aggregate(&entries, top_limit)?;
                Ok::<_, AnalyticsError>(Arc::new(aggregate))
            }
            .await;
            Self::finish(&shared_state, period, &task_key, range, request_id, &result);
            result
        });

        let load = handle
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(AnalyticsError::Fetch(format!("Analytics task failed: {}", e)))
                })
            })
            .boxed()
            .shared();

        state.in_flight.insert(
            key.clone(),
            InFlight {
                request_id,
                range,
                load: load.clone(),
            },
        );
        if state.period.key() == key {
            state.error = None;
        }

        tracing::info!(key = %key, request_id, from = %range.from, to = %range.to, force, "Fetching analytics");
        Ok(Start::Wait(load))
    }

    fn finish(
        state: &Mutex<StoreState>,
        period: AnalyticsPeriod,
        key: &str,
        range: DateRange,
        request_id: u64,
        result: &LoadResult,
    ) {
        let mut state = lock_state(state);

        if state.in_flight.get(key).map(|f| f.request_id) == Some(request_id) {
            state.in_flight.remove(key);
        }

        let is_latest = state.latest_request.get(key) == Some(&request_id);
        let is_selected = state.period.key() == key;

        match result {
            Ok(aggregate) => {
                if !is_latest {
                    tracing::debug!(key, request_id, "Superseded result not cached");
                    return;
                }
                state.cache.put(&period, range, aggregate.clone());
                if is_selected {
                    state.current = Some(aggregate.clone());
                    state.error = None;
                } else {
                    tracing::debug!(key, request_id, "Period no longer selected, result cached only");
                }
            }
            Err(e) => {
                tracing::warn!(key, request_id, error = %e, "Analytics fetch failed");
                if is_latest && is_selected {
                    state.error = Some(e.to_string());
                }
            }
        }
    }

    // ========================================================================
    // Cache lifecycle
    // ========================================================================

    /// Forget cached aggregates for one period, or all when `None`.
    ///
    /// Fetches already running are detached: their callers still receive a
    /// result, but it is neither cached nor shown.
    pub fn invalidate(&self, period: Option<&AnalyticsPeriod>) {
        let mut state = self.lock();
        state.cache.invalidate(period);
        match period {
            Some(p) => {
                let key = p.key();
                state.in_flight.remove(&key);
                state.latest_request.remove(&key);
            }
            None => {
                state.in_flight.clear();
                state.latest_request.clear();
            }
        }
        tracing::debug!(period = ?period.map(|p| p.key()), "Analytics cache invalidated");
    }

    /// Return to the initial state: default period, nothing cached or shown.
    pub fn reset(&self) {
        let mut state = self.lock();
        let next_request_id = state.next_request_id;
        *state = StoreState {
            next_request_id,
            ..StoreState::default()
        };
    }

    // ========================================================================
    // Selectors
    // ========================================================================

    /// Aggregate on display for the selected period
    pub fn current(&self) -> Option<Arc<AnalyticsAggregate>> {
        self.lock().current.clone()
    }

    /// Cached aggregate for `period` at its current bounds
    pub fn cached(&self, period: &AnalyticsPeriod) -> Option<Arc<AnalyticsAggregate>> {
        let range = period.resolve(self.clock.today()).ok()?;
        self.lock().cache.get(period, &range)
    }

    pub fn summary(&self) -> Option<SummaryKpi> {
        self.current().map(|a| a.summary.clone())
    }

    pub fn trend_series(&self, metric: TrendMetric) -> Option<TrendSeries> {
        self.current().map(|a| a.trend_series(metric))
    }

    pub fn macro_share(&self) -> Option<MacroShare> {
        self.current().map(|a| a.distribution.macro_share.clone())
    }

    pub fn distribution(&self) -> Option<DistributionSnapshot> {
        self.current().map(|a| a.distribution.clone())
    }

    pub fn top_products(&self) -> Vec<TopProduct> {
        self.current()
            .map(|a| a.top_products.clone())
            .unwrap_or_default()
    }

    /// Whether a fetch for the selected period is running
    pub fn is_loading(&self) -> bool {
        let state = self.lock();
        state.in_flight.contains_key(&state.period.key())
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::FixedClock;
    use crate::models::{DatedNutritionEntry, MealType, NutrientVector};
    use crate::nutrition::NutritionError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn entry(day: u32, name: &str, kcal: f64) -> DatedNutritionEntry {
        DatedNutritionEntry::new(
            date(day),
            MealType::Lunch,
            name,
            NutrientVector::new(10.0, 10.0, 10.0, kcal, 100.0),
        )
    }

    /// Jun 3 falls in the previous week of the fixed clock, Jun 11 in the current one
    fn sample_entries() -> Vec<DatedNutritionEntry> {
        vec![entry(3, "Oatmeal", 500.0), entry(11, "Soup", 300.0)]
    }

    struct TestSource {
        entries: Vec<DatedNutritionEntry>,
        gated: bool,
        fail: bool,
        gates: Mutex<HashMap<DateRange, Arc<Notify>>>,
        ranges: Mutex<Vec<DateRange>>,
        calls: AtomicUsize,
    }

    impl TestSource {
        fn new(entries: Vec<DatedNutritionEntry>) -> Self {
            Self {
                entries,
                gated: false,
                fail: false,
                gates: Mutex::new(HashMap::new()),
                ranges: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn gated(entries: Vec<DatedNutritionEntry>) -> Self {
            Self {
                gated: true,
                ..Self::new(entries)
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(Vec::new())
            }
        }

        fn gate(&self, range: DateRange) -> Arc<Notify> {
            self.gates
                .lock()
                .unwrap()
                .entry(range)
                .or_insert_with(|| Arc::new(Notify::new()))
                .clone()
        }

        fn release(&self, range: DateRange) {
            self.gate(range).notify_one();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn wait_for_calls(&self, n: usize) {
            while self.calls() < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl EntrySource for TestSource {
        async fn fetch_entries(
            &self,
            range: DateRange,
        ) -> Result<Vec<DatedNutritionEntry>, AnalyticsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ranges.lock().unwrap().push(range);
            if self.gated {
                self.gate(range).notified().await;
            }
            if self.fail {
                return Err(AnalyticsError::Fetch("connection refused".to_string()));
            }
            Ok(self
                .entries
                .iter()
                .filter(|e| range.contains(e.date))
                .cloned()
                .collect())
        }
    }

    /// 2024-06-12 is a Wednesday: week is Jun 10..16, month is Jun 1..30
    fn store_with(source: Arc<TestSource>) -> AnalyticsStore {
        AnalyticsStore::new(source, Arc::new(FixedClock(date(12))), DEFAULT_TOP_PRODUCTS)
    }

    fn week_range() -> DateRange {
        DateRange::new(date(10), date(16)).unwrap()
    }

    fn month_range() -> DateRange {
        DateRange::new(date(1), date(30)).unwrap()
    }

    #[tokio::test]
    async fn test_load_populates_cache_and_display() {
        let source = Arc::new(TestSource::new(sample_entries()));
        let store = store_with(source.clone());

        assert_eq!(store.period(), AnalyticsPeriod::Week);
        assert!(store.summary().is_none());
        assert!(store.top_products().is_empty());

        let week = store.fetch_all_for_period(false).await.unwrap();
        assert_eq!(week.summary.total_calories, 300.0);
        assert_eq!(store.summary().unwrap().total_calories, 300.0);
        assert_eq!(store.trend_series(TrendMetric::Calories).unwrap().points.len(), 1);
        assert_eq!(store.top_products()[0].name, "Soup");
        assert!(!store.macro_share().unwrap().is_insufficient());
        assert_eq!(store.distribution().unwrap().by_meal_type.len(), 1);
        assert!(!store.is_loading());

        // Served from cache without another fetch
        let again = store.load(AnalyticsPeriod::Week, false).await.unwrap();
        assert!(Arc::ptr_eq(&week, &again));
        assert_eq!(source.calls(), 1);
        assert_eq!(source.ranges.lock().unwrap()[0], week_range());
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_fetch() {
        let source = Arc::new(TestSource::gated(sample_entries()));
        let store = store_with(source.clone());

        let (a, b, _) = tokio::join!(
            store.load(AnalyticsPeriod::Week, false),
            store.load(AnalyticsPeriod::Week, false),
            async {
                source.wait_for_calls(1).await;
                assert!(store.is_loading());
                source.release(week_range());
            }
        );

        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.calls(), 1);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_late_result_for_deselected_period_is_not_shown() {
        let source = Arc::new(TestSource::gated(sample_entries()));
        let store = store_with(source.clone());

        let (week, month, _) = tokio::join!(
            store.load(AnalyticsPeriod::Week, false),
            async {
                source.wait_for_calls(1).await;
                store.set_period(AnalyticsPeriod::Month);
                store.load(AnalyticsPeriod::Month, false).await
            },
            async {
                source.wait_for_calls(2).await;
                source.release(month_range());
                while store.current().is_none() {
                    tokio::task::yield_now().await;
                }
                source.release(week_range());
            }
        );

        assert_eq!(week.unwrap().summary.total_calories, 300.0);
        assert_eq!(month.unwrap().summary.total_calories, 800.0);

        // Display keeps the month; the late week result only lands in the cache
        assert_eq!(store.period(), AnalyticsPeriod::Month);
        assert_eq!(store.summary().unwrap().total_calories, 800.0);
        let cached_week = store.cached(&AnalyticsPeriod::Week).unwrap();
        assert_eq!(cached_week.summary.total_calories, 300.0);

        store.set_period(AnalyticsPeriod::Week);
        assert_eq!(store.summary().unwrap().total_calories, 300.0);
    }

    #[tokio::test]
    async fn test_force_refresh_refetches() {
        let source = Arc::new(TestSource::new(sample_entries()));
        let store = store_with(source.clone());

        let first = store.load(AnalyticsPeriod::Week, false).await.unwrap();
        let forced = store.load(AnalyticsPeriod::Week, true).await.unwrap();

        assert_eq!(source.calls(), 2);
        assert!(!Arc::ptr_eq(&first, &forced));
        assert!(Arc::ptr_eq(&store.cached(&AnalyticsPeriod::Week).unwrap(), &forced));
        assert!(Arc::ptr_eq(&store.current().unwrap(), &forced));
    }

    #[tokio::test]
    async fn test_only_newest_request_writes_cache() {
        let source = Arc::new(TestSource::gated(sample_entries()));
        let store = store_with(source.clone());

        let (older, newer, _) = tokio::join!(
            store.load(AnalyticsPeriod::Week, false),
            async {
                source.wait_for_calls(1).await;
                store.load(AnalyticsPeriod::Week, true).await
            },
            async {
                source.wait_for_calls(2).await;
                source.release(week_range());
                source.release(week_range());
            }
        );

        let (older, newer) = (older.unwrap(), newer.unwrap());
        assert!(!Arc::ptr_eq(&older, &newer));
        assert!(Arc::ptr_eq(&store.cached(&AnalyticsPeriod::Week).unwrap(), &newer));
        assert!(Arc::ptr_eq(&store.current().unwrap(), &newer));
    }

    #[tokio::test]
    async fn test_invalidate_and_reset() {
        let source = Arc::new(TestSource::new(sample_entries()));
        let store = store_with(source.clone());

        store.load(AnalyticsPeriod::Week, false).await.unwrap();
        store.load(AnalyticsPeriod::Month, false).await.unwrap();

        store.invalidate(Some(&AnalyticsPeriod::Week));
        assert!(store.cached(&AnalyticsPeriod::Week).is_none());
        assert!(store.cached(&AnalyticsPeriod::Month).is_some());

        store.load(AnalyticsPeriod::Week, false).await.unwrap();
        assert_eq!(source.calls(), 3);

        store.invalidate(None);
        assert!(store.cached(&AnalyticsPeriod::Month).is_none());

        store.set_period(AnalyticsPeriod::Month);
        store.reset();
        assert_eq!(store.period(), AnalyticsPeriod::Week);
        assert!(store.current().is_none());
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_fetch_error_is_recorded() {
        let store = store_with(Arc::new(TestSource::failing()));

        let result = store.fetch_all_for_period(false).await;
        assert!(matches!(result, Err(AnalyticsError::Fetch(_))));
        assert!(store.last_error().unwrap().contains("connection refused"));
        assert!(!store.is_loading());
        assert!(store.cached(&AnalyticsPeriod::Week).is_none());

        // Selecting a period clears the stale error
        store.set_period(AnalyticsPeriod::Day);
        assert!(store.last_error().is_none());
    }

    #[tokio::test]
    async fn test_invalid_entries_fail_the_load() {
        let bad = DatedNutritionEntry::new(
            date(11),
            MealType::Dinner,
            "Broken",
            NutrientVector::new(-1.0, 0.0, 0.0, 0.0, 100.0),
        );
        let store = store_with(Arc::new(TestSource::new(vec![bad])));

        let result = store.load(AnalyticsPeriod::Week, false).await;
        assert!(matches!(
            result,
            Err(AnalyticsError::Nutrition(NutritionError::InvalidEntry { index: 0, .. }))
        ));
        assert!(store.last_error().is_some());
    }

    #[tokio::test]
    async fn test_empty_period_is_insufficient() {
        let store = store_with(Arc::new(TestSource::new(Vec::new())));

        store.set_period(AnalyticsPeriod::Day);
        store.fetch_all_for_period(false).await.unwrap();

        assert!(store.summary().unwrap().is_insufficient());
        assert!(store.trend_series(TrendMetric::Protein).unwrap().is_insufficient());
        assert!(store.macro_share().unwrap().is_insufficient());
    }

    struct SteppingClock(Mutex<NaiveDate>);

    impl Clock for SteppingClock {
        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    fn single_day(d: u32) -> DateRange {
        DateRange::new(date(d), date(d)).unwrap()
    }

    #[tokio::test]
    async fn test_named_period_follows_clock() {
        let source = Arc::new(TestSource::new(sample_entries()));
        let clock = Arc::new(SteppingClock(Mutex::new(date(11))));
        let store = AnalyticsStore::new(source.clone(), clock.clone(), DEFAULT_TOP_PRODUCTS);

        let day = store.load(AnalyticsPeriod::Day, false).await.unwrap();
        assert_eq!(day.summary.total_calories, 300.0);
        assert!(store.cached(&AnalyticsPeriod::Day).is_some());

        // After midnight the cached Day no longer matches today
        *clock.0.lock().unwrap() = date(12);
        assert!(store.cached(&AnalyticsPeriod::Day).is_none());
        store.set_period(AnalyticsPeriod::Day);
        assert!(store.current().is_none());

        let day = store.load(AnalyticsPeriod::Day, false).await.unwrap();
        assert!(day.summary.is_insufficient());
        assert_eq!(source.calls(), 2);
        assert!(store.summary().unwrap().is_insufficient());

        let ranges = source.ranges.lock().unwrap();
        assert_eq!(ranges[0], single_day(11));
        assert_eq!(ranges[1], single_day(12));
    }

    #[tokio::test]
    async fn test_fetch_for_previous_day_is_not_joined() {
        let source = Arc::new(TestSource::gated(sample_entries()));
        let clock = Arc::new(SteppingClock(Mutex::new(date(11))));
        let store = AnalyticsStore::new(source.clone(), clock.clone(), DEFAULT_TOP_PRODUCTS);

        let (yesterday, today, _) = tokio::join!(
            store.load(AnalyticsPeriod::Day, false),
            async {
                source.wait_for_calls(1).await;
                *clock.0.lock().unwrap() = date(12);
                store.load(AnalyticsPeriod::Day, false).await
            },
            async {
                source.wait_for_calls(2).await;
                source.release(single_day(11));
                source.release(single_day(12));
            }
        );

        assert_eq!(yesterday.unwrap().summary.total_calories, 300.0);
        let today = today.unwrap();
        assert!(today.summary.is_insufficient());
        assert_eq!(source.calls(), 2);
        assert!(Arc::ptr_eq(&store.cached(&AnalyticsPeriod::Day).unwrap(), &today));
    }

    #[tokio::test]
    async fn test_abandoned_load_still_completes() {
        let source = Arc::new(TestSource::gated(sample_entries()));
        let store = store_with(source.clone());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(5), store.fetch_all_for_period(false)).await;
        assert!(abandoned.is_err());
        assert!(store.is_loading());

        source.release(week_range());
        tokio::time::timeout(Duration::from_secs(5), async {
            while store.is_loading() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();

        assert_eq!(store.cached(&AnalyticsPeriod::Week).unwrap().summary.total_calories, 300.0);
        assert_eq!(store.summary().unwrap().total_calories, 300.0);
        assert_eq!(source.calls(), 1);
    }
}
