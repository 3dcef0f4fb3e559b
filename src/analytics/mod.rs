//! Analytics state
//!
//! Period selection, per-period aggregate cache and fetch coordination.

pub mod cache;
pub mod clock;
pub mod source;
pub mod store;

use thiserror::Error;

use crate::nutrition::NutritionError;

pub use cache::AnalyticsCache;
pub use clock::{is_valid_timezone, parse_timezone, Clock, FixedClock, SystemClock};
pub use source::{EntrySource, SqliteEntrySource};
pub use store::{AnalyticsStore, DEFAULT_TOP_PRODUCTS};

/// Failures surfaced by an analytics load. Cloneable so that one fetch can
/// be handed to every coalesced caller.
#[derive(Debug, Clone, Error)]
pub enum AnalyticsError {
    #[error("failed to fetch entries: {0}")]
    Fetch(String),

    #[error(transparent)]
    Nutrition(#[from] NutritionError),
}
