//! Calendar clock
//!
//! Named periods are resolved against "today" at the moment of each request,
//! so a session left open past midnight picks up the new day.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

/// Source of the current local calendar day
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Wall clock in a fixed IANA timezone
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self { tz: Tz::UTC }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }
}

/// Clock pinned to one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Parse an IANA timezone name such as `Europe/Moscow`
pub fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| format!("Unknown timezone '{}'", name))
}

/// Whether `name` is a valid IANA timezone
pub fn is_valid_timezone(name: &str) -> bool {
    parse_timezone(name).is_ok()
}
