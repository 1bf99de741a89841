//! Injected time source.
//!
//! Nothing in the core reads the system clock directly; callers hand in a
//! [`Clock`] so reports and depreciation runs are reproducible.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of "today" and "now".
pub trait Clock: Send + Sync {
    /// Current business date.
    fn today(&self) -> NaiveDate;

    /// Current instant, used for `posted_at` / `voided_at` stamps.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one date. `now()` is midnight UTC of that date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }

    fn now(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }
}
