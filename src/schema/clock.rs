use chrono::{NaiveDate, Utc};

/// Source of "today" for date rules.
pub trait Clock: Send + Sync + 'static {
    fn today(&self) -> NaiveDate;
}

/// Calendar date in UTC, which is how `YYYY-MM-DD` inputs are interpreted.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
