use chrono::{Local, NaiveDate};

/// Supplies "today" as a calendar date. Callers read it once per run and pass
/// the date down, so classification never touches the wall clock itself.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// The current date in the server's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a single date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
