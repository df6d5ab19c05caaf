use chrono::{Datelike, NaiveDate};

/// Supplies "today" to the date stamp. Queried on every paint.
pub trait DateSource {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date from the system clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl DateSource for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// A pinned date, for reproducible renders.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedDate(pub NaiveDate);

impl DateSource for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// `YYYY.MM.DD`, zero padded.
pub fn format_stamp(date: NaiveDate) -> String {
    format!("{:04}.{:02}.{:02}", date.year(), date.month(), date.day())
}
