//! Clock source.
//!
//! "What hour is it" and "what is today" are answered here and nowhere else.
//! Every instant carries the caller's local UTC offset, so `hour()` and
//! `today()` are local wall-clock values.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, Timelike};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Supplies the current local instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    /// Local calendar date of `now()`.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Local hour of day (0-23).
    fn hour(&self) -> u32 {
        self.now().hour()
    }

    /// Today as a [`LocalDay`] in the clock's offset.
    fn local_day(&self) -> LocalDay {
        LocalDay::of(self.now())
    }
}

/// A calendar day as seen from one UTC offset.
///
/// Instants written under any other offset are converted into this one
/// before their date is compared, so a record stored as `00:30Z` belongs to
/// the previous evening for a caller at `-05:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalDay {
    date: NaiveDate,
    offset: FixedOffset,
}

impl LocalDay {
    /// The day containing `instant`, in `instant`'s own offset.
    pub fn of(instant: DateTime<FixedOffset>) -> Self {
        Self {
            date: instant.date_naive(),
            offset: *instant.offset(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Whether `instant` falls on this day once viewed from this offset.
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        instant.with_timezone(&self.offset).date_naive() == self.date
    }

    /// Unix timestamps of local midnight and the next midnight.
    ///
    /// Start is inclusive, end exclusive. Fixed offsets have no DST, so the
    /// day is always 24 hours long.
    pub fn timestamp_range(&self) -> (i64, i64) {
        let start = self.date.and_time(NaiveTime::default()).and_utc().timestamp()
            - i64::from(self.offset.local_minus_utc());
        (start, start + SECONDS_PER_DAY)
    }
}

/// Reads the operating system clock in the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.instant
    }
}
