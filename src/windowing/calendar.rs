use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{MonitorError, Result};

fn out_of_range(what: &str) -> MonitorError {
    MonitorError::InvalidInput(format!("{} is outside the supported calendar range", what))
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Bucket width. All widths are calendar-aligned in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
    Month,
}

impl Granularity {
    /// Start of the calendar unit containing `instant`.
    pub fn floor(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Granularity::Hour => {
                let secs = i64::from(instant.minute() * 60 + instant.second());
                let truncated = instant - Duration::seconds(secs);
                truncated - Duration::nanoseconds(i64::from(truncated.nanosecond()))
            }
            Granularity::Day => midnight_utc(instant.date_naive()),
            Granularity::Month => CalendarMonth::containing(instant).start(),
        }
    }

    /// Move an aligned instant `n` units forward.
    pub fn advance(&self, aligned: DateTime<Utc>, n: u32) -> Result<DateTime<Utc>> {
        match self {
            Granularity::Hour => aligned
                .checked_add_signed(Duration::hours(i64::from(n)))
                .ok_or_else(|| out_of_range("hour")),
            Granularity::Day => aligned
                .checked_add_days(Days::new(u64::from(n)))
                .ok_or_else(|| out_of_range("day")),
            Granularity::Month => aligned
                .checked_add_months(Months::new(n))
                .ok_or_else(|| out_of_range("month")),
        }
    }

    /// Move an aligned instant `n` units back.
    pub fn retreat(&self, aligned: DateTime<Utc>, n: u32) -> Result<DateTime<Utc>> {
        match self {
            Granularity::Hour => aligned
                .checked_sub_signed(Duration::hours(i64::from(n)))
                .ok_or_else(|| out_of_range("hour")),
            Granularity::Day => aligned
                .checked_sub_days(Days::new(u64::from(n)))
                .ok_or_else(|| out_of_range("day")),
            Granularity::Month => aligned
                .checked_sub_months(Months::new(n))
                .ok_or_else(|| out_of_range("month")),
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(MonitorError::InvalidInput(format!(
                "Window start {} is after its end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// `[now - length, now)`
    pub fn trailing(now: DateTime<Utc>, length: Duration) -> Result<Self> {
        let start = now
            .checked_sub_signed(length)
            .ok_or_else(|| out_of_range("window start"))?;
        Self::new(start, now)
    }

    /// The `count` complete units before the unit containing `now`.
    pub fn preceding_units(now: DateTime<Utc>, granularity: Granularity, count: u32) -> Result<Self> {
        let end = granularity.floor(now);
        let start = granularity.retreat(end, count)?;
        Self::new(start, end)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Calendar units overlapping the window, ascending, without gaps.
    pub fn intervals(&self, granularity: Granularity) -> Result<Vec<TimeWindow>> {
        let mut intervals = Vec::new();
        let mut cursor = granularity.floor(self.start);

        while cursor < self.end {
            let next = granularity.advance(cursor, 1)?;
            intervals.push(TimeWindow {
                start: cursor,
                end: next,
            });
            cursor = next;
        }

        Ok(intervals)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// A calendar month in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarMonth {
    first_day: NaiveDate,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn containing(instant: DateTime<Utc>) -> Self {
        let date = instant.date_naive();
        Self {
            first_day: date - Days::new(u64::from(date.day0())),
        }
    }

    /// The last complete month before the one containing `now`.
    pub fn previous(now: DateTime<Utc>) -> Result<Self> {
        Self::containing(now).minus_months(1)
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn month(&self) -> u32 {
        self.first_day.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn start(&self) -> DateTime<Utc> {
        midnight_utc(self.first_day)
    }

    pub fn end(&self) -> Result<DateTime<Utc>> {
        Ok(self.plus_months(1)?.start())
    }

    pub fn window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.start(), self.end()?)
    }

    /// Number of calendar days in the month.
    pub fn days(&self) -> Result<u32> {
        let next = self.plus_months(1)?;
        let days = next.first_day.signed_duration_since(self.first_day).num_days();
        Ok(days as u32)
    }

    pub fn plus_months(&self, n: u32) -> Result<Self> {
        self.first_day
            .checked_add_months(Months::new(n))
            .map(|first_day| Self { first_day })
            .ok_or_else(|| out_of_range("month"))
    }

    pub fn minus_months(&self, n: u32) -> Result<Self> {
        self.first_day
            .checked_sub_months(Months::new(n))
            .map(|first_day| Self { first_day })
            .ok_or_else(|| out_of_range("month"))
    }

    pub fn minus_years(&self, n: u32) -> Result<Self> {
        self.minus_months(n * 12)
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}
