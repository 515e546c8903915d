//! Calendar date windows

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AcquireError, Result};

/// An inclusive window of calendar days, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TimeRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AcquireError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The `days` days up to and including `end`.
    pub fn lookback(end: NaiveDate, days: u64) -> Result<Self> {
        let start = end
            .checked_sub_days(Days::new(days))
            .ok_or_else(|| {
                AcquireError::InvalidRequest(format!("cannot look back {days} days from {end}"))
            })?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// First instant of the window, e.g. `2024-06-01T00:00:00Z`
    pub fn start_instant(&self) -> String {
        format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
    }

    /// Last instant of the window, e.g. `2024-06-30T23:59:59Z`
    pub fn end_instant(&self) -> String {
        format!("{}T23:59:59Z", self.end.format("%Y-%m-%d"))
    }
}

/// Interval notation, e.g. `2024-06-01/2024-06-30`
impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}
