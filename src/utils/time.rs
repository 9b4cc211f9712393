// src/utils/time.rs

//! Calendar helpers: relative-to-absolute date resolution, calendar path
//! formatting, and validated date ranges. Pure functions, no I/O.

use chrono::{Days, Local, NaiveDate};

use crate::error::{Error, Result};

/// Upstream programme retention window in days, per
/// bbc.co.uk/sounds/help/questions/programme-availability.
pub const MAX_WINDOW_DAYS: u32 = 30;

/// Today's local calendar date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Resolve an absolute calendar date from an optional explicit date and an
/// optional backwards day offset.
///
/// - neither given: today
/// - only `days_ago`: today shifted back
/// - only `date`: taken as-is
/// - both: the explicit date shifted back by `days_ago`
pub fn resolve_date(date: Option<NaiveDate>, days_ago: Option<u32>) -> NaiveDate {
    let base = date.unwrap_or_else(today);
    match days_ago {
        Some(n) => base - Days::new(u64::from(n)),
        None => base,
    }
}

/// Format a date as a zero-padded `YYYY/MM/DD` calendar path segment.
pub fn cal_path(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Format a date the way the upstream site renders it: `DD/MM/YYYY`.
pub fn date_repr(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// An inclusive, validated calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Construct a range, rejecting `to` before `from`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(Error::config(format!(
                "date range end {to} is before start {from}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Resolve a range from any combination of endpoints and a day count.
    ///
    /// Mirrors the upstream retention rules: with nothing specified the
    /// range is the last `max_days` days ending today; an explicit `from`
    /// extends forward by `n_days` (or `max_days`); an explicit `to` with
    /// `n_days` extends backward. An explicit pair overrules `n_days`.
    pub fn resolve(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        n_days: Option<u32>,
        max_days: u32,
    ) -> Result<Self> {
        if let Some(n) = n_days {
            if n == 0 {
                return Err(Error::config("n_days must be at least 1"));
            }
        }
        let (from, to) = match (from, to) {
            (Some(f), Some(t)) => (f, t),
            (Some(f), None) => {
                let n = n_days.unwrap_or(max_days);
                (f, f + Days::new(u64::from(n - 1)))
            }
            (None, Some(t)) => {
                let n = n_days.unwrap_or(max_days);
                (t - Days::new(u64::from(n - 1)), t)
            }
            (None, None) => {
                let t = today();
                let n = n_days.unwrap_or(max_days);
                (t - Days::new(u64::from(n - 1)), t)
            }
        };
        Self::new(from, to)
    }

    /// Number of days in the range, inclusive of both endpoints.
    pub fn n_days(&self) -> u32 {
        (self.to - self.from).num_days() as u32 + 1
    }

    /// Iterate the days of the range in chronological order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.n_days()).map(|i| self.from + Days::new(u64::from(i)))
    }
}
