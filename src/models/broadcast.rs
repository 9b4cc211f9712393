// src/models/broadcast.rs

//! Broadcast records, single-day schedules and multi-day listings windows.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{Error, Result};
use crate::models::StationRef;
use crate::utils::time::{DateRange, date_repr};

/// One broadcast parsed from a schedule-page entry. Immutable after
/// creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastRecord {
    /// Episode PID
    pub pid: String,
    pub title: String,
    pub subtitle: String,
    pub synopsis: String,
    /// Scheduled start time; its calendar date always equals the date of
    /// the schedule page it was parsed from (producers drop leaked
    /// next-day entries).
    pub start: NaiveDateTime,
}

impl BroadcastRecord {
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// `"HH:MM on Tue 06/07/2021 — Title"` display form.
    pub fn repr(&self) -> String {
        format!(
            "{} on {} — {}",
            self.start.format("%H:%M"),
            self.start.format("%a %d/%m/%Y"),
            self.title
        )
    }
}

/// The schedule listings of one station for one calendar day.
#[derive(Debug, Clone)]
pub struct ScheduleDay {
    pub station: &'static StationRef,
    pub date: NaiveDate,
    /// Broadcasts in page order (chronological upstream)
    pub broadcasts: Vec<BroadcastRecord>,
}

impl ScheduleDay {
    /// Start time of the day's earliest broadcast, if any.
    pub fn earliest(&self) -> Option<NaiveDateTime> {
        self.broadcasts.iter().map(|b| b.start).min()
    }

    /// Human-readable scope for search errors, e.g. `"06/07/2021"`.
    pub fn scope(&self) -> String {
        date_repr(self.date)
    }
}

/// A station's schedules over an inclusive date range.
///
/// Invariant: exactly one [`ScheduleDay`] per calendar date in the range,
/// held in chronological order.
#[derive(Debug, Clone)]
pub struct ListingsWindow {
    pub station: &'static StationRef,
    pub range: DateRange,
    days: Vec<ScheduleDay>,
}

impl ListingsWindow {
    /// Assemble a window from fetched days, validating full coverage of
    /// the range. Days may arrive in any order; they are re-sorted
    /// chronologically (by each day's earliest broadcast, falling back to
    /// the calendar date for empty days).
    pub fn new(
        station: &'static StationRef,
        range: DateRange,
        mut days: Vec<ScheduleDay>,
    ) -> Result<Self> {
        days.sort_by_key(|day| {
            let first = day
                .earliest()
                .unwrap_or_else(|| day.date.and_time(NaiveTime::MIN));
            (first, day.date)
        });
        let expected: Vec<NaiveDate> = range.days().collect();
        let got: Vec<NaiveDate> = days.iter().map(|day| day.date).collect();
        if got != expected {
            return Err(Error::config(format!(
                "listings window for {} does not cover {} to {}: got {} day(s)",
                station.key,
                range.from,
                range.to,
                days.len()
            )));
        }
        Ok(Self {
            station,
            range,
            days,
        })
    }

    pub fn days(&self) -> &[ScheduleDay] {
        &self.days
    }

    /// Every broadcast in the window, in chronological day order.
    pub fn all_broadcasts(&self) -> impl Iterator<Item = &BroadcastRecord> {
        self.days.iter().flat_map(|day| day.broadcasts.iter())
    }

    /// Human-readable scope for search errors.
    pub fn scope(&self) -> String {
        format!(
            "{} between {} and {}",
            self.station.title,
            date_repr(self.range.from),
            date_repr(self.range.to)
        )
    }
}
