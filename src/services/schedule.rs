// src/services/schedule.rs

//! Schedule-page retrieval and parsing.
//!
//! A station's daily schedule page lists every broadcast of that calendar
//! day as `.broadcast` entries. Pages for a whole date window are fetched
//! concurrently and parsed off the async runtime.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use scraper::{ElementRef, Html, Selector};

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::models::{BroadcastRecord, ListingsWindow, ScheduleDay, StationRef};
use crate::services::fetch::{BatchFetcher, UrlFetcher};
use crate::utils::time::DateRange;

struct Selectors {
    broadcast: Selector,
    pid: Selector,
    time: Selector,
    title: Selector,
    subtitle: Selector,
    synopsis: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            broadcast: parse_selector(".broadcast")?,
            pid: parse_selector("[data-pid]")?,
            time: parse_selector("h3.broadcast__time")?,
            title: parse_selector(".programme__titles .programme__title")?,
            subtitle: parse_selector(".programme__titles .programme__subtitle")?,
            synopsis: parse_selector(".programme__body .programme__synopsis span")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::malformed("schedule page selector", e))
}

fn inner_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// The schedule page stamps each broadcast with an ISO start time in the
/// `content` attribute of its time heading. Offsets are dropped: the wall
/// time as printed is the broadcast time.
fn parse_start(content: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(content)
        .map(|dt| dt.naive_local())
        .ok()
        .or_else(|| content.parse::<NaiveDateTime>().ok())
}

/// Parse one station-day schedule page into its broadcasts.
///
/// Entries missing a PID, start time or title are placeholders and are
/// skipped. Pages also leak the first post-midnight broadcasts of the
/// following day; those are dropped so the day holds only its own date.
pub fn parse_schedule_page(
    html: &str,
    station: &'static StationRef,
    date: NaiveDate,
) -> Result<ScheduleDay> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);
    let mut broadcasts = Vec::new();
    for entry in document.select(&selectors.broadcast) {
        let Some(pid) = entry
            .select(&selectors.pid)
            .next()
            .and_then(|el| el.attr("data-pid"))
        else {
            continue;
        };
        let Some(start) = entry
            .select(&selectors.time)
            .next()
            .and_then(|el| el.attr("content"))
            .and_then(parse_start)
        else {
            log::debug!("Skipping broadcast {pid} with no parseable start time");
            continue;
        };
        let Some(title) = entry.select(&selectors.title).next().map(inner_text) else {
            continue;
        };
        if start.date() != date {
            // Post-midnight leak from the next day's schedule.
            continue;
        }
        broadcasts.push(BroadcastRecord {
            pid: pid.to_string(),
            title,
            subtitle: entry
                .select(&selectors.subtitle)
                .next()
                .map(inner_text)
                .unwrap_or_default(),
            synopsis: entry
                .select(&selectors.synopsis)
                .next()
                .map(inner_text)
                .unwrap_or_default(),
            start,
        });
    }
    Ok(ScheduleDay {
        station,
        date,
        broadcasts,
    })
}

/// Fetch and parse one station-day schedule.
pub async fn fetch_schedule_day(
    fetcher: &dyn UrlFetcher,
    station: &'static StationRef,
    date: NaiveDate,
) -> Result<ScheduleDay> {
    let body = fetcher.get_text(&station.schedule_url(Some(date))).await?;
    tokio::task::spawn_blocking(move || parse_schedule_page(&body, station, date)).await?
}

/// Fetch a station's schedules for every day of `range` and assemble them
/// into a validated listings window. Pages are fetched as one batch and
/// parsed on blocking worker threads.
pub async fn fetch_window(
    fetcher: &dyn UrlFetcher,
    station: &'static StationRef,
    range: DateRange,
    config: &FetchConfig,
) -> Result<ListingsWindow> {
    let by_url: HashMap<String, NaiveDate> = range
        .days()
        .map(|date| (station.schedule_url(Some(date)), date))
        .collect();
    let urls: Vec<String> = by_url.keys().cloned().collect();
    log::info!(
        "Fetching {} schedule day(s) for {} ({} to {})",
        urls.len(),
        station.key,
        range.from,
        range.to
    );
    let bodies = BatchFetcher::new(fetcher, config.max_concurrent, config.retry_budget)
        .fetch_batch(&urls)
        .await?;
    let mut handles = Vec::with_capacity(bodies.len());
    for (url, body) in bodies {
        let date = by_url[&url];
        handles.push(tokio::task::spawn_blocking(move || {
            parse_schedule_page(&body, station, date)
        }));
    }
    let mut days = Vec::with_capacity(handles.len());
    for handle in handles {
        days.push(handle.await??);
    }
    ListingsWindow::new(station, range, days)
}
