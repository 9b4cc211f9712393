// src/services/listings.rs

//! Episode-listing pagination.
//!
//! A programme's "available episodes" listing is paginated. Each entry
//! carries the episode PID and, for daily programmes, a `DD/MM/YYYY`
//! broadcast date as its title. Walking the pages lets a caller resolve
//! the episode aired on a given date without knowing its PID.

use chrono::NaiveDate;
use scraper::{Html, Selector};

use crate::error::{Error, Result};
use crate::services::fetch::UrlFetcher;
use crate::utils::time::date_repr;

/// One entry of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEpisode {
    /// Episode PID
    pub pid: String,
    /// The entry's title text, verbatim
    pub label: String,
    /// The title parsed as a broadcast date, when it is one
    pub date: Option<NaiveDate>,
}

/// A parsed listing page.
#[derive(Debug, Clone)]
pub struct ListingPage {
    pub entries: Vec<ListedEpisode>,
    /// Highest page number advertised by the pagination footer (1 when
    /// there is no footer)
    pub last_page: u32,
}

/// Titles of daily episodes are dates like `06/07/2021` or `06/07/21`.
/// Two-digit years are taken as 2000-based; the upstream site did not
/// exist before then.
fn parse_label_date(label: &str) -> Option<NaiveDate> {
    let mut parts = label.trim().split('/');
    let day: u32 = parts.next()?.trim().parse().ok()?;
    let month: u32 = parts.next()?.trim().parse().ok()?;
    let mut year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::malformed("listing page selector", e))
}

/// Parse one listing page into its entries and pagination extent.
pub fn parse_listing_page(html: &str) -> Result<ListingPage> {
    let entry_sel = parse_selector("div[data-pid]")?;
    let titles_sel = parse_selector(".programme__titles")?;
    let last_sel = parse_selector(".pagination__page--last a")?;
    let document = Html::parse_document(html);
    let mut entries = Vec::new();
    for entry in document.select(&entry_sel) {
        let Some(pid) = entry.attr("data-pid") else {
            continue;
        };
        let label = entry
            .select(&titles_sel)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        entries.push(ListedEpisode {
            pid: pid.to_string(),
            date: parse_label_date(&label),
            label,
        });
    }
    let last_page = document
        .select(&last_sel)
        .next()
        .and_then(|el| el.text().collect::<String>().trim().parse().ok())
        .unwrap_or(1);
    Ok(ListingPage { entries, last_page })
}

/// Pager over one programme's episode listing.
pub struct EpisodeLister<'a> {
    fetcher: &'a dyn UrlFetcher,
    programme_pid: String,
}

impl<'a> EpisodeLister<'a> {
    pub fn new(fetcher: &'a dyn UrlFetcher, programme_pid: impl Into<String>) -> Self {
        Self {
            fetcher,
            programme_pid: programme_pid.into(),
        }
    }

    fn page_url(&self, page: u32) -> String {
        format!(
            "https://www.bbc.co.uk/programmes/{}/episodes/player?page={page}",
            self.programme_pid
        )
    }

    async fn fetch_page(&self, page: u32) -> Result<ListingPage> {
        let body = self.fetcher.get_text(&self.page_url(page)).await?;
        let parsed = tokio::task::spawn_blocking(move || parse_listing_page(&body)).await??;
        if page == 1 && parsed.entries.is_empty() {
            return Err(Error::malformed(
                format!("episode listing of {}", self.programme_pid),
                "no episodes found",
            ));
        }
        Ok(parsed)
    }

    /// Resolve the episode broadcast on `date` by walking every listing
    /// page. Exactly one match is required.
    pub async fn find_by_date(&self, date: NaiveDate) -> Result<String> {
        let scope = format!("episode listing of {}", self.programme_pid);
        let mut matches: Vec<String> = Vec::new();
        let mut page = 1;
        let mut last_page = 1;
        loop {
            let parsed = self.fetch_page(page).await?;
            if page == 1 {
                last_page = parsed.last_page;
            }
            for entry in &parsed.entries {
                if entry.date == Some(date) {
                    matches.push(entry.pid.clone());
                }
            }
            if matches.len() > 1 {
                return Err(Error::ambiguous(date_repr(date), scope, matches.len()));
            }
            if page >= last_page {
                break;
            }
            page += 1;
        }
        matches
            .pop()
            .ok_or_else(|| Error::not_found(date_repr(date), scope))
    }
}
