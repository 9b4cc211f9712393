// src/services/catalogue.rs

//! Programme catalogue building.
//!
//! A station's schedules name episodes; the catalogue wants the parent
//! programmes (brands and series) behind them. Each episode's metadata
//! document names its parent, so building a catalogue is one metadata
//! fetch per distinct episode in the window, then deduplication of the
//! parents.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::models::{Catalogue, CatalogueEntry, Guide, ListingsWindow, StationRef};
use crate::services::fetch::{BatchFetcher, UrlFetcher};
use crate::services::schedule;
use crate::utils::time::DateRange;

#[derive(Debug, Deserialize)]
struct MetadataJson {
    programme: Option<ProgrammeJson>,
}

#[derive(Debug, Deserialize)]
struct ProgrammeJson {
    parent: Option<ParentJson>,
    #[serde(default)]
    categories: Vec<CategoryJson>,
}

#[derive(Debug, Deserialize)]
struct ParentJson {
    programme: ParentProgrammeJson,
}

#[derive(Debug, Deserialize)]
struct ParentProgrammeJson {
    pid: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct CategoryJson {
    title: String,
}

pub(crate) fn metadata_url(episode_pid: &str) -> String {
    format!("https://www.bbc.co.uk/programmes/{episode_pid}.json")
}

/// Extract an episode's parent programme from its metadata document.
///
/// One-off episodes have no parent and yield `None`; that is expected,
/// not a failure. The genre is the title of the first category, captured
/// only on request.
pub fn parse_parent(body: &str, with_genre: bool) -> Result<Option<CatalogueEntry>> {
    let metadata: MetadataJson = serde_json::from_str(body)?;
    let Some(programme) = metadata.programme else {
        return Ok(None);
    };
    let Some(parent) = programme.parent else {
        return Ok(None);
    };
    let genre = if with_genre {
        programme.categories.into_iter().next().map(|c| c.title)
    } else {
        None
    };
    Ok(Some(CatalogueEntry {
        pid: parent.programme.pid,
        title: parent.programme.title,
        genre,
    }))
}

/// Builds per-station catalogues from listings windows.
pub struct CatalogueBuilder<'a> {
    fetcher: &'a dyn UrlFetcher,
    config: &'a FetchConfig,
    with_genre: bool,
}

impl<'a> CatalogueBuilder<'a> {
    pub fn new(fetcher: &'a dyn UrlFetcher, config: &'a FetchConfig, with_genre: bool) -> Self {
        Self {
            fetcher,
            config,
            with_genre,
        }
    }

    /// Build a catalogue from an already-fetched window.
    ///
    /// Episodes whose metadata has gone (404) are skipped; any other
    /// failure aborts the build. Parents are deduplicated by PID, with a
    /// title guard against the same parent appearing under distinct PIDs.
    pub async fn build_from_window(&self, window: &ListingsWindow) -> Result<Catalogue> {
        let pids: BTreeSet<&str> = window.all_broadcasts().map(|b| b.pid.as_str()).collect();
        let urls: Vec<String> = pids.iter().map(|pid| metadata_url(pid)).collect();
        log::info!(
            "Building catalogue for {} from {} distinct episode(s)",
            window.station.key,
            urls.len()
        );
        let mut results =
            BatchFetcher::new(self.fetcher, self.config.max_concurrent, self.config.retry_budget)
                .fetch_batch_lenient(&urls)
                .await?;
        let mut catalogue = Catalogue::new(window.station.key, self.with_genre);
        for pid in &pids {
            let url = metadata_url(pid);
            let body = match results.remove(&url) {
                Some(Ok(body)) => body,
                Some(Err(Error::Status { status: 404, .. })) => {
                    log::warn!("Episode metadata gone: {url}");
                    continue;
                }
                Some(Err(e)) => {
                    return Err(e.at_hop("programme metadata", *pid));
                }
                None => continue,
            };
            let Some(entry) = parse_parent(&body, self.with_genre)? else {
                continue;
            };
            if catalogue.get(&entry.pid).is_none() && catalogue.has_title(&entry.title) {
                log::debug!(
                    "Skipping {} ({}): title already catalogued under another PID",
                    entry.pid,
                    entry.title
                );
                continue;
            }
            catalogue.record(entry);
        }
        Ok(catalogue)
    }

    /// Fetch a station's window and build its catalogue.
    pub async fn build(&self, station: &'static StationRef, range: DateRange) -> Result<Catalogue> {
        let window = schedule::fetch_window(self.fetcher, station, range, self.config).await?;
        self.build_from_window(&window).await
    }

    /// Build one catalogue per station over the same range.
    pub async fn build_guide(
        &self,
        stations: &[&'static StationRef],
        range: DateRange,
    ) -> Result<Guide> {
        let mut guide = Guide::new();
        for station in stations {
            guide.add(self.build(station, range).await?)?;
        }
        Ok(guide)
    }
}
