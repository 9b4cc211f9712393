// src/pipeline.rs

//! High-level resolution operations.
//!
//! The [`Resolver`] ties the services together: date and title go in,
//! episode PIDs, manifests and segment URL sequences come out. Every
//! operation takes its I/O through the [`UrlFetcher`] seam.

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::models::{
    BroadcastRecord, Catalogue, Guide, ListingsWindow, SegmentUrlSet, StationRef,
};
use crate::services::catalogue::{self, CatalogueBuilder};
use crate::services::fetch::{BatchFetcher, UrlFetcher};
use crate::services::listings::EpisodeLister;
use crate::services::mediaset::{self, ManifestDescriptor};
use crate::services::schedule;
use crate::services::search::Sieve;
use crate::storage::CatalogueStore;
use crate::utils::time::{DateRange, MAX_WINDOW_DAYS};

/// Orchestrates the resolution services under one configuration.
pub struct Resolver<'a> {
    fetcher: &'a dyn UrlFetcher,
    config: AppConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(fetcher: &'a dyn UrlFetcher, config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { fetcher, config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Resolve a listings range from optional endpoints and day count.
    /// The day count defaults to the configured window and is clamped to
    /// the upstream retention window; days beyond it would only fetch
    /// empty schedules.
    pub fn window_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        n_days: Option<u32>,
    ) -> Result<DateRange> {
        let max_days = self.config.listings.window_days.min(MAX_WINDOW_DAYS);
        let n_days = n_days.map(|n| n.min(max_days));
        DateRange::resolve(from, to, n_days, max_days)
    }

    /// Fetch a set of URLs under the configured concurrency cap and
    /// retry budget, correlated by URL.
    pub async fn fetch_batch(
        &self,
        urls: &[String],
    ) -> Result<std::collections::HashMap<String, String>> {
        BatchFetcher::new(
            self.fetcher,
            self.config.fetch.max_concurrent,
            self.config.fetch.retry_budget,
        )
        .fetch_batch(urls)
        .await
    }

    /// Fetch a station's schedules over a range.
    pub async fn fetch_window(
        &self,
        station: &'static StationRef,
        range: DateRange,
    ) -> Result<ListingsWindow> {
        schedule::fetch_window(self.fetcher, station, range, &self.config.fetch).await
    }

    /// Resolve the episode of a programme broadcast on a given date by
    /// walking the programme's episode listing.
    pub async fn resolve_episode_for_date(
        &self,
        programme_pid: &str,
        date: NaiveDate,
    ) -> Result<String> {
        EpisodeLister::new(self.fetcher, programme_pid)
            .find_by_date(date)
            .await
    }

    /// Run the playlist → media selector → manifest chain for an episode.
    pub async fn resolve_manifest(&self, episode_pid: &str) -> Result<ManifestDescriptor> {
        mediaset::resolve_manifest(self.fetcher, episode_pid).await
    }

    /// URL of the episode's final media segment, with the segment count
    /// and selected representation id.
    pub async fn final_segment_url(&self, episode_pid: &str) -> Result<(String, u64, String)> {
        let descriptor = self.resolve_manifest(episode_pid).await?;
        let url = descriptor.manifest.last_segment_url()?;
        Ok((
            url,
            descriptor.manifest.segment_count,
            descriptor.manifest.representation_id,
        ))
    }

    /// The episode's whole segment sequence, ready to enumerate.
    pub async fn segment_sequence(&self, episode_pid: &str) -> Result<SegmentUrlSet> {
        self.resolve_manifest(episode_pid)
            .await?
            .manifest
            .to_url_set()
    }

    /// First broadcast in the window matching the sieve.
    pub async fn find_broadcast(
        &self,
        station: &'static StationRef,
        range: DateRange,
        sieve: &Sieve,
    ) -> Result<BroadcastRecord> {
        let window = self.fetch_window(station, range).await?;
        Ok(sieve.search_window(&window)?.clone())
    }

    /// Resolve a programme PID from a broadcast title: find the broadcast
    /// in the window, then read the parent programme off the episode's
    /// metadata.
    pub async fn programme_pid_by_title(
        &self,
        station: &'static StationRef,
        range: DateRange,
        title: &str,
    ) -> Result<String> {
        let broadcast = self
            .find_broadcast(station, range, &Sieve::exact(title))
            .await?;
        let body = self
            .fetcher
            .get_text(&catalogue::metadata_url(&broadcast.pid))
            .await?;
        let parent = catalogue::parse_parent(&body, false)?;
        parent.map(|entry| entry.pid).ok_or_else(|| {
            Error::not_found(
                format!("parent programme of episode {}", broadcast.pid),
                station.title,
            )
        })
    }

    fn builder(&self) -> CatalogueBuilder<'_> {
        CatalogueBuilder::new(
            self.fetcher,
            &self.config.fetch,
            self.config.listings.with_genre,
        )
    }

    /// Build a station's programme catalogue over a range.
    pub async fn build_catalogue(
        &self,
        station: &'static StationRef,
        range: DateRange,
    ) -> Result<Catalogue> {
        self.builder().build(station, range).await
    }

    /// Build catalogues for several stations.
    pub async fn build_guide(
        &self,
        stations: &[&'static StationRef],
        range: DateRange,
    ) -> Result<Guide> {
        self.builder().build_guide(stations, range).await
    }

    /// Load a station's catalogue from the store, building and saving it
    /// first when the store has nothing for the station.
    pub async fn load_or_build_catalogue(
        &self,
        store: &dyn CatalogueStore,
        station: &'static StationRef,
        range: DateRange,
    ) -> Result<Catalogue> {
        store.ensure().await?;
        if store.has_station(station.key).await? {
            log::info!("Loading catalogue for {} from store", station.key);
            return store.by_station(station.key).await;
        }
        let built = self.build_catalogue(station, range).await?;
        store.save(&built).await?;
        Ok(built)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct CannedFetcher {
        bodies: HashMap<String, String>,
    }

    #[async_trait]
    impl UrlFetcher for CannedFetcher {
        async fn get_text(&self, url: &str) -> Result<String> {
            self.bodies.get(url).cloned().ok_or_else(|| Error::Status {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    fn chain_fixtures() -> HashMap<String, String> {
        let mpd = r#"<?xml version="1.0" encoding="UTF-8"?>
            <MPD xmlns="urn:mpeg:dash:schema:mpd:2011" mediaPresentationDuration="PT3M0S">
              <Period>
                <BaseURL>dash/</BaseURL>
                <AdaptationSet audioSamplingRate="48000">
                  <Representation id="audio=320000" bandwidth="320000"/>
                  <SegmentTemplate duration="96000"
                      media="episode-$RepresentationID$-$Number$.m4s"/>
                </AdaptationSet>
              </Period>
            </MPD>"#;
        HashMap::from([
            (
                "https://www.bbc.co.uk/programmes/m000xyz1/playlist.json".to_string(),
                r#"{"defaultAvailableVersion": {"pid": "p09vvvv1"}}"#.to_string(),
            ),
            (
                "https://open.live.bbc.co.uk/mediaselector/6/select/version/2.0/mediaset/pc/vpid/p09vvvv1"
                    .to_string(),
                r#"{"media": [{"connection": [
                    {"transferFormat": "dash", "protocol": "https", "priority": "11",
                     "href": "https://cdn.example.com/streams/episode.mpd"},
                    {"transferFormat": "hls", "protocol": "https", "priority": "1",
                     "href": "https://cdn.example.com/streams/master.m3u8"}
                ]}]}"#
                    .to_string(),
            ),
            (
                "https://cdn.example.com/streams/episode.mpd".to_string(),
                mpd.to_string(),
            ),
        ])
    }

    fn resolver(fetcher: &CannedFetcher) -> Resolver<'_> {
        Resolver::new(fetcher, AppConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_full_chain_to_segment_sequence() {
        let fetcher = CannedFetcher {
            bodies: chain_fixtures(),
        };
        let resolver = resolver(&fetcher);

        let descriptor = resolver.resolve_manifest("m000xyz1").await.unwrap();
        assert_eq!(descriptor.version_pid, "p09vvvv1");
        assert_eq!(descriptor.manifest.segment_count, 90);

        let (url, count, repr_id) = resolver.final_segment_url("m000xyz1").await.unwrap();
        assert_eq!(
            url,
            "https://cdn.example.com/streams/dash/episode-audio=320000-90.m4s"
        );
        assert_eq!(count, 90);
        assert_eq!(repr_id, "audio=320000");

        let set = resolver.segment_sequence("m000xyz1").await.unwrap();
        assert_eq!(set.size, 90);
        assert_eq!(set.iter().count(), 91);
    }

    #[tokio::test]
    async fn test_chain_miss_names_the_hop() {
        let fetcher = CannedFetcher {
            bodies: HashMap::new(),
        };
        let resolver = resolver(&fetcher);
        let err = resolver.resolve_manifest("m000none").await.unwrap_err();
        assert!(matches!(err, Error::Hop { hop: "playlist", .. }));
    }

    fn schedule_page(pid: &str, title: &str, start: &str) -> String {
        format!(
            r#"<html><body><div class="broadcast">
                 <div class="programme" data-pid="{pid}">
                   <h3 class="broadcast__time" content="{start}">t</h3>
                   <div class="programme__titles">
                     <span class="programme__title">{title}</span>
                   </div>
                 </div>
               </div></body></html>"#
        )
    }

    fn one_day_fixtures() -> (HashMap<String, String>, &'static StationRef, DateRange) {
        let r4 = StationRef::by_key("r4").unwrap();
        let date = NaiveDate::from_ymd_opt(2021, 7, 6).unwrap();
        let range = DateRange::new(date, date).unwrap();
        let bodies = HashMap::from([
            (
                r4.schedule_url(Some(date)),
                schedule_page("m000xyz1", "In Our Time", "2021-07-06T09:00:00+01:00"),
            ),
            (
                catalogue::metadata_url("m000xyz1"),
                r#"{"programme": {"parent": {"programme": {"pid": "b006qykl", "title": "In Our Time"}}}}"#
                    .to_string(),
            ),
        ]);
        (bodies, r4, range)
    }

    #[tokio::test]
    async fn test_programme_pid_by_title() {
        let (bodies, r4, range) = one_day_fixtures();
        let fetcher = CannedFetcher { bodies };
        let resolver = resolver(&fetcher);
        let pid = resolver
            .programme_pid_by_title(r4, range, "In Our Time")
            .await
            .unwrap();
        assert_eq!(pid, "b006qykl");
        assert!(
            resolver
                .programme_pid_by_title(r4, range, "No Such Show")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_load_or_build_prefers_store_second_time() {
        let (bodies, r4, range) = one_day_fixtures();
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("catalogue.db"));

        let fetcher = CannedFetcher { bodies };
        let built = resolver(&fetcher)
            .load_or_build_catalogue(&store, r4, range)
            .await
            .unwrap();
        assert_eq!(built.len(), 1);

        // Second run loads from the store; the network is never touched.
        let offline = CannedFetcher {
            bodies: HashMap::new(),
        };
        let loaded = resolver(&offline)
            .load_or_build_catalogue(&store, r4, range)
            .await
            .unwrap();
        assert_eq!(loaded.get("b006qykl").unwrap().title, "In Our Time");
    }

    #[test]
    fn test_window_range_is_capped() {
        let fetcher = CannedFetcher {
            bodies: HashMap::new(),
        };
        let resolver = resolver(&fetcher);
        let range = resolver.window_range(None, None, None).unwrap();
        assert_eq!(range.n_days(), 30);
        // An oversized explicit count is clamped, not passed through.
        let clamped = resolver.window_range(None, None, Some(90)).unwrap();
        assert_eq!(clamped.n_days(), 30);
        assert!(resolver.window_range(None, None, Some(0)).is_err());
    }
}
