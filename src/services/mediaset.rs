// src/services/mediaset.rs

//! The playlist → media-selector → manifest resolution chain.
//!
//! Turning an episode PID into a DASH manifest takes four hops:
//!
//! 1. `playlist.json` gives the default available version PID
//! 2. the media selector lists delivery connections for that version
//! 3. the dash-over-https connection with the best priority gives the
//!    manifest URL
//! 4. the manifest itself is fetched and parsed
//!
//! Each hop wraps its failure with the hop name and the PID in play, so a
//! miss deep in the chain still names where it happened.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::services::fetch::UrlFetcher;
use crate::services::manifest::{self, ManifestSummary};

/// Sentinel the media selector answers with when an episode cannot be
/// served (expired, geo-fenced, never published).
const SELECTION_UNAVAILABLE: &str = "selectionunavailable";

#[derive(Debug, Deserialize)]
struct PlaylistJson {
    #[serde(rename = "defaultAvailableVersion")]
    default_available_version: Option<VersionJson>,
}

#[derive(Debug, Deserialize)]
struct VersionJson {
    pid: String,
}

#[derive(Debug, Deserialize)]
struct MediasetJson {
    result: Option<String>,
    #[serde(default)]
    media: Vec<MediaJson>,
}

#[derive(Debug, Deserialize)]
struct MediaJson {
    #[serde(default)]
    connection: Vec<ConnectionJson>,
}

#[derive(Debug, Deserialize)]
struct ConnectionJson {
    #[serde(rename = "transferFormat")]
    transfer_format: String,
    protocol: String,
    /// Priority arrives as a decimal string; lower is better
    priority: String,
    href: String,
}

/// The fully resolved chain for one episode.
#[derive(Debug, Clone)]
pub struct ManifestDescriptor {
    pub episode_pid: String,
    /// Version PID ("vpid") the media selector was asked about
    pub version_pid: String,
    pub mpd_url: String,
    pub manifest: ManifestSummary,
}

fn playlist_url(episode_pid: &str) -> String {
    format!("https://www.bbc.co.uk/programmes/{episode_pid}/playlist.json")
}

fn mediaset_url(version_pid: &str) -> String {
    format!(
        "https://open.live.bbc.co.uk/mediaselector/6/select/version/2.0/mediaset/pc/vpid/{version_pid}"
    )
}

/// Extract the default available version PID from a playlist document.
pub fn version_pid_from_playlist(body: &str, episode_pid: &str) -> Result<String> {
    let playlist: PlaylistJson = serde_json::from_str(body)?;
    playlist
        .default_available_version
        .map(|v| v.pid)
        .ok_or_else(|| Error::Unavailable {
            pid: episode_pid.to_string(),
        })
}

/// Pick the manifest URL from a media-selector document: dash transfer
/// format over https, best (lowest) numeric priority. Ties keep the
/// first-listed connection.
pub fn mpd_url_from_mediaset(body: &str, version_pid: &str) -> Result<String> {
    let mediaset: MediasetJson = serde_json::from_str(body)?;
    if mediaset.result.as_deref() == Some(SELECTION_UNAVAILABLE) {
        return Err(Error::Unavailable {
            pid: version_pid.to_string(),
        });
    }
    let mut candidates: Vec<(u32, String)> = Vec::new();
    for media in mediaset.media {
        for conn in media.connection {
            if conn.transfer_format != "dash" || conn.protocol != "https" {
                continue;
            }
            let priority: u32 = conn.priority.parse().map_err(|e| {
                Error::malformed(
                    format!("media selector for {version_pid}"),
                    format!("priority {:?}: {e}", conn.priority),
                )
            })?;
            candidates.push((priority, conn.href));
        }
    }
    // Stable, so equal priorities keep listing order.
    candidates.sort_by_key(|(priority, _)| *priority);
    let href = candidates
        .into_iter()
        .next()
        .map(|(_, href)| href)
        .ok_or_else(|| Error::NoDeliveryOption {
            pid: version_pid.to_string(),
        })?;
    Ok(url::Url::parse(&href)?.into())
}

/// Run the whole chain for one episode.
pub async fn resolve_manifest(
    fetcher: &dyn UrlFetcher,
    episode_pid: &str,
) -> Result<ManifestDescriptor> {
    let playlist_body = fetcher
        .get_text(&playlist_url(episode_pid))
        .await
        .map_err(|e| e.at_hop("playlist", episode_pid))?;
    let version_pid = version_pid_from_playlist(&playlist_body, episode_pid)
        .map_err(|e| e.at_hop("playlist", episode_pid))?;
    log::debug!("Episode {episode_pid} resolves to version {version_pid}");

    let mediaset_body = fetcher
        .get_text(&mediaset_url(&version_pid))
        .await
        .map_err(|e| e.at_hop("media selector", &version_pid))?;
    let mpd_url = mpd_url_from_mediaset(&mediaset_body, &version_pid)
        .map_err(|e| e.at_hop("delivery selection", &version_pid))?;
    log::debug!("Version {version_pid} serves manifest {mpd_url}");

    let mpd_body = fetcher
        .get_text(&mpd_url)
        .await
        .map_err(|e| e.at_hop("manifest", &version_pid))?;
    let summary = manifest::parse_manifest(&mpd_body, &mpd_url)
        .map_err(|e| e.at_hop("manifest", &version_pid))?;

    Ok(ManifestDescriptor {
        episode_pid: episode_pid.to_string(),
        version_pid,
        mpd_url,
        manifest: summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_pid_extraction() {
        let body = r#"{"defaultAvailableVersion": {"pid": "p09mmmm1"}, "other": 1}"#;
        assert_eq!(
            version_pid_from_playlist(body, "m000xyz1").unwrap(),
            "p09mmmm1"
        );
        let expired = r#"{"defaultAvailableVersion": null}"#;
        assert!(matches!(
            version_pid_from_playlist(expired, "m000xyz1"),
            Err(Error::Unavailable { .. })
        ));
    }

    fn mediaset(connections: &str) -> String {
        format!(r#"{{"media": [{{"connection": [{connections}]}}]}}"#)
    }

    fn conn(format: &str, protocol: &str, priority: &str, href: &str) -> String {
        format!(
            r#"{{"transferFormat": "{format}", "protocol": "{protocol}", "priority": "{priority}", "href": "{href}"}}"#
        )
    }

    #[test]
    fn test_mpd_url_selection_prefers_lowest_priority() {
        let body = mediaset(&[
            conn("dash", "https", "12", "https://b/manifest.mpd"),
            conn("dash", "https", "11", "https://a/manifest.mpd"),
            conn("hls", "https", "1", "https://c/master.m3u8"),
            conn("dash", "http", "1", "http://d/manifest.mpd"),
        ]
        .join(","));
        assert_eq!(
            mpd_url_from_mediaset(&body, "p09mmmm1").unwrap(),
            "https://a/manifest.mpd"
        );
    }

    #[test]
    fn test_priority_tie_keeps_listing_order() {
        let body = mediaset(&[
            conn("dash", "https", "11", "https://first/manifest.mpd"),
            conn("dash", "https", "11", "https://second/manifest.mpd"),
        ]
        .join(","));
        assert_eq!(
            mpd_url_from_mediaset(&body, "p09mmmm1").unwrap(),
            "https://first/manifest.mpd"
        );
    }

    #[test]
    fn test_unavailable_sentinel_and_empty_selection() {
        let sentinel = r#"{"result": "selectionunavailable"}"#;
        assert!(matches!(
            mpd_url_from_mediaset(sentinel, "p09mmmm1"),
            Err(Error::Unavailable { .. })
        ));
        let none = mediaset(&conn("hls", "https", "1", "https://c/master.m3u8"));
        assert!(matches!(
            mpd_url_from_mediaset(&none, "p09mmmm1"),
            Err(Error::NoDeliveryOption { .. })
        ));
    }

    #[test]
    fn test_bad_priority_is_malformed() {
        let body = mediaset(&conn("dash", "https", "high", "https://a/manifest.mpd"));
        assert!(matches!(
            mpd_url_from_mediaset(&body, "p09mmmm1"),
            Err(Error::MalformedUpstream { .. })
        ));
    }

    #[test]
    fn test_relative_href_is_rejected() {
        let body = mediaset(&conn("dash", "https", "1", "dash/manifest.mpd"));
        assert!(matches!(
            mpd_url_from_mediaset(&body, "p09mmmm1"),
            Err(Error::Url(_))
        ));
    }
}
