// src/services/manifest.rs

//! DASH manifest (MPD) parsing.
//!
//! The manifest names the stream's representations and its segment
//! template. Only the first `Period` matters for radio episodes; the
//! highest-bandwidth representation is selected and the segment count is
//! derived from the presentation duration, the audio sample rate and the
//! per-segment duration (expressed in sample-rate ticks).

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::models::SegmentUrlSet;
use crate::utils::{dir_prefix, isoduration};

/// What stream construction needs out of a manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSummary {
    /// Number of media segments, `ceil(duration * rate / seg_duration)`
    pub segment_count: u64,
    /// Selected representation id, e.g. `"audio=320000"`
    pub representation_id: String,
    /// Segment filename template with `$RepresentationID$`/`$Number$`
    pub media_template: String,
    /// Relative segment directory from the Period's `BaseURL`
    pub base_url: String,
    /// Manifest URL directory, up to and including the final `/`
    pub url_prefix: String,
    pub total_seconds: f64,
    pub sample_rate: u64,
    pub segment_duration: u64,
    pub bandwidth: u64,
}

impl ManifestSummary {
    /// URL of the final numbered media segment: the template with the
    /// representation id and segment count substituted, rooted at the
    /// manifest's directory plus the Period base URL.
    pub fn last_segment_url(&self) -> Result<String> {
        let parts: Vec<&str> = self.media_template.split('$').collect();
        if parts.len() != 5 {
            return Err(Error::malformed(
                &self.media_template,
                "segment template does not have exactly two $...$ placeholders",
            ));
        }
        Ok(format!(
            "{}{}{}{}{}{}{}",
            self.url_prefix,
            self.base_url,
            parts[0],
            self.representation_id,
            parts[2],
            self.segment_count,
            parts[4]
        ))
    }

    /// Reconstruct the whole segment sequence from the final segment URL.
    pub fn to_url_set(&self) -> Result<SegmentUrlSet> {
        SegmentUrlSet::from_last_m4s_url(&self.last_segment_url()?)
    }
}

fn attr(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

/// The document namespace, as declared by the root element's first
/// attribute: either `xmlns` itself or a schema-location whose value
/// leads with the namespace URN. Either way the first whitespace token
/// of the first attribute value is the namespace.
fn extract_namespace(root: &BytesStart) -> Option<String> {
    let first = root.attributes().flatten().next()?;
    let value = String::from_utf8(first.value.to_vec()).ok()?;
    value.split_whitespace().next().map(str::to_string)
}

#[derive(Debug, Default)]
struct Adaptation {
    sample_rate: Option<u64>,
    bandwidth: Option<u64>,
    representation_id: Option<String>,
    segment_duration: Option<u64>,
    media: Option<String>,
}

impl Adaptation {
    fn complete(&self) -> bool {
        self.sample_rate.is_some()
            && self.bandwidth.is_some()
            && self.representation_id.is_some()
            && self.segment_duration.is_some()
            && self.media.is_some()
    }
}

/// Parse a manifest body fetched from `manifest_url`.
pub fn parse_manifest(xml: &str, manifest_url: &str) -> Result<ManifestSummary> {
    let malformed = |message: &str| Error::malformed(manifest_url, message);

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut namespace: Option<String> = None;
    let mut duration: Option<String> = None;
    let mut base_url: Option<String> = None;
    let mut adaptations: Vec<Adaptation> = Vec::new();
    let mut current: Option<Adaptation> = None;
    let mut in_period = false;
    let mut period_done = false;
    let mut capture_base = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"MPD" if namespace.is_none() => {
                    namespace = extract_namespace(&e);
                    duration = attr(&e, b"mediaPresentationDuration");
                }
                b"Period" if !period_done => in_period = true,
                b"AdaptationSet" if in_period && !period_done => {
                    current = Some(Adaptation {
                        sample_rate: attr(&e, b"audioSamplingRate").and_then(|v| v.parse().ok()),
                        ..Adaptation::default()
                    });
                }
                b"Representation" => {
                    if let Some(adaptation) = current.as_mut() {
                        if adaptation.representation_id.is_none() {
                            adaptation.representation_id = attr(&e, b"id");
                            adaptation.bandwidth =
                                attr(&e, b"bandwidth").and_then(|v| v.parse().ok());
                        }
                    }
                }
                b"SegmentTemplate" => {
                    if let Some(adaptation) = current.as_mut() {
                        if adaptation.media.is_none() {
                            adaptation.media = attr(&e, b"media");
                            adaptation.segment_duration =
                                attr(&e, b"duration").and_then(|v| v.parse().ok());
                        }
                    }
                }
                b"BaseURL" if in_period && current.is_none() && base_url.is_none() => {
                    capture_base = true;
                }
                _ => {}
            },
            Event::Text(t) => {
                if capture_base {
                    base_url = Some(t.unescape()?.into_owned());
                    capture_base = false;
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"Period" => {
                    in_period = false;
                    period_done = true;
                }
                b"AdaptationSet" => {
                    if let Some(adaptation) = current.take() {
                        adaptations.push(adaptation);
                    }
                }
                b"BaseURL" => capture_base = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    // Elements are matched by local name, so default-namespace and
    // prefixed documents parse alike; the root must still declare the
    // namespace for the document to count as a manifest.
    if namespace.is_none() {
        return Err(malformed("root element declares no namespace"));
    }
    let duration = duration.ok_or_else(|| malformed("missing mediaPresentationDuration"))?;
    let total_seconds = isoduration::total_seconds(&duration)?;
    if !period_done {
        return Err(malformed("no Period element"));
    }

    let mut usable: Vec<Adaptation> = adaptations.into_iter().filter(Adaptation::complete).collect();
    if usable.is_empty() {
        return Err(malformed("no complete audio adaptation set"));
    }
    // Stable ascending sort; the last entry is the best bandwidth.
    usable.sort_by_key(|a| a.bandwidth);
    let best = usable.pop().unwrap_or_default();

    let sample_rate = best.sample_rate.unwrap_or_default();
    let segment_duration = best.segment_duration.unwrap_or_default();
    if segment_duration == 0 {
        return Err(malformed("segment duration is zero"));
    }
    let segment_count =
        (total_seconds * sample_rate as f64 / segment_duration as f64).ceil() as u64;

    Ok(ManifestSummary {
        segment_count,
        representation_id: best.representation_id.unwrap_or_default(),
        media_template: best.media.unwrap_or_default(),
        base_url: base_url.unwrap_or_default(),
        url_prefix: dir_prefix(manifest_url).to_string(),
        total_seconds,
        sample_rate,
        segment_duration,
        bandwidth: best.bandwidth.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MPD_URL: &str = "https://example.com/streams/episode.mpd";

    fn adaptation(bandwidth: u64) -> String {
        format!(
            r#"<AdaptationSet audioSamplingRate="48000" mimeType="audio/mp4">
                 <Representation id="audio={bandwidth}" bandwidth="{bandwidth}"/>
                 <SegmentTemplate duration="96000"
                     initialization="episode-$RepresentationID$.dash"
                     media="episode-$RepresentationID$-$Number$.m4s"/>
               </AdaptationSet>"#
        )
    }

    fn mpd(adaptations: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
               <MPD xmlns="urn:mpeg:dash:schema:mpd:2011" type="static"
                    mediaPresentationDuration="PT3M0S">
                 <Period>
                   <BaseURL>dash/</BaseURL>
                   {}
                 </Period>
               </MPD>"#,
            adaptations.join("\n")
        )
    }

    #[test]
    fn test_parses_segment_geometry() {
        let xml = mpd(&[adaptation(96000)]);
        let summary = parse_manifest(&xml, MPD_URL).unwrap();
        // 180s of 48000Hz audio in 96000-tick segments: 90 segments.
        assert_eq!(summary.segment_count, 90);
        assert_eq!(summary.sample_rate, 48000);
        assert_eq!(summary.total_seconds, 180.0);
        assert_eq!(summary.base_url, "dash/");
        assert_eq!(summary.url_prefix, "https://example.com/streams/");
    }

    #[test]
    fn test_selects_best_bandwidth_either_order() {
        for order in [
            [adaptation(128000), adaptation(320000)],
            [adaptation(320000), adaptation(128000)],
        ] {
            let summary = parse_manifest(&mpd(&order), MPD_URL).unwrap();
            assert_eq!(summary.bandwidth, 320000);
            assert_eq!(summary.representation_id, "audio=320000");
        }
    }

    #[test]
    fn test_last_segment_url_substitution() {
        let summary = parse_manifest(&mpd(&[adaptation(320000)]), MPD_URL).unwrap();
        assert_eq!(
            summary.last_segment_url().unwrap(),
            "https://example.com/streams/dash/episode-audio=320000-90.m4s"
        );
        let set = summary.to_url_set().unwrap();
        assert_eq!(set.size, 90);
        assert_eq!(
            set.init_url(),
            "https://example.com/streams/dash/episode-audio=320000.dash"
        );
    }

    #[test]
    fn test_namespace_from_schema_location_first() {
        let xml = r#"<MPD xsi:schemaLocation="urn:mpeg:dash:schema:mpd:2011 DASH-MPD.xsd"
                          xmlns="urn:mpeg:dash:schema:mpd:2011"
                          xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                          mediaPresentationDuration="PT1M0S">
                       <Period><BaseURL>d/</BaseURL>{}</Period>
                     </MPD>"#
            .replace("{}", &adaptation(96000));
        let summary = parse_manifest(&xml, MPD_URL).unwrap();
        assert_eq!(summary.segment_count, 30);
    }

    #[test]
    fn test_prefixed_elements_parse_by_local_name() {
        let xml = r#"<mpd:MPD xmlns:mpd="urn:mpeg:dash:schema:mpd:2011"
                              mediaPresentationDuration="PT3M0S">
                       <mpd:Period>
                         <mpd:BaseURL>dash/</mpd:BaseURL>
                         <mpd:AdaptationSet audioSamplingRate="48000">
                           <mpd:Representation id="audio=96000" bandwidth="96000"/>
                           <mpd:SegmentTemplate duration="96000"
                               media="episode-$RepresentationID$-$Number$.m4s"/>
                         </mpd:AdaptationSet>
                       </mpd:Period>
                     </mpd:MPD>"#;
        let summary = parse_manifest(xml, MPD_URL).unwrap();
        assert_eq!(summary.segment_count, 90);
        assert_eq!(summary.base_url, "dash/");
        assert_eq!(summary.representation_id, "audio=96000");
    }

    #[test]
    fn test_second_period_is_ignored() {
        let xml = format!(
            r#"<MPD xmlns="urn:mpeg:dash:schema:mpd:2011" mediaPresentationDuration="PT3M0S">
                 <Period><BaseURL>first/</BaseURL>{}</Period>
                 <Period><BaseURL>second/</BaseURL>{}</Period>
               </MPD>"#,
            adaptation(96000),
            adaptation(640000)
        );
        let summary = parse_manifest(&xml, MPD_URL).unwrap();
        assert_eq!(summary.base_url, "first/");
        assert_eq!(summary.bandwidth, 96000);
    }

    #[test]
    fn test_rejects_incomplete_documents() {
        let no_period = r#"<MPD xmlns="urn:x" mediaPresentationDuration="PT1M0S"></MPD>"#;
        assert!(parse_manifest(no_period, MPD_URL).is_err());

        let no_duration = format!(
            r#"<MPD xmlns="urn:x"><Period>{}</Period></MPD>"#,
            adaptation(96000)
        );
        assert!(parse_manifest(&no_duration, MPD_URL).is_err());

        let no_namespace = r#"<MPD mediaPresentationDuration="PT1M0S"><Period></Period></MPD>"#;
        assert!(parse_manifest(no_namespace, MPD_URL).is_err());
    }

    #[test]
    fn test_bad_template_shape() {
        let summary = ManifestSummary {
            segment_count: 3,
            representation_id: "audio=96000".into(),
            media_template: "episode-$Number$.m4s".into(),
            base_url: "dash/".into(),
            url_prefix: "https://example.com/".into(),
            total_seconds: 6.0,
            sample_rate: 48000,
            segment_duration: 96000,
            bandwidth: 96000,
        };
        assert!(summary.last_segment_url().is_err());
    }
}
