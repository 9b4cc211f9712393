// src/models/urlset.rs

//! Lazy, finite sequences of stream-segment URLs.
//!
//! A stream is one initialization segment (`.dash`) followed by N numbered
//! media segments (`.m4s`). The set holds only its immutable configuration;
//! enumeration state lives in the iterator, so reconstructing a set from
//! the same configuration always reproduces the same sequence.

use crate::error::{Error, Result};

/// Configuration of a segment URL sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentUrlSet {
    /// Number of numbered media segments
    pub size: u64,
    /// URL directory prefix, up to and including the final `/`
    pub url_prefix: String,
    /// Filename up to (not including) the separator before the number
    pub filename_prefix: String,
    /// Separator between filename prefix and segment number
    pub filename_sep: char,
    /// Filename suffix of the numbered segments
    pub url_suffix: String,
    /// Number segments from 0 instead of 1
    pub zero_based: bool,
    /// Zero-pad width for segment numbers (0 = no padding)
    pub zfill: usize,
}

impl SegmentUrlSet {
    /// Build a sequence from an explicit segment count. With `zfill`, the
    /// pad width is the digit count of `size`.
    pub fn new(
        size: u64,
        url_prefix: impl Into<String>,
        filename_prefix: impl Into<String>,
        filename_sep: char,
        url_suffix: impl Into<String>,
        zero_based: bool,
        zfill: bool,
    ) -> Self {
        Self {
            size,
            url_prefix: url_prefix.into(),
            filename_prefix: filename_prefix.into(),
            filename_sep,
            url_suffix: url_suffix.into(),
            zero_based,
            zfill: if zfill { size.to_string().len() } else { 0 },
        }
    }

    /// Reverse-engineer a sequence from the URL of its final `.m4s`
    /// segment. The numeric filename suffix and the separator before it
    /// are both required; their absence is a hard failure.
    pub fn from_last_m4s_url(url: &str) -> Result<Self> {
        let stem = url
            .strip_suffix(".m4s")
            .ok_or_else(|| Error::malformed(url, "final segment URL lacks .m4s suffix"))?;
        let (url_prefix, filename) = match stem.rfind('/') {
            Some(idx) => (&url[..=idx], &stem[idx + 1..]),
            None => ("", stem),
        };
        let digit_start = filename
            .rfind(|c: char| !c.is_ascii_digit())
            .map(|idx| idx + 1)
            .unwrap_or(0);
        let digits = &filename[digit_start..];
        if digits.is_empty() {
            return Err(Error::malformed(url, "no numeric suffix in segment filename"));
        }
        if digit_start == 0 {
            return Err(Error::malformed(url, "no separator before segment number"));
        }
        let sep = filename[..digit_start]
            .chars()
            .next_back()
            .expect("non-empty prefix");
        let filename_prefix = &filename[..digit_start - sep.len_utf8()];
        let size: u64 = digits
            .parse()
            .map_err(|e| Error::malformed(url, format!("segment number {digits:?}: {e}")))?;
        Ok(Self::new(
            size,
            url_prefix,
            filename_prefix,
            sep,
            ".m4s",
            false,
            true,
        ))
    }

    /// URL of the initialization segment (fixed `.dash` suffix, no number).
    pub fn init_url(&self) -> String {
        format!("{}{}.dash", self.url_prefix, self.filename_prefix)
    }

    /// URL of the numbered segment `n`.
    pub fn part_url(&self, n: u64) -> String {
        format!(
            "{}{}{}{:0width$}{}",
            self.url_prefix,
            self.filename_prefix,
            self.filename_sep,
            n,
            self.url_suffix,
            width = self.zfill
        )
    }

    /// Number of the final segment.
    pub fn last_number(&self) -> u64 {
        if self.zero_based {
            self.size.saturating_sub(1)
        } else {
            self.size
        }
    }

    /// URL of the final segment.
    pub fn last_url(&self) -> String {
        self.part_url(self.last_number())
    }

    /// Lazily enumerate the sequence: the init URL, then every numbered
    /// segment URL in order.
    pub fn iter(&self) -> SegmentUrlIter<'_> {
        SegmentUrlIter {
            set: self,
            initialised: false,
            pos: if self.zero_based { 0 } else { 1 },
        }
    }
}

impl<'a> IntoIterator for &'a SegmentUrlSet {
    type Item = String;
    type IntoIter = SegmentUrlIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Enumeration cursor over a [`SegmentUrlSet`].
pub struct SegmentUrlIter<'a> {
    set: &'a SegmentUrlSet,
    initialised: bool,
    pos: u64,
}

impl Iterator for SegmentUrlIter<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if !self.initialised {
            self.initialised = true;
            return Some(self.set.init_url());
        }
        let end = if self.set.zero_based {
            self.set.size
        } else {
            self.set.size + 1
        };
        if self.pos < end {
            let url = self.set.part_url(self.pos);
            self.pos += 1;
            Some(url)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(size: u64) -> SegmentUrlSet {
        SegmentUrlSet::new(
            size,
            "https://example.com/dash/",
            "episode-audio=128000",
            '-',
            ".m4s",
            false,
            true,
        )
    }

    #[test]
    fn test_sequence_layout() {
        let set = sample(3);
        let urls: Vec<_> = set.iter().collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/dash/episode-audio=128000.dash",
                "https://example.com/dash/episode-audio=128000-1.m4s",
                "https://example.com/dash/episode-audio=128000-2.m4s",
                "https://example.com/dash/episode-audio=128000-3.m4s",
            ]
        );
    }

    #[test]
    fn test_zero_padding_width_follows_size() {
        let set = sample(120);
        assert_eq!(
            set.part_url(7),
            "https://example.com/dash/episode-audio=128000-007.m4s"
        );
        assert_eq!(set.iter().count() as u64, 121);
    }

    #[test]
    fn test_zero_based_numbering() {
        let mut set = sample(2);
        set.zero_based = true;
        let urls: Vec<_> = set.iter().collect();
        assert!(urls[1].ends_with("-0.m4s"));
        assert!(urls[2].ends_with("-1.m4s"));
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn test_determinism_across_reconstruction() {
        let a: Vec<_> = sample(42).iter().collect();
        let b: Vec<_> = sample(42).iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_last_m4s_url_round_trip() {
        for n in [1u64, 9, 10, 90, 1234] {
            let set = sample(n);
            let recovered = SegmentUrlSet::from_last_m4s_url(&set.last_url()).unwrap();
            assert_eq!(recovered.size, n);
            assert_eq!(recovered.last_url(), set.last_url());
            assert_eq!(recovered.init_url(), set.init_url());
        }
    }

    #[test]
    fn test_from_last_m4s_url_validation() {
        // Wrong suffix
        assert!(SegmentUrlSet::from_last_m4s_url("https://x/a-90.mp4").is_err());
        // Non-numeric suffix
        assert!(SegmentUrlSet::from_last_m4s_url("https://x/a-last.m4s").is_err());
        // No separator: filename is digits only
        assert!(SegmentUrlSet::from_last_m4s_url("https://x/90.m4s").is_err());
    }
}
