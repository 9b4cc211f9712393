// src/utils/mod.rs

//! Utility functions and helpers.

pub mod isoduration;
pub mod time;

/// Directory prefix of a URL: everything up to and including the last `/`.
///
/// Segment filenames from a manifest are resolved relative to the manifest
/// URL's directory, not its full path.
pub fn dir_prefix(url: &str) -> &str {
    match url.rfind('/') {
        Some(idx) => &url[..=idx],
        None => url,
    }
}
