// src/lib.rs

//! airdash — BBC radio broadcast locator and MPEG-DASH segment resolver.
//!
//! Given a station and a date (or a programme title), finds the stable
//! episode PID by walking schedule/episode-listing pages, resolves the
//! episode's streaming manifest through the playlist → media-selector →
//! MPD chain, and reconstructs the exact ordered sequence of media-segment
//! URLs for the broadcast. Downloading and transcoding the segments is
//! left to callers.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
