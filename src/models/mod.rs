// src/models/mod.rs

//! Domain models for broadcast resolution.
//!
//! Stations, schedule broadcasts, catalogue entries and the segment URL
//! sequence, organized by their primary purpose.

mod broadcast;
mod catalogue;
mod station;
mod urlset;

pub use broadcast::{BroadcastRecord, ListingsWindow, ScheduleDay};
pub use catalogue::{Catalogue, CatalogueEntry, Guide};
pub use station::{StationKind, StationRef, stations};
pub use urlset::SegmentUrlSet;
