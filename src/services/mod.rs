// src/services/mod.rs

//! Service layer for broadcast resolution.
//!
//! - Bounded concurrent fetching (`fetch`)
//! - Schedule-page retrieval and parsing (`schedule`)
//! - Episode-listing pagination (`listings`)
//! - Broadcast/catalogue sieving (`search`)
//! - Playlist → media-selector → manifest chain (`mediaset`)
//! - DASH manifest parsing (`manifest`)
//! - Programme catalogue building (`catalogue`)

pub mod catalogue;
pub mod fetch;
pub mod listings;
pub mod manifest;
pub mod mediaset;
pub mod schedule;
pub mod search;

pub use catalogue::CatalogueBuilder;
pub use fetch::{BatchFetcher, HttpClient, UrlFetcher};
pub use manifest::ManifestSummary;
pub use mediaset::ManifestDescriptor;
pub use search::Sieve;
