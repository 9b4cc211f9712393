// src/models/catalogue.rs

//! Programme catalogues: deduplicated programme tables per station, and
//! multi-station guides.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// One programme in a catalogue. Deduplicated by programme PID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogueEntry {
    /// Programme (brand/series) PID, the parent of its episodes
    pub pid: String,
    pub title: String,
    /// Present only when the catalogue was built with genre capture
    pub genre: Option<String>,
}

/// A station's programme table: programme PID → entry, keys unique.
#[derive(Debug, Clone)]
pub struct Catalogue {
    /// Short station key, e.g. `"r4"`
    pub station: String,
    genred: bool,
    entries: BTreeMap<String, CatalogueEntry>,
}

impl Catalogue {
    pub fn new(station: impl Into<String>, genred: bool) -> Self {
        Self {
            station: station.into(),
            genred,
            entries: BTreeMap::new(),
        }
    }

    /// Whether genres were captured at build time.
    pub fn genred(&self) -> bool {
        self.genred
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, pid: &str) -> Option<&CatalogueEntry> {
        self.entries.get(pid)
    }

    /// All entries, ordered by programme PID.
    pub fn entries(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.values()
    }

    /// Whether a programme with this title was already recorded. Used by
    /// the builder as an approximate guard against duplicate parent
    /// records that carry distinct PIDs.
    pub fn has_title(&self, title: &str) -> bool {
        self.entries.values().any(|e| e.title == title)
    }

    /// Record an entry; the first entry for a PID wins.
    pub fn record(&mut self, entry: CatalogueEntry) {
        self.entries.entry(entry.pid.clone()).or_insert(entry);
    }

    /// Re-index as genre → (programme PID, title) pairs.
    ///
    /// Only valid for catalogues built with genre capture; entries with no
    /// genre are grouped under the empty string.
    pub fn by_genre(&self) -> Result<BTreeMap<String, Vec<(String, String)>>> {
        if !self.genred {
            return Err(Error::config(
                "catalogue was not built with genres; rebuild with genre capture",
            ));
        }
        let mut keyed: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
        for entry in self.entries.values() {
            keyed
                .entry(entry.genre.clone().unwrap_or_default())
                .or_default()
                .push((entry.pid.clone(), entry.title.clone()));
        }
        Ok(keyed)
    }

    /// Human-readable scope for search errors.
    pub fn scope(&self) -> String {
        format!("catalogue of {}", self.station)
    }
}

/// Programme catalogues for several stations, keyed by station key.
#[derive(Debug, Clone, Default)]
pub struct Guide {
    catalogues: BTreeMap<String, Catalogue>,
}

impl Guide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station's catalogue. A station may only be recorded once.
    pub fn add(&mut self, catalogue: Catalogue) -> Result<()> {
        let station = catalogue.station.clone();
        if self.catalogues.contains_key(&station) {
            return Err(Error::config(format!(
                "station {station} is already recorded in this guide"
            )));
        }
        self.catalogues.insert(station, catalogue);
        Ok(())
    }

    pub fn get(&self, station: &str) -> Option<&Catalogue> {
        self.catalogues.get(station)
    }

    pub fn catalogues(&self) -> impl Iterator<Item = &Catalogue> {
        self.catalogues.values()
    }

    pub fn len(&self) -> usize {
        self.catalogues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalogues.is_empty()
    }
}
