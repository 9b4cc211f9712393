// src/storage/mod.rs

//! Persistent catalogue store.
//!
//! Catalogues are cheap to keep and expensive to rebuild (one metadata
//! fetch per episode), so built catalogues go into a small SQLite table
//! keyed by programme PID and station.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::{Catalogue, CatalogueEntry};

/// One stored programme row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProgramme {
    pub pid: String,
    pub title: String,
    pub genre: Option<String>,
    pub station: String,
}

/// Catalogue persistence seam.
#[async_trait]
pub trait CatalogueStore: Send + Sync {
    /// Whether the store exists at all yet.
    async fn exists(&self) -> Result<bool>;

    /// Create the schema if it does not exist yet.
    async fn ensure(&self) -> Result<()>;

    /// Persist one entry for a station, replacing any existing row for
    /// the same (pid, station) pair.
    async fn insert(&self, entry: &CatalogueEntry, station: &str) -> Result<()>;

    /// Persist a whole catalogue. Existing rows for the same
    /// (pid, station) pair are replaced.
    async fn save(&self, catalogue: &Catalogue) -> Result<()>;

    /// All rows for one programme PID, across stations.
    async fn by_pid(&self, pid: &str) -> Result<Vec<StoredProgramme>>;

    /// Rebuild a station's catalogue from its stored rows.
    async fn by_station(&self, station: &str) -> Result<Catalogue>;

    /// Whether any rows exist for the station.
    async fn has_station(&self, station: &str) -> Result<bool>;
}

/// SQLite-backed store. Opens a fresh connection per operation; the
/// access pattern is a handful of calls per run, not a hot path.
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.path)
    }

    async fn connect(&self) -> Result<SqlitePool> {
        let url = format!("sqlite://{}?mode=rwc", self.path.display());
        Ok(SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await?)
    }
}

#[async_trait]
impl CatalogueStore for SqliteStore {
    async fn exists(&self) -> Result<bool> {
        Ok(self.path.exists())
    }

    async fn ensure(&self) -> Result<()> {
        let pool = self.connect().await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS programmes (
                 pid TEXT NOT NULL,
                 title TEXT NOT NULL,
                 genre TEXT,
                 station TEXT NOT NULL,
                 PRIMARY KEY (pid, station)
             )",
        )
        .execute(&pool)
        .await?;
        pool.close().await;
        Ok(())
    }

    async fn insert(&self, entry: &CatalogueEntry, station: &str) -> Result<()> {
        let pool = self.connect().await?;
        sqlx::query(
            "INSERT OR REPLACE INTO programmes (pid, title, genre, station)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.pid)
        .bind(&entry.title)
        .bind(&entry.genre)
        .bind(station)
        .execute(&pool)
        .await?;
        pool.close().await;
        Ok(())
    }

    async fn save(&self, catalogue: &Catalogue) -> Result<()> {
        self.ensure().await?;
        for entry in catalogue.entries() {
            self.insert(entry, &catalogue.station).await?;
        }
        log::info!(
            "Saved {} programme(s) for {} to {}",
            catalogue.len(),
            catalogue.station,
            self.path.display()
        );
        Ok(())
    }

    async fn by_pid(&self, pid: &str) -> Result<Vec<StoredProgramme>> {
        let pool = self.connect().await?;
        let rows = sqlx::query(
            "SELECT pid, title, genre, station FROM programmes
             WHERE pid = ? ORDER BY station",
        )
        .bind(pid)
        .fetch_all(&pool)
        .await?;
        pool.close().await;
        Ok(rows
            .into_iter()
            .map(|row| StoredProgramme {
                pid: row.get("pid"),
                title: row.get("title"),
                genre: row.get("genre"),
                station: row.get("station"),
            })
            .collect())
    }

    async fn by_station(&self, station: &str) -> Result<Catalogue> {
        let pool = self.connect().await?;
        let rows = sqlx::query(
            "SELECT pid, title, genre FROM programmes
             WHERE station = ? ORDER BY pid",
        )
        .bind(station)
        .fetch_all(&pool)
        .await?;
        pool.close().await;
        let entries: Vec<CatalogueEntry> = rows
            .into_iter()
            .map(|row| CatalogueEntry {
                pid: row.get("pid"),
                title: row.get("title"),
                genre: row.get("genre"),
            })
            .collect();
        let genred = entries.iter().any(|e| e.genre.is_some());
        let mut catalogue = Catalogue::new(station, genred);
        for entry in entries {
            catalogue.record(entry);
        }
        Ok(catalogue)
    }

    async fn has_station(&self, station: &str) -> Result<bool> {
        let pool = self.connect().await?;
        let row = sqlx::query("SELECT COUNT(*) AS n FROM programmes WHERE station = ?")
            .bind(station)
            .fetch_one(&pool)
            .await?;
        pool.close().await;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }
}
