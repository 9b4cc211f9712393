// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP and fetching behaviour settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Listings window and catalogue settings
    #[serde(default)]
    pub listings: ListingsConfig,

    /// Catalogue store location
    #[serde(default)]
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetch.user_agent.trim().is_empty() {
            return Err(Error::config("fetch.user_agent is empty"));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(Error::config("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.max_concurrent == 0 {
            return Err(Error::config("fetch.max_concurrent must be > 0"));
        }
        if self.fetch.retry_budget == 0 {
            return Err(Error::config("fetch.retry_budget must be > 0"));
        }
        if self.listings.window_days == 0 {
            return Err(Error::config("listings.window_days must be > 0"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            listings: ListingsConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// HTTP client and batch-fetch behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header for all requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum in-flight requests in a batch fetch
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Whole-batch retry attempts on transient transport failures
    #[serde(default = "defaults::retry_budget")]
    pub retry_budget: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout_secs(),
            max_concurrent: defaults::max_concurrent(),
            retry_budget: defaults::retry_budget(),
        }
    }
}

/// Listings window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingsConfig {
    /// Default schedule window length in days. The upstream site retains
    /// programmes for 30 days, so that is also the maximum useful value.
    #[serde(default = "defaults::window_days")]
    pub window_days: u32,

    /// Capture programme genres when building catalogues
    #[serde(default)]
    pub with_genre: bool,
}

impl Default for ListingsConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
            with_genre: false,
        }
    }
}

/// Catalogue store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the SQLite catalogue database
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn user_agent() -> String {
        format!("airdash/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout_secs() -> u64 {
        30
    }

    pub fn max_concurrent() -> usize {
        10
    }

    pub fn retry_budget() -> usize {
        3
    }

    pub fn window_days() -> u32 {
        30
    }

    pub fn store_path() -> PathBuf {
        PathBuf::from("programme_catalogue.db")
    }
}
