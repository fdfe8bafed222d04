//! Runtime configuration for the dashboard and its provider cache.
//!
//! Values start from [`Default`], can be replaced wholesale by a JSON file
//! ([`DashboardConfig::load`]) and are then overridden by `F1_*` environment
//! variables ([`DashboardConfig::with_overrides`]).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::fetch::DiskCache;

/// On-disk response cache settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    /// Store entries gzip-compressed.
    pub compress: bool,
    /// Entries older than this are refetched. `None` keeps them forever.
    pub ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("cache"),
            compress: true,
            ttl_secs: Some(6 * 60 * 60),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }

    /// Creates the cache directory and returns the cache handle.
    ///
    /// Called once at startup, before the first provider request. Returns
    /// `None` when caching is disabled.
    pub fn init(&self) -> Result<Option<DiskCache>> {
        if !self.enabled {
            return Ok(None);
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create cache dir {}", self.dir.display()))?;
        Ok(Some(DiskCache::new(
            self.dir.clone(),
            self.compress,
            self.ttl(),
        )))
    }
}

/// Top-level settings shared by the CLI and the web server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    /// Number of most recent races used for driver form.
    pub form_window: usize,
    pub form_count: usize,
    pub track_rating_count: usize,
    /// Seasons before the current one used for track ratings.
    pub track_lookback_years: i32,
    /// Seasons before the current one used for winner history.
    pub history_years: i32,
    pub first_season: i32,
    pub cache: CacheConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            api_base_url: "https://api.jolpi.ca/ergast/f1".to_string(),
            request_timeout_secs: 30,
            form_window: 3,
            form_count: 10,
            track_rating_count: 8,
            track_lookback_years: 3,
            history_years: 5,
            first_season: 2018,
            cache: CacheConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Loads settings from a JSON file. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {path}"))?;
        let config: DashboardConfig = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file {path}"))?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Applies `F1_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`, keyed by variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(v) = lookup("F1_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("F1_API_BASE_URL") {
            self.api_base_url = v.trim_end_matches('/').to_string();
        }
        override_parsed(&lookup, "F1_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs)?;
        override_parsed(&lookup, "F1_FORM_WINDOW", &mut self.form_window)?;
        override_parsed(&lookup, "F1_FORM_COUNT", &mut self.form_count)?;
        override_parsed(&lookup, "F1_TRACK_RATING_COUNT", &mut self.track_rating_count)?;
        override_parsed(&lookup, "F1_TRACK_LOOKBACK_YEARS", &mut self.track_lookback_years)?;
        override_parsed(&lookup, "F1_HISTORY_YEARS", &mut self.history_years)?;
        override_parsed(&lookup, "F1_FIRST_SEASON", &mut self.first_season)?;
        override_parsed(&lookup, "F1_CACHE_ENABLED", &mut self.cache.enabled)?;
        override_parsed(&lookup, "F1_CACHE_COMPRESS", &mut self.cache.compress)?;
        if let Some(v) = lookup("F1_CACHE_DIR") {
            self.cache.dir = PathBuf::from(v);
        }

        // 0 disables expiry
        let mut ttl = self.cache.ttl_secs.unwrap_or(0);
        override_parsed(&lookup, "F1_CACHE_TTL_SECS", &mut ttl)?;
        self.cache.ttl_secs = (ttl > 0).then_some(ttl);

        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn override_parsed<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<()>
where
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value '{raw}' for {key}: {e}"))?;
    }
    Ok(())
}
