use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, warn};

use crate::config::DashboardConfig;
use crate::error::DataSourceError;
use crate::fetch::{BasicClient, DiskCache, HttpClient, fetch_bytes};
use crate::parser::{self, Page};
use crate::services::{Event, LapTiming, MotorsportDataSource, PitStop, RaceResultRow, SessionKind};

/// Largest page the provider serves.
pub const PAGE_LIMIT: usize = 100;

pub struct JolpicaClient<C = BasicClient> {
    http: C,
    base_url: String,
    cache: Option<DiskCache>,
}

impl JolpicaClient<BasicClient> {
    /// Builds a client with the configured timeout and initializes the
    /// response cache.
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        let http = BasicClient::with_timeout(config.request_timeout())?;
        let cache = config.cache.init()?;
        Ok(Self::new(http, &config.api_base_url, cache))
    }
}

impl<C: HttpClient> JolpicaClient<C> {
    pub fn new(http: C, base_url: &str, cache: Option<DiskCache>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// Fetches one resource, going through the cache when enabled.
    async fn get(&self, key: &str) -> Result<Bytes> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.load(key).await {
                debug!(key, "Cache hit");
                return Ok(hit);
            }
        }

        let url = format!("{}/{}", self.base_url, key);
        let bytes = fetch_bytes(&self.http, &url).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(key, bytes.clone()).await {
                warn!(key, error = %e, "Failed to cache provider response");
            }
        }
        Ok(bytes)
    }

    /// Follows `offset` until the provider's `total` has been read.
    async fn get_all<T, F>(&self, path: &str, parse: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&[u8]) -> Result<Page<T>> + Send + Sync,
    {
        let mut items = Vec::new();
        let mut offset = 0;

        loop {
            let key = format!("{path}?limit={PAGE_LIMIT}&offset={offset}");
            let bytes = self.get(&key).await?;
            let mut page = parse(&bytes)?;
            items.append(&mut page.items);

            match page.next_offset() {
                Some(next) if next > offset => offset = next,
                _ => break,
            }
        }

        debug!(path, count = items.len(), "Provider resource loaded");
        Ok(items)
    }
}

#[async_trait]
impl<C: HttpClient> MotorsportDataSource for JolpicaClient<C> {
    #[tracing::instrument(skip(self))]
    async fn schedule(&self, year: i32) -> Result<Vec<Event>> {
        let mut events = self
            .get_all(&format!("{year}.json"), parser::parse_schedule)
            .await?;
        events.sort_by_key(|e| e.round);
        Ok(events)
    }

    #[tracing::instrument(skip(self))]
    async fn session_results(
        &self,
        year: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RaceResultRow>> {
        let resource = match kind {
            SessionKind::Race => "results",
            SessionKind::Qualifying => "qualifying",
            SessionKind::Sprint => "sprint",
            SessionKind::Practice1 | SessionKind::Practice2 | SessionKind::Practice3 => {
                return Err(DataSourceError::UnsupportedSession(kind).into());
            }
        };

        let mut rows = self
            .get_all(&format!("{year}/{round}/{resource}.json"), |bytes| {
                parser::parse_results(bytes, kind)
            })
            .await?;
        rows.sort_by_key(|r| r.position_or_worst());
        Ok(rows)
    }

    #[tracing::instrument(skip(self))]
    async fn laps(&self, year: i32, round: u32) -> Result<Vec<LapTiming>> {
        self.get_all(&format!("{year}/{round}/laps.json"), parser::parse_laps)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn pit_stops(&self, year: i32, round: u32) -> Result<Vec<PitStop>> {
        self.get_all(&format!("{year}/{round}/pitstops.json"), parser::parse_pit_stops)
            .await
    }
}
