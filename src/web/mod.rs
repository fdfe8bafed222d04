//! HTTP surface: the dashboard pages and the JSON API.

pub mod api;
pub mod pages;

use anyhow::Result;
use axum::Router;
use axum::routing::get;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::analyzers::analyzer::Analyzer;

/// Source of the current time for every request.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self::with_clock(analyzer, Arc::new(Utc::now))
    }

    pub fn with_clock(analyzer: Analyzer, clock: Clock) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/analysis", get(pages::analysis))
        .route("/api/seasons", get(api::seasons))
        .route("/api/events/:year", get(api::events))
        .route("/api/sessions", get(api::sessions))
        .route("/api/drivers/:year/:event/:session", get(api::drivers))
        .route("/api/results/:year/:event/:session", get(api::results))
        .route("/api/form", get(api::form))
        .route("/api/track-rating/:track", get(api::track_rating))
        .route("/api/prediction", get(api::prediction))
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Dashboard listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
