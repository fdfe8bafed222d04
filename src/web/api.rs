//! JSON endpoints backing the dashboard selectors.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::fmt::Display;

use crate::analyzers::analyzer::Analyzer;
use crate::analyzers::types::{
    EventSummary, FormEntry, PredictionBlocks, SessionDriver, SessionResultEntry,
    SessionTypeOption, TrackRatingEntry,
};
use crate::services::SessionKind;
use crate::web::AppState;

pub type ApiError = (StatusCode, Json<serde_json::Value>);

fn bad_request(e: impl Display) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
}

#[derive(Debug, Deserialize)]
pub struct CountParams {
    pub count: Option<usize>,
}

pub async fn seasons(State(state): State<AppState>) -> Json<Vec<i32>> {
    Json(state.analyzer.available_seasons(state.now()))
}

pub async fn events(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Json<Vec<EventSummary>> {
    Json(state.analyzer.events_for_season(year).await)
}

pub async fn sessions() -> Json<Vec<SessionTypeOption>> {
    Json(Analyzer::session_types())
}

pub async fn drivers(
    State(state): State<AppState>,
    Path((year, event, session)): Path<(i32, String, String)>,
) -> Result<Json<Vec<SessionDriver>>, ApiError> {
    let kind: SessionKind = session.parse().map_err(bad_request)?;
    Ok(Json(
        state.analyzer.drivers_for_session(year, &event, kind).await,
    ))
}

pub async fn results(
    State(state): State<AppState>,
    Path((year, event, session)): Path<(i32, String, String)>,
) -> Result<Json<Vec<SessionResultEntry>>, ApiError> {
    let kind: SessionKind = session.parse().map_err(bad_request)?;
    Ok(Json(state.analyzer.session_results(year, &event, kind).await))
}

pub async fn form(
    State(state): State<AppState>,
    Query(params): Query<CountParams>,
) -> Json<Vec<FormEntry>> {
    let count = params
        .count
        .unwrap_or(state.analyzer.config().form_count);
    Json(state.analyzer.current_form(state.now(), count).await)
}

pub async fn track_rating(
    State(state): State<AppState>,
    Path(track): Path<String>,
    Query(params): Query<CountParams>,
) -> Json<Vec<TrackRatingEntry>> {
    let count = params
        .count
        .unwrap_or(state.analyzer.config().track_rating_count);
    Json(state.analyzer.track_rating(state.now(), &track, count).await)
}

pub async fn prediction(State(state): State<AppState>) -> Json<PredictionBlocks> {
    let now = state.now();
    let (_, next) = state.analyzer.last_and_next_race(now).await;
    Json(state.analyzer.prediction_blocks(now, next.as_ref()).await)
}
