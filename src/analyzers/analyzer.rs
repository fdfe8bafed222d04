use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analyzers::form::{MIN_COMPLETED_RACES, compute_form};
use crate::analyzers::performance::{
    chart_candidates, laps_by_driver, pit_stops_by_driver, track_performance,
};
use crate::analyzers::prediction::generate_prediction;
use crate::analyzers::schedule::{completed_events, find_by_track, last_event, next_event};
use crate::analyzers::track_rating::rate_drivers;
use crate::analyzers::types::{
    DriverLaps, DriverPitStops, EventSummary, FormEntry, PredictionBlocks, RaceWinner,
    SessionDriver, SessionResultEntry, SessionTypeOption, TrackHistoryEntry,
    TrackPerformanceEntry, TrackRatingEntry,
};
use crate::config::DashboardConfig;
use crate::error::DataSourceError;
use crate::services::{Event, MotorsportDataSource, RaceResultRow, SessionKind};

/// Shown in place of a prediction when no race is scheduled.
pub const WAITING_FOR_SEASON: &str = "Waiting for the season to start";

/// Placeholder track name when no race is scheduled.
pub const NEXT_RACE_PLACEHOLDER: &str = "Next race";

/// Seasons shown on the track performance chart.
const PERFORMANCE_SEASONS: i32 = 4;

/// Drivers shown on the track performance chart from the track rating.
pub const PERFORMANCE_RATING_COUNT: usize = 6;

/// Fetches provider data and runs the aggregations on it.
///
/// Every public operation degrades instead of failing: a provider error for
/// one season or race is logged and that item is skipped, and a total
/// failure yields an empty result.
pub struct Analyzer {
    source: Arc<dyn MotorsportDataSource>,
    config: DashboardConfig,
}

impl Analyzer {
    pub fn new(source: Arc<dyn MotorsportDataSource>, config: DashboardConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Most recently completed and next upcoming race, as of `now`.
    #[tracing::instrument(skip(self))]
    pub async fn last_and_next_race(&self, now: DateTime<Utc>) -> (Option<Event>, Option<Event>) {
        let year = now.year();
        let current = match self.source.schedule(year).await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(year, error = %e, "Failed to load schedule");
                return (None, None);
            }
        };

        let previous = if completed_events(&current, now).is_empty() {
            match self.source.schedule(year - 1).await {
                Ok(schedule) => Some(schedule),
                Err(e) => {
                    warn!(year = year - 1, error = %e, "Failed to load previous schedule");
                    None
                }
            }
        } else {
            None
        };

        let last = last_event(&current, previous.as_deref(), now).cloned();
        let next = next_event(&current, now).cloned();
        (last, next)
    }

    /// Seasons selectable in the analysis form, oldest first.
    pub fn available_seasons(&self, now: DateTime<Utc>) -> Vec<i32> {
        (self.config.first_season..=now.year()).collect()
    }

    pub async fn events_for_season(&self, year: i32) -> Vec<EventSummary> {
        match self.source.schedule(year).await {
            Ok(schedule) => schedule
                .into_iter()
                .map(|e| EventSummary {
                    round: e.round,
                    date: e.date.format("%d.%m.%Y").to_string(),
                    full_date: e.date,
                    name: e.name,
                    location: e.location,
                    country: e.country,
                })
                .collect(),
            Err(e) => {
                warn!(year, error = %e, "Failed to load events");
                Vec::new()
            }
        }
    }

    pub fn session_types() -> Vec<SessionTypeOption> {
        SessionKind::ALL
            .iter()
            .map(|k| SessionTypeOption {
                value: k.code(),
                name: k.display_name(),
            })
            .collect()
    }

    /// Resolves an event by name: exact match first, then the first event
    /// whose name contains `name`.
    async fn find_event(&self, year: i32, name: &str) -> Result<Event> {
        let schedule = self.source.schedule(year).await?;
        schedule
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .or_else(|| find_by_track(&schedule, name))
            .cloned()
            .ok_or_else(|| {
                DataSourceError::UnknownEvent {
                    year,
                    name: name.to_string(),
                }
                .into()
            })
    }

    async fn event_results(
        &self,
        year: i32,
        event_name: &str,
        kind: SessionKind,
    ) -> Result<(Event, Vec<RaceResultRow>)> {
        let event = self.find_event(year, event_name).await?;
        let rows = self
            .source
            .session_results(year, event.round, kind)
            .await?;
        Ok((event, rows))
    }

    /// Participants of a session, best position first. Unclassified drivers
    /// sort last.
    pub async fn drivers_for_session(
        &self,
        year: i32,
        event_name: &str,
        kind: SessionKind,
    ) -> Vec<SessionDriver> {
        let rows = match self.event_results(year, event_name, kind).await {
            Ok((_, rows)) => rows,
            Err(e) => {
                warn!(year, event = event_name, session = %kind, error = %e, "Failed to load drivers");
                return Vec::new();
            }
        };

        let mut drivers: Vec<SessionDriver> = rows
            .into_iter()
            .map(|r| SessionDriver {
                position: r.position_or_worst(),
                abbreviation: r.code,
                name: r.full_name,
                team: r.team,
                number: r.number,
            })
            .collect();
        drivers.sort_by_key(|d| d.position);
        drivers
    }

    /// Results table of one session.
    pub async fn session_results(
        &self,
        year: i32,
        event_name: &str,
        kind: SessionKind,
    ) -> Vec<SessionResultEntry> {
        match self.event_results(year, event_name, kind).await {
            Ok((_, rows)) => rows
                .into_iter()
                .map(|r| SessionResultEntry {
                    position: r.position_label(),
                    number: r.number,
                    driver: r.code,
                    team: r.team,
                    points: r.points,
                    status: r.status,
                })
                .collect(),
            Err(e) => {
                warn!(year, event = event_name, session = %kind, error = %e, "Failed to load results");
                Vec::new()
            }
        }
    }

    pub async fn last_race_winner(&self, event: &Event) -> Option<RaceWinner> {
        match self
            .source
            .session_results(event.year, event.round, SessionKind::Race)
            .await
        {
            Ok(rows) => rows.into_iter().next().map(|w| RaceWinner {
                name: w.full_name,
                abb: w.code,
                team: w.team,
            }),
            Err(e) => {
                warn!(event = %event.name, error = %e, "Failed to load race winner");
                None
            }
        }
    }

    /// Average points over the last `form_window` completed races of the
    /// current season. Empty before the second race has been run.
    #[tracing::instrument(skip(self))]
    pub async fn current_form(&self, now: DateTime<Utc>, count: usize) -> Vec<FormEntry> {
        let year = now.year();
        let schedule = match self.source.schedule(year).await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!(year, error = %e, "Failed to compute current form");
                return Vec::new();
            }
        };

        let completed = completed_events(&schedule, now);
        if completed.len() < MIN_COMPLETED_RACES {
            debug!(completed = completed.len(), "Not enough races for form");
            return Vec::new();
        }

        let window_start = completed.len().saturating_sub(self.config.form_window);
        let mut races = Vec::new();
        for event in &completed[window_start..] {
            match self
                .source
                .session_results(year, event.round, SessionKind::Race)
                .await
            {
                Ok(rows) => races.push(rows),
                Err(e) => {
                    warn!(event = %event.name, error = %e, "Skipping race in form window");
                }
            }
        }

        compute_form(&races, count)
    }

    /// Race classification of the first event matching `track` in `year`.
    /// `Ok(None)` when the season has no such event.
    async fn track_race_results(
        &self,
        year: i32,
        track: &str,
    ) -> Result<Option<Vec<RaceResultRow>>> {
        let schedule = self.source.schedule(year).await?;
        let Some(event) = find_by_track(&schedule, track) else {
            debug!(year, track, "No event at track");
            return Ok(None);
        };
        let rows = self
            .source
            .session_results(year, event.round, SessionKind::Race)
            .await?;
        Ok(Some(rows))
    }

    /// Race classifications at `track` for each of the `years_back` seasons
    /// before the current one, oldest first. Seasons that fail to load or
    /// have no such event are absent.
    async fn track_seasons(
        &self,
        now: DateTime<Utc>,
        track: &str,
        years_back: i32,
    ) -> Vec<(i32, Option<Vec<RaceResultRow>>)> {
        let current = now.year();
        let mut seasons = Vec::new();
        for year in (current - years_back)..current {
            match self.track_race_results(year, track).await {
                Ok(rows) => seasons.push((year, rows)),
                Err(e) => {
                    warn!(year, track, error = %e, "Skipping season in track analysis");
                    seasons.push((year, None));
                }
            }
        }
        seasons
    }

    /// Composite rating of drivers at `track` over the configured lookback.
    #[tracing::instrument(skip(self))]
    pub async fn track_rating(
        &self,
        now: DateTime<Utc>,
        track: &str,
        count: usize,
    ) -> Vec<TrackRatingEntry> {
        let races: Vec<Vec<RaceResultRow>> = self
            .track_seasons(now, track, self.config.track_lookback_years)
            .await
            .into_iter()
            .filter_map(|(_, rows)| rows)
            .collect();

        rate_drivers(&races, count)
    }

    /// Winners at `track` over the `years_back` seasons before the current one.
    #[tracing::instrument(skip(self))]
    pub async fn track_history(
        &self,
        now: DateTime<Utc>,
        track: &str,
        years_back: i32,
    ) -> Vec<TrackHistoryEntry> {
        self.track_seasons(now, track, years_back)
            .await
            .into_iter()
            .filter_map(|(year, rows)| {
                let winner = rows?.into_iter().next()?;
                Some(TrackHistoryEntry {
                    year,
                    winner: winner.full_name,
                    winner_code: winner.code,
                    team: winner.team,
                    points: winner.points,
                })
            })
            .collect()
    }

    /// History, form, rating and prediction for the next race.
    #[tracing::instrument(skip_all)]
    pub async fn prediction_blocks(
        &self,
        now: DateTime<Utc>,
        next_race: Option<&Event>,
    ) -> PredictionBlocks {
        let Some(next) = next_race else {
            return PredictionBlocks {
                track_history: Vec::new(),
                current_form: Vec::new(),
                track_rating: Vec::new(),
                expert_prediction: WAITING_FOR_SEASON.to_string(),
                next_track_name: NEXT_RACE_PLACEHOLDER.to_string(),
            };
        };

        let track = next.name.as_str();
        let track_history = self
            .track_history(now, track, self.config.history_years)
            .await;
        let current_form = self.current_form(now, self.config.form_count).await;
        let track_rating = self
            .track_rating(now, track, self.config.track_rating_count)
            .await;
        let expert_prediction = generate_prediction(Some(next), &track_history, &current_form);

        info!(
            history = track_history.len(),
            form = current_form.len(),
            rating = track_rating.len(),
            "Prediction blocks ready"
        );

        PredictionBlocks {
            track_history,
            current_form,
            track_rating,
            expert_prediction,
            next_track_name: next.name.clone(),
        }
    }

    /// Average positions at `track` over recent seasons for the drivers most
    /// relevant to the next race.
    ///
    /// `rating` and `form` are the already computed blocks for that race, as
    /// returned by [`Analyzer::prediction_blocks`]; only the top
    /// [`PERFORMANCE_RATING_COUNT`] rated drivers are charted.
    #[tracing::instrument(skip(self, rating, form))]
    pub async fn track_performance(
        &self,
        now: DateTime<Utc>,
        track: &str,
        rating: &[TrackRatingEntry],
        form: &[FormEntry],
    ) -> Vec<TrackPerformanceEntry> {
        let rating = &rating[..rating.len().min(PERFORMANCE_RATING_COUNT)];
        let seasons = self.track_seasons(now, track, PERFORMANCE_SEASONS).await;

        let recent_podiums: Vec<String> = seasons
            .iter()
            .rev()
            .take(2)
            .filter_map(|(_, rows)| rows.as_ref())
            .flat_map(|rows| rows.iter().take(3).map(|r| r.code.clone()))
            .collect();

        let candidates = chart_candidates(rating, form, &recent_podiums);
        track_performance(&seasons, &candidates)
    }

    /// Lap times of every finisher of a race, best finisher first.
    pub async fn race_laps(&self, year: i32, event_name: &str) -> Vec<DriverLaps> {
        let result = async {
            let (event, rows) = self
                .event_results(year, event_name, SessionKind::Race)
                .await?;
            let timings = self.source.laps(year, event.round).await?;
            anyhow::Ok(laps_by_driver(&rows, &timings))
        };
        result.await.unwrap_or_else(|e| {
            warn!(year, event = event_name, error = %e, "Failed to load lap times");
            Vec::new()
        })
    }

    /// Pit stops of every driver of a race, best finisher first.
    pub async fn race_pit_stops(&self, year: i32, event_name: &str) -> Vec<DriverPitStops> {
        let result = async {
            let (event, rows) = self
                .event_results(year, event_name, SessionKind::Race)
                .await?;
            let stops = self.source.pit_stops(year, event.round).await?;
            anyhow::Ok(pit_stops_by_driver(&rows, &stops))
        };
        result.await.unwrap_or_else(|e| {
            warn!(year, event = event_name, error = %e, "Failed to load pit stops");
            Vec::new()
        })
    }
}
