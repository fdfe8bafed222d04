//! Data types produced by the aggregation pipeline.
//!
//! Everything here is plain serializable data: handed to the JSON API as-is
//! and rendered into HTML by the web layer.

use chrono::NaiveDate;
use serde::Serialize;

/// A driver's average points over the trailing window of races.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormEntry {
    pub driver: String,
    pub avg_points: f64,
    /// Races of the window the driver actually appeared in; always >= 1.
    pub races: usize,
}

/// Composite historical score of one driver at one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRatingEntry {
    pub driver: String,
    pub rating: f64,
    pub avg_points: f64,
    pub races: usize,
    #[serde(rename = "best_pos")]
    pub best_position: u32,
}

/// Winner of one past edition of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackHistoryEntry {
    pub year: i32,
    pub winner: String,
    pub winner_code: String,
    pub team: String,
    pub points: f64,
}

/// Everything the dashboard shows about the upcoming race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionBlocks {
    pub track_history: Vec<TrackHistoryEntry>,
    pub current_form: Vec<FormEntry>,
    pub track_rating: Vec<TrackRatingEntry>,
    pub expert_prediction: String,
    pub next_track_name: String,
}

/// Schedule entry as listed for a season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSummary {
    pub round: u32,
    pub name: String,
    pub location: String,
    pub country: String,
    /// `dd.mm.yyyy`
    pub date: String,
    pub full_date: NaiveDate,
}

/// Session type offered in selectors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionTypeOption {
    pub value: &'static str,
    pub name: &'static str,
}

/// One participant of a session, for driver pickers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDriver {
    pub abbreviation: String,
    pub name: String,
    pub team: String,
    pub number: String,
    pub position: u32,
}

/// One row of a session results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResultEntry {
    /// Rank, or `NC` when not classified.
    pub position: String,
    pub number: String,
    pub driver: String,
    pub team: String,
    pub points: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceWinner {
    pub name: String,
    pub abb: String,
    pub team: String,
}

/// Average finishing position of one driver at one track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPerformanceEntry {
    pub driver: String,
    pub avg_position: f64,
    /// Position per season, oldest first; `None` where the driver did not race.
    pub positions: Vec<Option<u32>>,
    pub years: Vec<i32>,
    /// Finished in the top three in one of the last two seasons.
    pub recent_podium: bool,
}

/// Lap times of one driver, keyed by driver code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverLaps {
    pub driver: String,
    pub finish_position: Option<u32>,
    /// `(lap number, lap time in seconds, running position)`
    pub laps: Vec<(u32, f64, Option<u32>)>,
}

/// Pit stops of one driver, keyed by driver code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverPitStops {
    pub driver: String,
    pub finish_position: Option<u32>,
    pub laps: Vec<u32>,
}
