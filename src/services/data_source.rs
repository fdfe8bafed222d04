//! Trait and types for reading Formula 1 data from an upstream provider.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::DataSourceError;

/// Position used in arithmetic when a driver has no classified rank.
pub const NOT_CLASSIFIED_POSITION: u32 = 99;

/// The on-track sessions that make up an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionKind {
    Race,
    Qualifying,
    Sprint,
    Practice1,
    Practice2,
    Practice3,
}

impl SessionKind {
    pub const ALL: [SessionKind; 6] = [
        SessionKind::Race,
        SessionKind::Qualifying,
        SessionKind::Sprint,
        SessionKind::Practice1,
        SessionKind::Practice2,
        SessionKind::Practice3,
    ];

    /// Short code used in URLs and on the command line.
    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Qualifying => "Q",
            SessionKind::Sprint => "S",
            SessionKind::Practice1 => "FP1",
            SessionKind::Practice2 => "FP2",
            SessionKind::Practice3 => "FP3",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionKind::Race => "Race",
            SessionKind::Qualifying => "Qualifying",
            SessionKind::Sprint => "Sprint",
            SessionKind::Practice1 => "Practice 1",
            SessionKind::Practice2 => "Practice 2",
            SessionKind::Practice3 => "Practice 3",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = DataSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SessionKind::ALL
            .into_iter()
            .find(|k| {
                k.code().eq_ignore_ascii_case(wanted) || k.display_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| DataSourceError::UnknownSession(wanted.to_string()))
    }
}

/// One event (race weekend) from a season schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub year: i32,
    pub round: u32,
    pub name: String,
    pub location: String,
    pub country: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
}

impl Event {
    /// Start of the main race, in UTC. Midnight when the provider has no time.
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date
            .and_time(self.time.unwrap_or(NaiveTime::MIN))
            .and_utc()
    }

    /// Case-insensitive substring match of `track` against the event name.
    pub fn matches_track(&self, track: &str) -> bool {
        self.name.to_lowercase().contains(&track.to_lowercase())
    }
}

/// One driver's classification in one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResultRow {
    /// Provider-side identifier, used to join lap and pit data.
    pub driver_id: String,
    pub code: String,
    pub full_name: String,
    pub number: String,
    pub team: String,
    /// `None` when the driver was not classified.
    pub position: Option<u32>,
    pub points: f64,
    pub status: String,
}

impl RaceResultRow {
    pub fn position_or_worst(&self) -> u32 {
        self.position.unwrap_or(NOT_CLASSIFIED_POSITION)
    }

    pub fn position_label(&self) -> String {
        match self.position {
            Some(p) => p.to_string(),
            None => "NC".to_string(),
        }
    }
}

/// A single lap time for one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapTiming {
    pub driver_id: String,
    pub lap: u32,
    pub position: Option<u32>,
    pub time_secs: f64,
}

/// A single pit stop for one driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PitStop {
    pub driver_id: String,
    pub lap: u32,
    pub stop: u32,
    pub duration_secs: Option<f64>,
}

/// Abstraction over an upstream motorsport data provider.
#[async_trait::async_trait]
pub trait MotorsportDataSource: Send + Sync {
    /// Returns every event of a season, ordered by round.
    async fn schedule(&self, year: i32) -> Result<Vec<Event>>;

    /// Returns the classification of one session, ordered by finishing position.
    async fn session_results(
        &self,
        year: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RaceResultRow>>;

    /// Returns every timed lap of a race.
    async fn laps(&self, year: i32, round: u32) -> Result<Vec<LapTiming>>;

    /// Returns every pit stop of a race.
    async fn pit_stops(&self, year: i32, round: u32) -> Result<Vec<PitStop>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> Event {
        Event {
            year: 2024,
            round: 8,
            name: name.to_string(),
            location: "Monte-Carlo".to_string(),
            country: "Monaco".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
            time: NaiveTime::from_hms_opt(13, 0, 0),
        }
    }

    #[test]
    fn test_session_kind_parses_codes_and_names() {
        assert_eq!("R".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("fp2".parse::<SessionKind>().unwrap(), SessionKind::Practice2);
        assert_eq!(
            "Qualifying".parse::<SessionKind>().unwrap(),
            SessionKind::Qualifying
        );
        assert!("warmup".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_event_matches_track_case_insensitive() {
        let e = event("Monaco Grand Prix");
        assert!(e.matches_track("monaco"));
        assert!(e.matches_track("GRAND"));
        assert!(!e.matches_track("Imola"));
    }

    #[test]
    fn test_event_starts_at_uses_race_time() {
        let e = event("Monaco Grand Prix");
        assert_eq!(e.starts_at().to_rfc3339(), "2024-05-26T13:00:00+00:00");

        let no_time = Event { time: None, ..e };
        assert_eq!(no_time.starts_at().to_rfc3339(), "2024-05-26T00:00:00+00:00");
    }

    #[test]
    fn test_unclassified_position_defaults() {
        let row = RaceResultRow {
            driver_id: "sargeant".to_string(),
            code: "SAR".to_string(),
            full_name: "Logan Sargeant".to_string(),
            number: "2".to_string(),
            team: "Williams".to_string(),
            position: None,
            points: 0.0,
            status: "Retired".to_string(),
        };
        assert_eq!(row.position_or_worst(), NOT_CLASSIFIED_POSITION);
        assert_eq!(row.position_label(), "NC");
    }
}
