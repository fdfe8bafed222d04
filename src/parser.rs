//! JSON parser for Ergast-compatible provider responses.
//!
//! Every endpoint wraps its payload in `MRData`, with paging metadata and a
//! `RaceTable.Races` array. Numbers arrive as strings.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::error::DataSourceError;
use crate::services::{Event, LapTiming, PitStop, RaceResultRow, SessionKind};

/// One page of a paged provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

impl<T> Page<T> {
    /// Offset of the next page, or `None` once `total` has been reached.
    pub fn next_offset(&self) -> Option<usize> {
        let next = self.offset + self.limit;
        (self.limit > 0 && next < self.total).then_some(next)
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "MRData")]
    mr_data: MrData,
}

#[derive(Deserialize)]
struct MrData {
    #[serde(default)]
    limit: String,
    #[serde(default)]
    offset: String,
    #[serde(default)]
    total: String,
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<WireRace>,
}

#[derive(Deserialize)]
struct WireRace {
    season: String,
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    #[serde(rename = "Circuit")]
    circuit: Option<WireCircuit>,
    date: String,
    time: Option<String>,
    #[serde(rename = "Results", default)]
    results: Vec<WireResult>,
    #[serde(rename = "SprintResults", default)]
    sprint_results: Vec<WireResult>,
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<WireQualifying>,
    #[serde(rename = "Laps", default)]
    laps: Vec<WireLap>,
    #[serde(rename = "PitStops", default)]
    pit_stops: Vec<WirePitStop>,
}

#[derive(Deserialize)]
struct WireCircuit {
    #[serde(rename = "Location")]
    location: Option<WireLocation>,
}

#[derive(Deserialize)]
struct WireLocation {
    #[serde(default)]
    locality: String,
    #[serde(default)]
    country: String,
}

#[derive(Deserialize)]
struct WireDriver {
    #[serde(rename = "driverId")]
    driver_id: String,
    code: Option<String>,
    #[serde(rename = "givenName", default)]
    given_name: String,
    #[serde(rename = "familyName", default)]
    family_name: String,
}

#[derive(Deserialize)]
struct WireConstructor {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct WireResult {
    #[serde(default)]
    number: String,
    position: Option<String>,
    #[serde(default)]
    points: String,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructor")]
    constructor: Option<WireConstructor>,
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct WireQualifying {
    #[serde(default)]
    number: String,
    position: Option<String>,
    #[serde(rename = "Driver")]
    driver: WireDriver,
    #[serde(rename = "Constructor")]
    constructor: Option<WireConstructor>,
    #[serde(rename = "Q2")]
    q2: Option<String>,
    #[serde(rename = "Q3")]
    q3: Option<String>,
}

#[derive(Deserialize)]
struct WireLap {
    number: String,
    #[serde(rename = "Timings", default)]
    timings: Vec<WireTiming>,
}

#[derive(Deserialize)]
struct WireTiming {
    #[serde(rename = "driverId")]
    driver_id: String,
    position: Option<String>,
    time: String,
}

#[derive(Deserialize)]
struct WirePitStop {
    #[serde(rename = "driverId")]
    driver_id: String,
    lap: String,
    stop: String,
    duration: Option<String>,
}

fn decode(bytes: &[u8]) -> Result<(MrData, Vec<WireRace>)> {
    let envelope: Envelope = serde_json::from_slice(bytes).map_err(DataSourceError::from)?;
    let mut mr_data = envelope.mr_data;
    let races = std::mem::take(&mut mr_data.race_table.races);
    Ok((mr_data, races))
}

fn page<T>(meta: &MrData, items: Vec<T>) -> Page<T> {
    let total = meta.total.parse().unwrap_or(items.len());
    Page {
        limit: meta.limit.parse().unwrap_or(total),
        offset: meta.offset.parse().unwrap_or(0),
        total,
        items,
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        DataSourceError::InvalidField {
            field,
            value: value.to_string(),
        }
        .into()
    })
}

/// Finishing order as reported. Retired drivers still carry a rank; only a
/// missing or non-numeric position is treated as not classified.
fn parse_position(position: Option<&str>) -> Option<u32> {
    position.and_then(|p| p.trim().parse().ok())
}

fn driver_code(driver: &WireDriver) -> String {
    match driver.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => driver
            .family_name
            .chars()
            .filter(|c| c.is_alphabetic())
            .take(3)
            .collect::<String>()
            .to_uppercase(),
    }
}

fn full_name(driver: &WireDriver) -> String {
    format!("{} {}", driver.given_name, driver.family_name)
        .trim()
        .to_string()
}

fn team_name(constructor: &Option<WireConstructor>) -> String {
    constructor
        .as_ref()
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

/// Parses a lap or stop duration such as `1:32.657` or `22.456` into seconds.
pub fn parse_lap_time(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for part in value.split(':') {
        let part: f64 = part.parse().ok()?;
        total = total * 60.0 + part;
    }
    total.is_finite().then_some(total)
}

/// Decodes a season schedule.
pub fn parse_schedule(bytes: &[u8]) -> Result<Page<Event>> {
    let (meta, races) = decode(bytes)?;
    let mut events = Vec::with_capacity(races.len());

    for race in races {
        let date = NaiveDate::parse_from_str(&race.date, "%Y-%m-%d").map_err(|_| {
            DataSourceError::InvalidField {
                field: "date",
                value: race.date.clone(),
            }
        })?;
        let time = race
            .time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t.trim_end_matches('Z'), "%H:%M:%S").ok());
        let location = race.circuit.and_then(|c| c.location);

        events.push(Event {
            year: parse_number("season", &race.season)?,
            round: parse_number("round", &race.round)?,
            name: race.race_name,
            location: location
                .as_ref()
                .map(|l| l.locality.clone())
                .unwrap_or_default(),
            country: location.map(|l| l.country).unwrap_or_default(),
            date,
            time,
        });
    }

    Ok(page(&meta, events))
}

/// Decodes a session classification. Qualifying rows carry zero points and
/// the last segment reached as their status.
pub fn parse_results(bytes: &[u8], kind: SessionKind) -> Result<Page<RaceResultRow>> {
    let (meta, races) = decode(bytes)?;
    let mut rows = Vec::new();

    for race in races {
        match kind {
            SessionKind::Qualifying => {
                for q in race.qualifying_results {
                    let status = if q.q3.is_some() {
                        "Q3"
                    } else if q.q2.is_some() {
                        "Q2"
                    } else {
                        "Q1"
                    };
                    rows.push(RaceResultRow {
                        code: driver_code(&q.driver),
                        full_name: full_name(&q.driver),
                        team: team_name(&q.constructor),
                        position: parse_position(q.position.as_deref()),
                        number: q.number,
                        points: 0.0,
                        status: status.to_string(),
                        driver_id: q.driver.driver_id,
                    });
                }
            }
            _ => {
                let results = if kind == SessionKind::Sprint {
                    race.sprint_results
                } else {
                    race.results
                };
                for r in results {
                    rows.push(RaceResultRow {
                        code: driver_code(&r.driver),
                        full_name: full_name(&r.driver),
                        team: team_name(&r.constructor),
                        position: parse_position(r.position.as_deref()),
                        number: r.number,
                        points: r.points.trim().parse().unwrap_or(0.0),
                        status: r.status,
                        driver_id: r.driver.driver_id,
                    });
                }
            }
        }
    }

    Ok(page(&meta, rows))
}

/// Decodes lap timings. Paging counts individual timings, not laps.
pub fn parse_laps(bytes: &[u8]) -> Result<Page<LapTiming>> {
    let (meta, races) = decode(bytes)?;
    let mut timings = Vec::new();

    for race in races {
        for lap in race.laps {
            let lap_number: u32 = parse_number("lap", &lap.number)?;
            for t in lap.timings {
                let Some(time_secs) = parse_lap_time(&t.time) else {
                    continue;
                };
                timings.push(LapTiming {
                    driver_id: t.driver_id,
                    lap: lap_number,
                    position: t.position.and_then(|p| p.trim().parse().ok()),
                    time_secs,
                });
            }
        }
    }

    Ok(page(&meta, timings))
}

/// Decodes pit stops.
pub fn parse_pit_stops(bytes: &[u8]) -> Result<Page<PitStop>> {
    let (meta, races) = decode(bytes)?;
    let mut stops = Vec::new();

    for race in races {
        for p in race.pit_stops {
            stops.push(PitStop {
                lap: parse_number("lap", &p.lap)?,
                stop: parse_number("stop", &p.stop)?,
                duration_secs: p.duration.as_deref().and_then(parse_lap_time),
                driver_id: p.driver_id,
            });
        }
    }

    Ok(page(&meta, stops))
}
