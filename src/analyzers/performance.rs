//! Per-driver series feeding the charts: positions at a track across seasons,
//! lap times and pit stops joined to driver codes.

use std::collections::HashMap;

use crate::analyzers::types::{
    DriverLaps, DriverPitStops, FormEntry, TrackPerformanceEntry, TrackRatingEntry,
};
use crate::analyzers::utility::mean;
use crate::services::{LapTiming, PitStop, RaceResultRow};

/// Most drivers shown on the track performance chart.
pub const MAX_CHART_DRIVERS: usize = 10;

/// Laps slower than this multiple of a driver's fastest lap are not "quick".
pub const QUICK_LAP_THRESHOLD: f64 = 1.07;

/// Drivers worth charting at a track: rated drivers, the four in best form,
/// then recent podium finishers. Deduplicated, first occurrence wins.
pub fn chart_candidates(
    rating: &[TrackRatingEntry],
    form: &[FormEntry],
    recent_podiums: &[String],
) -> Vec<String> {
    let mut drivers: Vec<String> = Vec::new();
    let ordered = rating
        .iter()
        .map(|r| &r.driver)
        .chain(form.iter().take(4).map(|f| &f.driver))
        .chain(recent_podiums.iter());

    for code in ordered {
        if !drivers.contains(code) {
            drivers.push(code.clone());
        }
    }
    drivers.truncate(MAX_CHART_DRIVERS);
    drivers
}

/// Average finishing position of each candidate across `seasons`.
///
/// `seasons` is oldest first; `None` marks a season where the event could not
/// be loaded. Drivers with no position in any season are dropped. Sorted by
/// average position, best first.
pub fn track_performance(
    seasons: &[(i32, Option<Vec<RaceResultRow>>)],
    candidates: &[String],
) -> Vec<TrackPerformanceEntry> {
    let years: Vec<i32> = seasons.iter().map(|(year, _)| *year).collect();

    let mut entries: Vec<TrackPerformanceEntry> = candidates
        .iter()
        .filter_map(|driver| {
            let positions: Vec<Option<u32>> = seasons
                .iter()
                .map(|(_, rows)| {
                    rows.as_ref()?
                        .iter()
                        .find(|r| &r.code == driver)
                        .map(|r| r.position_or_worst())
                })
                .collect();

            let valid: Vec<f64> = positions.iter().flatten().map(|&p| p as f64).collect();
            if valid.is_empty() {
                return None;
            }

            let recent_podium = positions
                .iter()
                .rev()
                .take(2)
                .flatten()
                .any(|&p| p <= 3);

            Some(TrackPerformanceEntry {
                driver: driver.clone(),
                avg_position: mean(&valid),
                positions,
                years: years.clone(),
                recent_podium,
            })
        })
        .collect();

    entries.sort_by(|a, b| a.avg_position.total_cmp(&b.avg_position));
    entries
}

/// Groups lap timings by driver, ordered by finishing position.
///
/// Timings of drivers missing from `results` are dropped, since they cannot
/// be mapped to a driver code.
pub fn laps_by_driver(results: &[RaceResultRow], timings: &[LapTiming]) -> Vec<DriverLaps> {
    let mut grouped: HashMap<&str, Vec<(u32, f64, Option<u32>)>> = HashMap::new();
    for t in timings {
        grouped
            .entry(t.driver_id.as_str())
            .or_default()
            .push((t.lap, t.time_secs, t.position));
    }

    results
        .iter()
        .filter_map(|r| {
            let mut laps = grouped.remove(r.driver_id.as_str())?;
            laps.sort_by_key(|(lap, _, _)| *lap);
            Some(DriverLaps {
                driver: r.code.clone(),
                finish_position: r.position,
                laps,
            })
        })
        .collect()
}

/// Groups pit stops by driver, ordered by finishing position. Drivers who
/// never stopped are omitted.
pub fn pit_stops_by_driver(results: &[RaceResultRow], stops: &[PitStop]) -> Vec<DriverPitStops> {
    results
        .iter()
        .filter_map(|r| {
            let mut laps: Vec<u32> = stops
                .iter()
                .filter(|s| s.driver_id == r.driver_id)
                .map(|s| s.lap)
                .collect();
            if laps.is_empty() {
                return None;
            }
            laps.sort_unstable();
            Some(DriverPitStops {
                driver: r.code.clone(),
                finish_position: r.position,
                laps,
            })
        })
        .collect()
}

/// Keeps only laps within [`QUICK_LAP_THRESHOLD`] of the driver's fastest.
pub fn quick_laps(driver: &DriverLaps) -> DriverLaps {
    let fastest = driver
        .laps
        .iter()
        .map(|(_, t, _)| *t)
        .fold(f64::INFINITY, f64::min);
    let cutoff = fastest * QUICK_LAP_THRESHOLD;

    DriverLaps {
        driver: driver.driver.clone(),
        finish_position: driver.finish_position,
        laps: driver
            .laps
            .iter()
            .copied()
            .filter(|(_, t, _)| *t <= cutoff)
            .collect(),
    }
}
