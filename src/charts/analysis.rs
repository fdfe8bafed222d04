//! Charts of the session analysis page.

use crate::analyzers::performance::quick_laps;
use crate::analyzers::types::DriverLaps;
use crate::charts::race::lines_chart;

/// Quick laps of the selected drivers. `None` when none of them has laps.
pub fn lap_pace_chart(laps: &[DriverLaps], selected: &[String]) -> Option<String> {
    let quick: Vec<DriverLaps> = laps
        .iter()
        .filter(|d| selected.iter().any(|s| s.eq_ignore_ascii_case(&d.driver)))
        .map(quick_laps)
        .filter(|d| !d.laps.is_empty())
        .collect();
    if quick.is_empty() {
        return None;
    }

    let drivers: Vec<&DriverLaps> = quick.iter().collect();
    Some(lines_chart(
        "Lap pace",
        &drivers,
        "Lap time (s)",
        |(_, secs, _)| Some(*secs),
        false,
        |_| 2.0,
    ))
}

/// Running position of every driver lap by lap, leader at the top.
pub fn position_changes_chart(laps: &[DriverLaps]) -> Option<String> {
    let drivers: Vec<&DriverLaps> = laps
        .iter()
        .filter(|d| d.laps.iter().any(|(_, _, pos)| pos.is_some()))
        .collect();
    if drivers.is_empty() {
        return None;
    }

    Some(lines_chart(
        "Position changes",
        &drivers,
        "Position",
        |(_, _, pos)| pos.map(f64::from),
        true,
        |_| 1.5,
    ))
}
