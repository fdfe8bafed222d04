//! Charts of the last race on the dashboard.

use crate::analyzers::types::{DriverLaps, DriverPitStops};
use crate::charts::svg::{PODIUM_GOLD, Plot, color, ticks};

/// Drivers shown on the pit-stop chart.
pub const PIT_CHART_DRIVERS: usize = 8;

/// Drivers shown on the lap-time chart without counting the podium.
pub const LAP_CHART_TOP: usize = 6;
pub const LAP_CHART_MAX: usize = 8;

fn is_podium(finish_position: Option<u32>) -> bool {
    matches!(finish_position, Some(p) if p <= 3)
}

/// Pit laps of the top finishers, one row per driver. Podium finishers get
/// diamond markers and a starred label.
pub fn pit_stop_chart(stops: &[DriverPitStops], race_name: &str) -> Option<String> {
    let drivers: Vec<&DriverPitStops> = stops.iter().take(PIT_CHART_DRIVERS).collect();
    if drivers.is_empty() {
        return None;
    }

    let max_lap = drivers
        .iter()
        .flat_map(|d| d.laps.iter().copied())
        .max()
        .unwrap_or(1) as f64;
    let rows = drivers.len() as f64;

    let mut plot = Plot::new(
        &format!("Pit stop strategy: {race_name}"),
        (0.0, max_lap + 1.0),
        (-0.5, rows - 0.5),
        true,
    );
    plot.axes("Lap", "", &ticks(0.0, max_lap + 1.0, 10), &[]);

    for (i, d) in drivers.iter().enumerate() {
        let row = i as f64;
        let podium = is_podium(d.finish_position);
        let label = if podium {
            format!("{} *", d.driver)
        } else {
            d.driver.clone()
        };
        plot.text(0.0, row, "end", &label);

        let c = if podium { PODIUM_GOLD } else { color(i) };
        for &lap in &d.laps {
            if podium {
                plot.diamond(lap as f64, row, 7.0, c);
            } else {
                plot.circle(lap as f64, row, 5.0, c);
            }
        }
    }

    Some(plot.finish())
}

/// Lap-time lines for the top finishers plus the podium.
pub fn lap_time_chart(laps: &[DriverLaps], race_name: &str) -> Option<String> {
    let drivers: Vec<&DriverLaps> = laps
        .iter()
        .enumerate()
        .filter(|(i, d)| *i < LAP_CHART_TOP || is_podium(d.finish_position))
        .map(|(_, d)| d)
        .filter(|d| !d.laps.is_empty())
        .take(LAP_CHART_MAX)
        .collect();
    if drivers.is_empty() {
        return None;
    }

    Some(lines_chart(
        &format!("Lap times: {race_name}"),
        &drivers,
        "Lap time (s)",
        |(_, secs, _)| Some(*secs),
        false,
        |d| if is_podium(d.finish_position) { 3.0 } else { 1.5 },
    ))
}

/// One line per driver with `value` extracted from each lap. Used by both
/// the race and the analysis charts.
pub(crate) fn lines_chart(
    title: &str,
    drivers: &[&DriverLaps],
    y_label: &str,
    value: impl Fn(&(u32, f64, Option<u32>)) -> Option<f64>,
    invert_y: bool,
    width: impl Fn(&DriverLaps) -> f64,
) -> String {
    let series: Vec<Vec<(f64, f64)>> = drivers
        .iter()
        .map(|d| {
            d.laps
                .iter()
                .filter_map(|lap| value(lap).map(|v| (lap.0 as f64, v)))
                .collect()
        })
        .collect();

    let all = series.iter().flatten();
    let max_lap = all.clone().map(|(x, _)| *x).fold(1.0, f64::max);
    let y_min = all.clone().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let y_max = all.map(|(_, y)| *y).fold(f64::NEG_INFINITY, f64::max);
    let (y_min, y_max) = if y_min.is_finite() {
        (y_min.floor(), y_max.ceil())
    } else {
        (0.0, 1.0)
    };

    let mut plot = Plot::new(title, (1.0, max_lap), (y_min, y_max), invert_y);
    plot.axes("Lap", y_label, &ticks(1.0, max_lap, 10), &ticks(y_min, y_max, 8));

    for (i, (d, points)) in drivers.iter().zip(&series).enumerate() {
        let c = color(i);
        plot.polyline(points, c, width(*d));
        plot.legend_entry(&d.driver, c);
    }

    plot.finish()
}
