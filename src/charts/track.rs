use crate::analyzers::types::TrackPerformanceEntry;
use crate::charts::svg::{PODIUM_GOLD, Plot, color, ticks};

/// Worst position shown on the track performance axis.
const GRID_SIZE: f64 = 20.0;

/// Average position bars per driver, best position at the top. Drivers with
/// a recent podium at the track get a gold outline.
pub fn track_performance_chart(entries: &[TrackPerformanceEntry], track: &str) -> Option<String> {
    if entries.is_empty() {
        return None;
    }

    let worst = entries
        .iter()
        .map(|e| e.avg_position.ceil())
        .fold(GRID_SIZE, f64::max);
    let n = entries.len() as f64;

    let mut plot = Plot::new(
        &format!("Average position at {track}"),
        (-0.5, n - 0.5),
        (1.0, worst),
        true,
    );
    plot.axes("", "Average position", &[], &ticks(1.0, worst, 10));

    for (i, e) in entries.iter().enumerate() {
        let x = i as f64;
        let outline = e.recent_podium.then_some(PODIUM_GOLD);
        plot.rect((x - 0.35, worst), (x + 0.35, e.avg_position), color(i), outline);
        plot.text(x, e.avg_position - 0.6, "middle", &format!("{:.1}", e.avg_position));
        plot.text(x, worst + 0.6, "middle", &e.driver);
    }

    Some(plot.finish())
}
