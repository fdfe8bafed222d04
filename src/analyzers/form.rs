use crate::analyzers::types::FormEntry;
use crate::analyzers::utility::{mean, round1};
use crate::services::RaceResultRow;

/// Fewest completed races needed before form is meaningful.
pub const MIN_COMPLETED_RACES: usize = 2;

/// Ranks drivers by average points over `races`.
///
/// Each element of `races` is the classification of one race; races without
/// rows are ignored. A driver's average only covers the races they appear in.
/// Output is sorted by rounded average, descending; equal averages keep the
/// order in which drivers were first seen.
pub fn compute_form(races: &[Vec<RaceResultRow>], count: usize) -> Vec<FormEntry> {
    let mut series: Vec<(&str, Vec<f64>)> = Vec::new();

    for race in races.iter().filter(|r| !r.is_empty()) {
        for row in race {
            match series.iter_mut().find(|(code, _)| *code == row.code.as_str()) {
                Some((_, points)) => points.push(row.points),
                None => series.push((row.code.as_str(), vec![row.points])),
            }
        }
    }

    let mut entries: Vec<FormEntry> = series
        .into_iter()
        .map(|(code, points)| FormEntry {
            driver: code.to_string(),
            avg_points: round1(mean(&points)),
            races: points.len(),
        })
        .collect();

    entries.sort_by(|a, b| b.avg_points.total_cmp(&a.avg_points));
    entries.truncate(count);
    entries
}
