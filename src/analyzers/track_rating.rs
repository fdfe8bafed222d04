use crate::analyzers::types::TrackRatingEntry;
use crate::analyzers::utility::{mean, round1, stddev};
use crate::services::{NOT_CLASSIFIED_POSITION, RaceResultRow};

/// Upper bound of the consistency term.
pub const MAX_CONSISTENCY_BONUS: f64 = 5.0;

/// Bonus for the best result ever achieved at the track.
pub fn position_bonus(best_position: u32) -> f64 {
    (20.0 - best_position as f64) * 0.5
}

/// `min(5, 10 / stddev)` for two or more positions, else 0.
///
/// Identical positions have zero spread and earn the full bonus.
pub fn consistency_bonus(positions: &[u32]) -> f64 {
    if positions.len() < 2 {
        return 0.0;
    }
    let values: Vec<f64> = positions.iter().map(|&p| p as f64).collect();
    let sd = stddev(&values, mean(&values));
    if sd == 0.0 {
        return MAX_CONSISTENCY_BONUS;
    }
    (10.0 / sd).min(MAX_CONSISTENCY_BONUS)
}

/// `average_points + position_bonus + consistency_bonus`, unrounded.
pub fn rating(avg_points: f64, best_position: u32, positions: &[u32]) -> f64 {
    avg_points + position_bonus(best_position) + consistency_bonus(positions)
}

#[derive(Default)]
struct DriverTrackStats<'a> {
    code: &'a str,
    total_points: f64,
    races: usize,
    best_position: u32,
    positions: Vec<u32>,
}

/// Rates every driver that appears in `races`, one classification per past
/// edition of the event.
///
/// Sorted by rounded rating, descending. Drivers with equal ratings keep the
/// order in which they were first seen.
pub fn rate_drivers(races: &[Vec<RaceResultRow>], count: usize) -> Vec<TrackRatingEntry> {
    let mut stats: Vec<DriverTrackStats> = Vec::new();

    for row in races.iter().flatten() {
        let idx = match stats.iter().position(|s| s.code == row.code) {
            Some(idx) => idx,
            None => {
                stats.push(DriverTrackStats {
                    code: &row.code,
                    best_position: NOT_CLASSIFIED_POSITION,
                    ..Default::default()
                });
                stats.len() - 1
            }
        };

        let position = row.position_or_worst();
        let s = &mut stats[idx];
        s.total_points += row.points;
        s.races += 1;
        s.positions.push(position);
        s.best_position = s.best_position.min(position);
    }

    let mut entries: Vec<TrackRatingEntry> = stats
        .into_iter()
        .filter(|s| s.races >= 1)
        .map(|s| {
            let avg_points = s.total_points / s.races as f64;
            let best_position = s.best_position.max(1);
            TrackRatingEntry {
                driver: s.code.to_string(),
                rating: round1(rating(avg_points, best_position, &s.positions)),
                avg_points: round1(avg_points),
                races: s.races,
                best_position,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    entries.truncate(count);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::form::tests::row;
    use proptest::prelude::*;

    #[test]
    fn test_reference_rating() {
        let races = vec![
            vec![row("VER", "Red Bull", 1, 25.0)],
            vec![row("VER", "Red Bull", 2, 18.0)],
        ];

        let ratings = rate_drivers(&races, 8);
        let ver = &ratings[0];

        assert_eq!(ver.driver, "VER");
        assert_eq!(ver.avg_points, 21.5);
        assert_eq!(ver.best_position, 1);
        assert_eq!(ver.races, 2);
        assert_eq!(position_bonus(1), 9.5);
        assert_eq!(consistency_bonus(&[1, 2]), 5.0);
        assert_eq!(ver.rating, 36.0);
    }

    #[test]
    fn test_single_race_has_no_consistency_bonus() {
        let ratings = rate_drivers(&[vec![row("HAM", "Mercedes", 3, 15.0)]], 8);
        assert_eq!(ratings[0].rating, 15.0 + 8.5);
    }

    #[test]
    fn test_scattered_positions_earn_small_bonus() {
        // stddev of [1, 19] is 9, so the bonus is 10 / 9
        assert!((consistency_bonus(&[1, 19]) - 10.0 / 9.0).abs() < 1e-12);
        assert_eq!(consistency_bonus(&[4, 4, 4]), MAX_CONSISTENCY_BONUS);
    }

    #[test]
    fn test_unclassified_counts_as_worst_position() {
        let mut dnf = row("ZHO", "Sauber", 1, 0.0);
        dnf.position = None;

        let ratings = rate_drivers(&[vec![dnf]], 8);
        assert_eq!(ratings[0].best_position, NOT_CLASSIFIED_POSITION);
        assert_eq!(ratings[0].rating, round1(position_bonus(NOT_CLASSIFIED_POSITION)));
    }

    #[test]
    fn test_sorted_and_truncated() {
        let race: Vec<_> = (1..=10)
            .map(|p| row(&format!("D{p:02}"), "Team", p, (11 - p) as f64))
            .collect();

        let ratings = rate_drivers(&[race], 3);

        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[0].driver, "D01");
        assert!(ratings[0].rating >= ratings[1].rating);
        assert!(ratings[1].rating >= ratings[2].rating);
    }

    #[test]
    fn test_no_races_no_ratings() {
        assert!(rate_drivers(&[], 8).is_empty());
        assert!(rate_drivers(&[vec![], vec![]], 8).is_empty());
    }

    proptest! {
        #[test]
        fn prop_consistency_bonus_bounded(positions in prop::collection::vec(1u32..=25, 0..8)) {
            let bonus = consistency_bonus(&positions);
            prop_assert!((0.0..=MAX_CONSISTENCY_BONUS).contains(&bonus));
        }

        #[test]
        fn prop_better_best_position_never_lowers_rating(
            avg in 0.0f64..26.0,
            best in 2u32..=20,
            positions in prop::collection::vec(1u32..=20, 0..6),
        ) {
            let worse = rating(avg, best, &positions);
            let better = rating(avg, best - 1, &positions);
            prop_assert!(better >= worse);
        }

        #[test]
        fn prop_more_points_never_lowers_rating(
            avg in 0.0f64..26.0,
            extra in 0.0f64..10.0,
            best in 1u32..=20,
            positions in prop::collection::vec(1u32..=20, 0..6),
        ) {
            prop_assert!(rating(avg + extra, best, &positions) >= rating(avg, best, &positions));
        }
    }
}
