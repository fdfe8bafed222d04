//! Picking events out of season schedules by date or by name.

use chrono::{DateTime, Utc};

use crate::services::Event;

/// Events of `schedule` that started before `now`, in schedule order.
pub fn completed_events(schedule: &[Event], now: DateTime<Utc>) -> Vec<&Event> {
    schedule.iter().filter(|e| e.starts_at() < now).collect()
}

/// First event that has not started yet.
pub fn next_event(schedule: &[Event], now: DateTime<Utc>) -> Option<&Event> {
    schedule.iter().find(|e| e.starts_at() >= now)
}

/// Most recently completed event of `current`, falling back to the final
/// event of `previous` when the current season has not started.
pub fn last_event<'a>(
    current: &'a [Event],
    previous: Option<&'a [Event]>,
    now: DateTime<Utc>,
) -> Option<&'a Event> {
    current
        .iter()
        .filter(|e| e.starts_at() < now)
        .last()
        .or_else(|| previous.and_then(|p| p.last()))
}

/// First event whose name contains `track`, ignoring case.
pub fn find_by_track<'a>(schedule: &'a [Event], track: &str) -> Option<&'a Event> {
    schedule.iter().find(|e| e.matches_track(track))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    pub fn event(year: i32, round: u32, name: &str, month: u32, day: u32) -> Event {
        Event {
            year,
            round,
            name: name.to_string(),
            location: String::new(),
            country: String::new(),
            date: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
            time: None,
        }
    }

    fn season_2025() -> Vec<Event> {
        vec![
            event(2025, 1, "Australian Grand Prix", 3, 16),
            event(2025, 2, "Chinese Grand Prix", 3, 23),
            event(2025, 3, "Japanese Grand Prix", 4, 6),
        ]
    }

    fn at(month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_mid_season() {
        let season = season_2025();
        let now = at(3, 30);

        assert_eq!(completed_events(&season, now).len(), 2);
        assert_eq!(last_event(&season, None, now).unwrap().round, 2);
        assert_eq!(next_event(&season, now).unwrap().round, 3);
    }

    #[test]
    fn test_race_day_counts_as_completed_after_start() {
        let season = season_2025();
        // event dates without a time start at midnight UTC
        let now = at(3, 16);

        assert_eq!(last_event(&season, None, now).unwrap().round, 1);
        assert_eq!(next_event(&season, now).unwrap().round, 2);
    }

    #[test]
    fn test_preseason_falls_back_to_previous_year() {
        let season = season_2025();
        let previous = vec![
            event(2024, 23, "Qatar Grand Prix", 12, 1),
            event(2024, 24, "Abu Dhabi Grand Prix", 12, 8),
        ];
        let now = at(2, 1);

        let last = last_event(&season, Some(&previous), now).unwrap();
        assert_eq!(last.name, "Abu Dhabi Grand Prix");
        assert_eq!(next_event(&season, now).unwrap().round, 1);
        assert!(completed_events(&season, now).is_empty());
    }

    #[test]
    fn test_season_over_has_no_next_event() {
        let season = season_2025();
        let now = at(12, 31);

        assert!(next_event(&season, now).is_none());
        assert_eq!(last_event(&season, None, now).unwrap().round, 3);
    }

    #[test]
    fn test_empty_schedules() {
        let now = at(6, 1);
        assert!(last_event(&[], Some(&[]), now).is_none());
        assert!(next_event(&[], now).is_none());
    }

    #[test]
    fn test_find_by_track_first_match() {
        let season = season_2025();
        assert_eq!(find_by_track(&season, "grand prix").unwrap().round, 1);
        assert_eq!(find_by_track(&season, "JAPAN").unwrap().round, 3);
        assert!(find_by_track(&season, "Monza").is_none());
    }
}
