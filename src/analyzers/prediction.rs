use std::collections::BTreeMap;

use crate::analyzers::types::{FormEntry, TrackHistoryEntry};
use crate::services::Event;

/// Shown when there is no upcoming race or no history to reason about.
pub const SEASON_NOT_STARTED: &str =
    "The season has not started yet, gathering data for the prediction";

/// Shown when history exists but points to no favourite.
pub const NO_CLEAR_FAVOURITE: &str = "No clear favourite for this race";

/// Minimum wins for a team to count as dominant at a track.
const DOMINANT_TEAM_WINS: usize = 2;

/// Team with the most wins in `history`. Equal counts go to the team whose
/// name sorts first.
pub fn dominant_team(history: &[TrackHistoryEntry]) -> Option<(&str, usize)> {
    let mut wins: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in history {
        *wins.entry(entry.team.as_str()).or_default() += 1;
    }

    // BTreeMap iterates alphabetically; keep the first of equal maxima
    wins.into_iter()
        .fold(None, |best, (team, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((team, count)),
        })
}

/// Builds the short favourites summary for the next race.
///
/// `history` is oldest first, so its last two entries are the most recent
/// editions. Sentences are joined with ". " and end with a period.
pub fn generate_prediction(
    next_race: Option<&Event>,
    history: &[TrackHistoryEntry],
    form: &[FormEntry],
) -> String {
    if next_race.is_none() || history.is_empty() {
        return SEASON_NOT_STARTED.to_string();
    }

    let mut sentences = Vec::new();

    if let [.., previous, latest] = history {
        if previous.winner_code == latest.winner_code {
            sentences.push(format!(
                "{} has a strong record at this track",
                latest.winner_code
            ));
        }
    }

    if let Some((team, wins)) = dominant_team(history) {
        if wins >= DOMINANT_TEAM_WINS {
            sentences.push(format!("{team} are traditionally strong at this track"));
        }
    }

    if let Some(top) = form.first() {
        sentences.push(format!("{} is in the best form", top.driver));
    }

    if sentences.is_empty() {
        return NO_CLEAR_FAVOURITE.to_string();
    }

    let mut text = sentences.join(". ");
    text.push('.');
    text
}
