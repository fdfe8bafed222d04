use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use f1_form_rater::analyzers::analyzer::Analyzer;
use f1_form_rater::analyzers::prediction::SEASON_NOT_STARTED;
use f1_form_rater::config::DashboardConfig;
use f1_form_rater::parser::{parse_laps, parse_pit_stops, parse_results, parse_schedule};
use f1_form_rater::services::{
    Event, LapTiming, MotorsportDataSource, PitStop, RaceResultRow, SessionKind,
};
use f1_form_rater::web::{AppState, router};

const EXPECTED_PREDICTION: &str = "VER has a strong record at this track. \
     Red Bull are traditionally strong at this track. \
     NOR is in the best form.";

/// Serves parsed fixture data. Schedules of `failing_years` and results of
/// `failing_rounds` error out; `result_calls` counts classification requests.
#[derive(Default)]
struct FixtureSource {
    schedules: HashMap<i32, Vec<Event>>,
    results: HashMap<(i32, u32), Vec<RaceResultRow>>,
    laps: HashMap<(i32, u32), Vec<LapTiming>>,
    pit_stops: HashMap<(i32, u32), Vec<PitStop>>,
    failing_years: Vec<i32>,
    failing_rounds: Vec<(i32, u32)>,
    result_calls: AtomicUsize,
}

#[async_trait]
impl MotorsportDataSource for FixtureSource {
    async fn schedule(&self, year: i32) -> Result<Vec<Event>> {
        if self.failing_years.contains(&year) {
            anyhow::bail!("provider unavailable for {year}");
        }
        Ok(self.schedules.get(&year).cloned().unwrap_or_default())
    }

    async fn session_results(
        &self,
        year: i32,
        round: u32,
        kind: SessionKind,
    ) -> Result<Vec<RaceResultRow>> {
        self.result_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_rounds.contains(&(year, round)) {
            anyhow::bail!("results unavailable for {year} round {round}");
        }
        if kind != SessionKind::Race {
            return Ok(Vec::new());
        }
        Ok(self.results.get(&(year, round)).cloned().unwrap_or_default())
    }

    async fn laps(&self, year: i32, round: u32) -> Result<Vec<LapTiming>> {
        Ok(self.laps.get(&(year, round)).cloned().unwrap_or_default())
    }

    async fn pit_stops(&self, year: i32, round: u32) -> Result<Vec<PitStop>> {
        Ok(self.pit_stops.get(&(year, round)).cloned().unwrap_or_default())
    }
}

fn monaco(year: i32, round: u32, day: u32) -> Event {
    Event {
        year,
        round,
        name: "Monaco Grand Prix".to_string(),
        location: "Monte-Carlo".to_string(),
        country: "Monaco".to_string(),
        date: NaiveDate::from_ymd_opt(year, 5, day).unwrap(),
        time: None,
    }
}

fn row(code: &str, name: &str, team: &str, position: u32, points: f64) -> RaceResultRow {
    RaceResultRow {
        driver_id: code.to_lowercase(),
        code: code.to_string(),
        full_name: name.to_string(),
        number: String::new(),
        team: team.to_string(),
        position: Some(position),
        points,
        status: "Finished".to_string(),
    }
}

fn fixture_source() -> FixtureSource {
    let mut source = FixtureSource::default();

    let schedule = parse_schedule(include_bytes!("fixtures/schedule_2025.json")).unwrap();
    source.schedules.insert(2025, schedule.items);
    for (round, body) in [
        (1, &include_bytes!("fixtures/results_2025_1.json")[..]),
        (2, &include_bytes!("fixtures/results_2025_2.json")[..]),
    ] {
        let rows = parse_results(body, SessionKind::Race).unwrap().items;
        source.results.insert((2025, round), rows);
    }
    let laps = parse_laps(include_bytes!("fixtures/laps_2025_2.json")).unwrap();
    source.laps.insert((2025, 2), laps.items);
    let stops = parse_pit_stops(include_bytes!("fixtures/pitstops_2025_2.json")).unwrap();
    source.pit_stops.insert((2025, 2), stops.items);

    source.schedules.insert(2023, vec![monaco(2023, 6, 28)]);
    source.results.insert(
        (2023, 6),
        vec![
            row("VER", "Max Verstappen", "Red Bull", 1, 25.0),
            row("LEC", "Charles Leclerc", "Ferrari", 2, 18.0),
        ],
    );
    source.schedules.insert(2024, vec![monaco(2024, 8, 26)]);
    source.results.insert(
        (2024, 8),
        vec![
            row("VER", "Max Verstappen", "Red Bull", 1, 25.0),
            row("LEC", "Charles Leclerc", "Ferrari", 3, 15.0),
        ],
    );
    source.failing_years.push(2022);

    source
}

fn analyzer() -> Analyzer {
    Analyzer::new(Arc::new(fixture_source()), DashboardConfig::default())
}

fn mid_april() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 10, 12, 0, 0).unwrap()
}

#[test]
fn test_fixtures_parse() {
    let schedule = parse_schedule(include_bytes!("fixtures/schedule_2025.json")).unwrap();
    assert_eq!(schedule.total, 3);
    assert_eq!(schedule.items[2].location, "Monte-Carlo");

    let results = parse_results(
        include_bytes!("fixtures/results_2025_2.json"),
        SessionKind::Race,
    )
    .unwrap();
    assert_eq!(results.items[3].status, "Retired");
    assert_eq!(results.items[3].position, Some(4));
}

#[tokio::test]
async fn test_full_pipeline() {
    let analyzer = analyzer();
    let now = mid_april();

    let (last, next) = analyzer.last_and_next_race(now).await;
    assert_eq!(last.unwrap().name, "Chinese Grand Prix");
    let next = next.unwrap();
    assert_eq!(next.name, "Monaco Grand Prix");

    let blocks = analyzer.prediction_blocks(now, Some(&next)).await;

    // 2022 fails and earlier seasons have no event; both are skipped
    let years: Vec<i32> = blocks.track_history.iter().map(|h| h.year).collect();
    assert_eq!(years, vec![2023, 2024]);

    assert_eq!(blocks.current_form.len(), 4);
    assert_eq!(blocks.current_form[0].driver, "NOR");
    assert_eq!(blocks.current_form[0].avg_points, 25.0);
    assert_eq!(blocks.current_form[1].driver, "PIA");
    assert_eq!(blocks.current_form[2].driver, "VER");

    assert_eq!(blocks.track_rating[0].driver, "VER");
    assert_eq!(blocks.track_rating[0].rating, 39.5);
    assert_eq!(blocks.track_rating[1].driver, "LEC");
    assert_eq!(blocks.track_rating[1].rating, 30.5);

    assert_eq!(blocks.expert_prediction, EXPECTED_PREDICTION);
    assert_eq!(blocks.next_track_name, "Monaco Grand Prix");
}

#[tokio::test]
async fn test_preseason_falls_back_to_previous_season() {
    let analyzer = analyzer();
    let now = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();

    let (last, next) = analyzer.last_and_next_race(now).await;
    assert_eq!(last.unwrap().year, 2024);
    let next = next.unwrap();
    assert_eq!(next.round, 1);

    assert!(analyzer.current_form(now, 10).await.is_empty());
    let blocks = analyzer.prediction_blocks(now, Some(&next)).await;
    assert_eq!(blocks.expert_prediction, SEASON_NOT_STARTED);
}

#[tokio::test]
async fn test_race_laps_and_pit_stops() {
    let analyzer = analyzer();

    let laps = analyzer.race_laps(2025, "Chinese").await;
    let drivers: Vec<&str> = laps.iter().map(|d| d.driver.as_str()).collect();
    assert_eq!(drivers, vec!["NOR", "VER", "PIA"]);
    assert_eq!(laps[0].laps[1].0, 2);
    assert!((laps[0].laps[1].1 - 96.1).abs() < 1e-9);

    let stops = analyzer.race_pit_stops(2025, "chinese grand prix").await;
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[1].driver, "VER");
    assert_eq!(stops[1].laps, vec![16, 38]);

    assert!(analyzer.race_laps(2025, "Imola").await.is_empty());
}

#[tokio::test]
async fn test_session_results_and_drivers() {
    let analyzer = analyzer();

    let results = analyzer
        .session_results(2025, "Australian Grand Prix", SessionKind::Race)
        .await;
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].driver, "NOR");
    assert_eq!(results[0].position, "1");

    let drivers = analyzer
        .drivers_for_session(2025, "Australian", SessionKind::Race)
        .await;
    assert_eq!(drivers[0].name, "Lando Norris");
    assert_eq!(drivers[3].abbreviation, "RUS");

    assert!(
        analyzer
            .session_results(2022, "Monaco", SessionKind::Race)
            .await
            .is_empty()
    );
}

#[tokio::test]
async fn test_single_completed_race_has_no_form() {
    let analyzer = analyzer();
    let now = Utc.with_ymd_and_hms(2025, 3, 18, 12, 0, 0).unwrap();

    let (last, next) = analyzer.last_and_next_race(now).await;
    assert_eq!(last.unwrap().round, 1);
    assert_eq!(next.unwrap().round, 2);

    assert!(analyzer.current_form(now, 10).await.is_empty());
}

#[tokio::test]
async fn test_form_skips_race_that_fails_to_load() {
    let mut source = fixture_source();
    source.failing_rounds.push((2025, 1));
    let analyzer = Analyzer::new(Arc::new(source), DashboardConfig::default());

    let form = analyzer.current_form(mid_april(), 10).await;

    let drivers: Vec<&str> = form.iter().map(|f| f.driver.as_str()).collect();
    assert_eq!(drivers, vec!["NOR", "VER", "PIA", "RUS"]);
    assert_eq!(form[1].avg_points, 18.0);
    assert!(form.iter().all(|f| f.races == 1));
}

#[tokio::test]
async fn test_track_rating_empty_when_provider_unreachable() {
    let mut source = fixture_source();
    source.failing_years = (2015..=2025).collect();
    let analyzer = Analyzer::new(Arc::new(source), DashboardConfig::default());
    let now = mid_april();

    assert!(analyzer.track_rating(now, "Monaco", 8).await.is_empty());
    assert!(analyzer.track_history(now, "Monaco", 5).await.is_empty());
    assert!(analyzer.current_form(now, 10).await.is_empty());
}

#[tokio::test]
async fn test_track_performance_reuses_prediction_blocks() {
    let source = Arc::new(fixture_source());
    let analyzer = Analyzer::new(source.clone(), DashboardConfig::default());
    let now = mid_april();
    let next = monaco(2025, 3, 25);

    let blocks = analyzer.prediction_blocks(now, Some(&next)).await;
    let before = source.result_calls.load(Ordering::SeqCst);

    let entries = analyzer
        .track_performance(now, &next.name, &blocks.track_rating, &blocks.current_form)
        .await;

    // one classification per season with a Monaco race (2023 and 2024)
    assert_eq!(source.result_calls.load(Ordering::SeqCst) - before, 2);
    let drivers: Vec<&str> = entries.iter().map(|e| e.driver.as_str()).collect();
    assert_eq!(drivers, vec!["VER", "LEC"]);
    assert_eq!(entries[1].avg_position, 2.5);
    assert!(entries[1].recent_podium);
}

async fn spawn_server() -> String {
    let now = mid_april();
    let state = AppState::with_clock(analyzer(), Arc::new(move || now));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_http_api() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let seasons: Vec<i32> = client
        .get(format!("{base}/api/seasons"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seasons.first(), Some(&2018));
    assert_eq!(seasons.last(), Some(&2025));

    let events: serde_json::Value = client
        .get(format!("{base}/api/events/2025"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(events[0]["date"], "16.03.2025");
    assert_eq!(events[0]["full_date"], "2025-03-16");

    let prediction: serde_json::Value = client
        .get(format!("{base}/api/prediction"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(prediction["expert_prediction"], EXPECTED_PREDICTION);
    assert_eq!(prediction["track_rating"][0]["best_pos"], 1);

    let results: serde_json::Value = client
        .get(format!("{base}/api/results/2025/Chinese%20Grand%20Prix/R"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results[3]["status"], "Retired");

    let form: serde_json::Value = client
        .get(format!("{base}/api/form?count=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(form.as_array().unwrap().len(), 2);

    let bad = client
        .get(format!("{base}/api/drivers/2025/Chinese/XX"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_http_pages() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let dashboard = client
        .get(format!("{base}/"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(dashboard.contains("Chinese Grand Prix"));
    assert!(dashboard.contains("Winner: Lando Norris (NOR), McLaren"));
    assert!(dashboard.contains("Pit stop strategy"));
    assert!(dashboard.contains("Average position at Monaco Grand Prix"));

    let analysis = client
        .get(format!(
            "{base}/analysis?year=2025&event=Chinese%20Grand%20Prix&session=R&drivers=nor,ver"
        ))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(analysis.contains("2025 Chinese Grand Prix: Race"));
    assert!(analysis.contains("Lap pace"));
    assert!(analysis.contains("Position changes"));
    assert!(analysis.contains("value=\"NOR,VER\""));
}
