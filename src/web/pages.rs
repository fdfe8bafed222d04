//! Server-rendered HTML pages. All provider text is escaped before it is
//! written into markup; chart SVG is produced escaped by the chart builders.

use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Datelike;
use serde::Deserialize;

use crate::analyzers::analyzer::Analyzer;
use crate::analyzers::types::{
    EventSummary, PredictionBlocks, RaceWinner, SessionResultEntry, SessionTypeOption,
};
use crate::charts::svg::escape;
use crate::charts::{
    lap_pace_chart, lap_time_chart, pit_stop_chart, position_changes_chart,
    track_performance_chart,
};
use crate::services::{Event, SessionKind};
use crate::web::AppState;

const STYLE: &str = "body{font-family:sans-serif;background:#0f0f17;color:#eee;margin:2em}\
table{border-collapse:collapse;margin:1em 0}td,th{border:1px solid #444;padding:4px 8px}\
section{margin-bottom:2em}.prediction{font-size:1.2em;color:#ffd54f}";

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style></head><body><nav><a href=\"/\">Dashboard</a> | \
         <a href=\"/analysis\">Analysis</a></nav>{body}</body></html>",
        escape(title)
    )
}

/// A table with escaped header and cell text. Renders a placeholder
/// paragraph when there are no rows.
fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return "<p>No data available</p>".to_string();
    }
    let mut html = String::from("<table><tr>");
    for h in headers {
        html.push_str(&format!("<th>{}</th>", escape(h)));
    }
    html.push_str("</tr>");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

fn chart_section(title: &str, chart: Option<&str>) -> String {
    match chart {
        Some(svg) => format!("<section><h2>{}</h2>{svg}</section>", escape(title)),
        None => String::new(),
    }
}

fn event_line(event: &Event) -> String {
    format!(
        "{} ({}, {}) on {}",
        escape(&event.name),
        escape(&event.location),
        escape(&event.country),
        event.date.format("%d.%m.%Y")
    )
}

/// Everything shown on the dashboard, gathered before rendering.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub last_race: Option<Event>,
    pub last_winner: Option<RaceWinner>,
    pub next_race: Option<Event>,
    pub blocks: PredictionBlocks,
    pub pit_chart: Option<String>,
    pub lap_chart: Option<String>,
    pub performance_chart: Option<String>,
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let mut body = String::from("<h1>F1 Form Rater</h1>");

    body.push_str("<section><h2>Last race</h2>");
    match &view.last_race {
        Some(event) => {
            body.push_str(&format!("<p>{}</p>", event_line(event)));
            if let Some(w) = &view.last_winner {
                body.push_str(&format!(
                    "<p>Winner: {} ({}), {}</p>",
                    escape(&w.name),
                    escape(&w.abb),
                    escape(&w.team)
                ));
            }
        }
        None => body.push_str("<p>No race completed yet</p>"),
    }
    body.push_str("</section>");

    body.push_str("<section><h2>Next race</h2>");
    match &view.next_race {
        Some(event) => body.push_str(&format!("<p>{}</p>", event_line(event))),
        None => body.push_str("<p>No upcoming race scheduled</p>"),
    }
    body.push_str("</section>");

    let blocks = &view.blocks;
    body.push_str(&format!(
        "<section><h2>Prediction: {}</h2><p class=\"prediction\">{}</p></section>",
        escape(&blocks.next_track_name),
        escape(&blocks.expert_prediction)
    ));

    let history: Vec<Vec<String>> = blocks
        .track_history
        .iter()
        .map(|h| {
            vec![
                h.year.to_string(),
                h.winner.clone(),
                h.team.clone(),
                format!("{}", h.points),
            ]
        })
        .collect();
    body.push_str("<section><h2>Track history</h2>");
    body.push_str(&table(&["Year", "Winner", "Team", "Points"], &history));
    body.push_str("</section>");

    let form: Vec<Vec<String>> = blocks
        .current_form
        .iter()
        .map(|f| vec![f.driver.clone(), format!("{:.1}", f.avg_points), f.races.to_string()])
        .collect();
    body.push_str("<section><h2>Current form</h2>");
    body.push_str(&table(&["Driver", "Avg points", "Races"], &form));
    body.push_str("</section>");

    let rating: Vec<Vec<String>> = blocks
        .track_rating
        .iter()
        .map(|r| {
            vec![
                r.driver.clone(),
                format!("{:.1}", r.rating),
                format!("{:.1}", r.avg_points),
                r.best_position.to_string(),
                r.races.to_string(),
            ]
        })
        .collect();
    body.push_str("<section><h2>Track rating</h2>");
    body.push_str(&table(
        &["Driver", "Rating", "Avg points", "Best", "Races"],
        &rating,
    ));
    body.push_str("</section>");

    body.push_str(&chart_section("Pit stop strategy", view.pit_chart.as_deref()));
    body.push_str(&chart_section("Lap times", view.lap_chart.as_deref()));
    body.push_str(&chart_section(
        "Track performance",
        view.performance_chart.as_deref(),
    ));

    page("F1 Form Rater", &body)
}

/// Selections and data of the analysis page.
#[derive(Debug, Clone)]
pub struct AnalysisView {
    pub seasons: Vec<i32>,
    pub year: i32,
    pub events: Vec<EventSummary>,
    pub event: Option<String>,
    pub sessions: Vec<SessionTypeOption>,
    pub session: SessionKind,
    pub drivers: Vec<String>,
    pub results: Vec<SessionResultEntry>,
    pub pace_chart: Option<String>,
    pub positions_chart: Option<String>,
    pub error: Option<String>,
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        "<option value=\"{}\"{}>{}</option>",
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

pub fn render_analysis(view: &AnalysisView) -> String {
    let mut body = String::from("<h1>Session analysis</h1>");

    if let Some(error) = &view.error {
        body.push_str(&format!("<p class=\"error\">{}</p>", escape(error)));
    }

    body.push_str("<form method=\"get\" action=\"/analysis\"><select name=\"year\">");
    for &year in &view.seasons {
        body.push_str(&option(&year.to_string(), &year.to_string(), year == view.year));
    }
    body.push_str("</select><select name=\"event\">");
    for e in &view.events {
        let selected = view.event.as_deref() == Some(e.name.as_str());
        body.push_str(&option(&e.name, &format!("{} ({})", e.name, e.date), selected));
    }
    body.push_str("</select><select name=\"session\">");
    for s in &view.sessions {
        body.push_str(&option(s.value, s.name, s.value == view.session.code()));
    }
    body.push_str(&format!(
        "</select><input name=\"drivers\" placeholder=\"VER,NOR\" value=\"{}\">\
         <button type=\"submit\">Show</button></form>",
        escape(&view.drivers.join(","))
    ));

    if let Some(event) = &view.event {
        let rows: Vec<Vec<String>> = view
            .results
            .iter()
            .map(|r| {
                vec![
                    r.position.clone(),
                    r.number.clone(),
                    r.driver.clone(),
                    r.team.clone(),
                    format!("{}", r.points),
                    r.status.clone(),
                ]
            })
            .collect();
        body.push_str(&format!(
            "<section><h2>{} {}: {}</h2>",
            view.year,
            escape(event),
            view.session.display_name()
        ));
        body.push_str(&table(
            &["Pos", "No", "Driver", "Team", "Points", "Status"],
            &rows,
        ));
        body.push_str("</section>");
    }

    body.push_str(&chart_section("Lap pace", view.pace_chart.as_deref()));
    body.push_str(&chart_section(
        "Position changes",
        view.positions_chart.as_deref(),
    ));

    page("Session analysis", &body)
}

pub async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let analyzer = &state.analyzer;
    let now = state.now();
    let (last_race, next_race) = analyzer.last_and_next_race(now).await;

    let last_data = async {
        match &last_race {
            Some(last) => {
                let (winner, stops, laps) = tokio::join!(
                    analyzer.last_race_winner(last),
                    analyzer.race_pit_stops(last.year, &last.name),
                    analyzer.race_laps(last.year, &last.name),
                );
                (
                    winner,
                    pit_stop_chart(&stops, &last.name),
                    lap_time_chart(&laps, &last.name),
                )
            }
            None => (None, None, None),
        }
    };
    let next_data = async {
        let blocks = analyzer.prediction_blocks(now, next_race.as_ref()).await;
        let performance = match &next_race {
            Some(next) => {
                let entries = analyzer
                    .track_performance(
                        now,
                        &next.name,
                        &blocks.track_rating,
                        &blocks.current_form,
                    )
                    .await;
                track_performance_chart(&entries, &next.name)
            }
            None => None,
        };
        (blocks, performance)
    };
    let ((last_winner, pit_chart, lap_chart), (blocks, performance_chart)) =
        tokio::join!(last_data, next_data);

    Html(render_dashboard(&DashboardView {
        last_race,
        last_winner,
        next_race,
        blocks,
        pit_chart,
        lap_chart,
        performance_chart,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalysisParams {
    pub year: Option<i32>,
    pub event: Option<String>,
    pub session: Option<String>,
    pub drivers: Option<String>,
}

/// Comma-separated driver codes, uppercased, blanks dropped.
pub fn parse_driver_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(|d| d.trim().to_uppercase())
        .filter(|d| !d.is_empty())
        .collect()
}

pub async fn analysis(
    State(state): State<AppState>,
    Query(params): Query<AnalysisParams>,
) -> Html<String> {
    let analyzer = &state.analyzer;
    let now = state.now();
    let year = params.year.unwrap_or(now.year());

    let (session, error) = match params.session.as_deref() {
        None | Some("") => (SessionKind::Race, None),
        Some(raw) => match raw.parse::<SessionKind>() {
            Ok(kind) => (kind, None),
            Err(e) => (SessionKind::Race, Some(e.to_string())),
        },
    };
    let event = params.event.filter(|e| !e.trim().is_empty());
    let drivers = parse_driver_list(params.drivers.as_deref());

    let events = analyzer.events_for_season(year).await;
    let (results, pace_chart, positions_chart) = match &event {
        Some(name) if error.is_none() => {
            let results = analyzer.session_results(year, name, session).await;
            if session == SessionKind::Race {
                let laps = analyzer.race_laps(year, name).await;
                (
                    results,
                    lap_pace_chart(&laps, &drivers),
                    position_changes_chart(&laps),
                )
            } else {
                (results, None, None)
            }
        }
        _ => (Vec::new(), None, None),
    };

    Html(render_analysis(&AnalysisView {
        seasons: analyzer.available_seasons(now),
        year,
        events,
        event,
        sessions: Analyzer::session_types(),
        session,
        drivers,
        results,
        pace_chart,
        positions_chart,
        error,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::{NEXT_RACE_PLACEHOLDER, WAITING_FOR_SEASON};
    use crate::analyzers::types::FormEntry;
    use crate::analyzers::schedule::tests::event;

    fn empty_blocks() -> PredictionBlocks {
        PredictionBlocks {
            track_history: Vec::new(),
            current_form: Vec::new(),
            track_rating: Vec::new(),
            expert_prediction: WAITING_FOR_SEASON.to_string(),
            next_track_name: NEXT_RACE_PLACEHOLDER.to_string(),
        }
    }

    fn dashboard_view() -> DashboardView {
        DashboardView {
            last_race: None,
            last_winner: None,
            next_race: None,
            blocks: empty_blocks(),
            pit_chart: None,
            lap_chart: None,
            performance_chart: None,
        }
    }

    #[test]
    fn test_dashboard_without_races() {
        let html = render_dashboard(&dashboard_view());

        assert!(html.contains("No race completed yet"));
        assert!(html.contains("No upcoming race scheduled"));
        assert!(html.contains(WAITING_FOR_SEASON));
        assert!(!html.contains("<svg"));
    }

    #[test]
    fn test_dashboard_escapes_provider_text() {
        let mut view = dashboard_view();
        view.next_race = Some(event(2025, 5, "<script>alert(1)</script> GP", 5, 4));
        view.blocks.current_form = vec![FormEntry {
            driver: "A&B".to_string(),
            avg_points: 12.345,
            races: 3,
        }];

        let html = render_dashboard(&view);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<td>A&amp;B</td><td>12.3</td>"));
    }

    #[test]
    fn test_dashboard_includes_charts() {
        let mut view = dashboard_view();
        view.pit_chart = Some("<svg id=\"pit\"></svg>".to_string());

        let html = render_dashboard(&view);
        assert!(html.contains("<h2>Pit stop strategy</h2><svg id=\"pit\">"));
        assert!(!html.contains("<h2>Lap times</h2>"));
    }

    #[test]
    fn test_analysis_marks_selection() {
        let view = AnalysisView {
            seasons: vec![2024, 2025],
            year: 2025,
            events: Vec::new(),
            event: Some("Monaco Grand Prix".to_string()),
            sessions: Analyzer::session_types(),
            session: SessionKind::Qualifying,
            drivers: vec!["VER".to_string(), "LEC".to_string()],
            results: vec![SessionResultEntry {
                position: "1".to_string(),
                number: "16".to_string(),
                driver: "LEC".to_string(),
                team: "Ferrari".to_string(),
                points: 0.0,
                status: "Q3".to_string(),
            }],
            pace_chart: None,
            positions_chart: None,
            error: None,
        };

        let html = render_analysis(&view);

        assert!(html.contains("<option value=\"2025\" selected>"));
        assert!(html.contains("<option value=\"Q\" selected>Qualifying</option>"));
        assert!(html.contains("value=\"VER,LEC\""));
        assert!(html.contains("Monaco Grand Prix: Qualifying"));
        assert!(html.contains("<td>Q3</td>"));
    }

    #[test]
    fn test_parse_driver_list() {
        assert_eq!(parse_driver_list(Some(" ver, ,nor ")), vec!["VER", "NOR"]);
        assert!(parse_driver_list(None).is_empty());
    }
}
