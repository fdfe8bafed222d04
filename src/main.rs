//! CLI entry point for the F1 Form Rater.
//!
//! Serves the dashboard or runs a single analysis and logs the result,
//! optionally appending it to a CSV file.

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use f1_form_rater::analyzers::analyzer::Analyzer;
use f1_form_rater::config::DashboardConfig;
use f1_form_rater::infra::jolpica::JolpicaClient;
use f1_form_rater::output::{append_records, print_json, print_pretty};
use f1_form_rater::services::SessionKind;
use f1_form_rater::web::{self, AppState};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "f1_form_rater")]
#[command(about = "Formula 1 form, track ratings and race predictions", long_about = None)]
struct Cli {
    /// JSON config file. F1_* environment variables override its values
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard and JSON API
    Serve {
        /// Address to bind, overriding the configured one
        #[arg(long)]
        addr: Option<String>,
    },
    /// Average points over the most recent races of the current season
    Form {
        /// Number of drivers to list
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// CSV file to append results to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Historical rating of drivers at a track
    TrackRating {
        /// Event name or part of it, e.g. "Monaco"
        #[arg(value_name = "TRACK")]
        track: String,

        /// Number of drivers to list
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// CSV file to append results to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Prediction blocks for the next race
    Predict,
    /// List the events of a season
    Events {
        year: i32,

        /// CSV file to append results to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Results table of one session
    Results {
        year: i32,

        /// Event name or part of it
        event: String,

        /// Session code: R, Q, S, FP1, FP2 or FP3
        #[arg(short, long, default_value = "R")]
        session: String,

        /// CSV file to append results to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/f1_form_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("f1_form_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?.apply_env()?,
        None => DashboardConfig::from_env()?,
    };
    info!(
        api = %config.api_base_url,
        cache = config.cache.enabled,
        "Configuration loaded"
    );

    let source = JolpicaClient::from_config(&config)?;
    let analyzer = Analyzer::new(Arc::new(source), config);
    let now = Utc::now();

    match cli.command {
        Commands::Serve { addr } => {
            let addr = addr.unwrap_or_else(|| analyzer.config().bind_addr.clone());
            web::serve(&addr, AppState::new(analyzer)).await?;
        }
        Commands::Form { count, output } => {
            let count = count.unwrap_or(analyzer.config().form_count);
            let form = analyzer.current_form(now, count).await;
            if form.is_empty() {
                warn!("Not enough completed races for current form");
            }
            report(&form, output.as_deref())?;
        }
        Commands::TrackRating {
            track,
            count,
            output,
        } => {
            let count = count.unwrap_or(analyzer.config().track_rating_count);
            let rating = analyzer.track_rating(now, &track, count).await;
            if rating.is_empty() {
                warn!(track, "No past races found at track");
            }
            report(&rating, output.as_deref())?;
        }
        Commands::Predict => {
            let (last, next) = analyzer.last_and_next_race(now).await;
            if let Some(last) = &last {
                info!(last_race = %last.name, "Last race");
            }
            let blocks = analyzer.prediction_blocks(now, next.as_ref()).await;
            print_pretty(&blocks);
            print_json(&blocks)?;
        }
        Commands::Events { year, output } => {
            let events = analyzer.events_for_season(year).await;
            report(&events, output.as_deref())?;
        }
        Commands::Results {
            year,
            event,
            session,
            output,
        } => {
            let kind: SessionKind = session.parse()?;
            let results = analyzer.session_results(year, &event, kind).await;
            report(&results, output.as_deref())?;
        }
    }

    Ok(())
}

/// Logs `rows` as JSON (and as Debug at debug level) and appends them to
/// `output` when given.
fn report<T: Serialize + Debug>(rows: &[T], output: Option<&str>) -> Result<()> {
    print_pretty(&rows);
    print_json(&rows)?;
    if let Some(path) = output {
        append_records(path, rows)?;
        info!(path, rows = rows.len(), "Results appended");
    }
    Ok(())
}
