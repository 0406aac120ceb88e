//! CLI entry point for the CityBike analytics pipeline.
//!
//! Runs the full batch pipeline over local CSV files:
//! load → clean → compute metrics → render charts → export report.

use anyhow::Result;
use clap::Parser;
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use citybike::analytics::engine;
use citybike::charts;
use citybike::config::Config;
use citybike::loader;
use citybike::report;

#[derive(Parser)]
#[command(name = "citybike")]
#[command(about = "Bike-share trip analytics: metrics, charts, and a summary report", long_about = None)]
struct Cli {
    /// CSV file or directory of CSV files to analyze
    #[arg(short, long, default_value = "data")]
    input: String,

    /// Directory for the report, figures, and exports
    #[arg(short, long, default_value = "output")]
    output: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/citybike.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("citybike.log"));

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
    let config = Config::new(cli.input, cli.output);

    run_pipeline(&config)
}

/// Runs the whole pipeline. Load failures are fatal; chart and metric
/// failures are tolerated at their own granularity and surfaced in the
/// report instead.
#[tracing::instrument(skip(config), fields(input = %config.input.display()))]
fn run_pipeline(config: &Config) -> Result<()> {
    let (records, mut stats) = loader::load_trips(&config.input)?;

    let table = engine::clean(records, config, &mut stats);
    let bundle = engine::compute_metrics(&table, &stats, config);

    let rendered = charts::render_all(&bundle, config)?;

    report::export_report(&bundle, config)?;
    report::export_metrics_json(&bundle, config)?;
    report::export_clean_csv(&table, config)?;

    info!(
        trips = table.len(),
        charts = rendered,
        output = %config.output_dir.display(),
        "Pipeline complete"
    );

    Ok(())
}
