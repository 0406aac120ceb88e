//! Output formatting and persistence.
//!
//! Renders the metric bundle into the text summary report, and writes the
//! JSON metrics dump and the cleaned-trips CSV. Rendering is pure: an
//! identical bundle always produces byte-identical text.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analytics::engine::TripTable;
use crate::analytics::types::{MetricBundle, MetricFailure};
use crate::config::Config;

const RULE: &str = "============================================================";

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(format!("--- {title} ---"));
}

fn failure_reason<'a>(failures: &'a [MetricFailure], metric: &str) -> Option<&'a str> {
    failures
        .iter()
        .find(|f| f.metric == metric)
        .map(|f| f.reason.as_str())
}

/// Renders the full report. Section order is fixed; a metric that failed
/// to compute is shown as unavailable instead of aborting the report.
pub fn render_report(bundle: &MetricBundle) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(RULE.to_string());
    lines.push("  CityBike — Summary Report".to_string());
    lines.push(RULE.to_string());

    section(&mut lines, "Run Overview");
    let run = &bundle.run;
    lines.push(format!("  Files read        : {}", run.files_read));
    lines.push(format!("  Rows read         : {}", run.rows_read));
    lines.push(format!("  Rows dropped      : {}", run.dropped()));
    lines.push(format!("    malformed         {}", run.malformed_rows));
    lines.push(format!("    bad timestamp     {}", run.bad_timestamps));
    lines.push(format!("    bad duration      {}", run.bad_durations));
    lines.push(format!("    missing station   {}", run.missing_stations));
    lines.push(format!("    unknown user type {}", run.bad_user_types));
    lines.push(format!("    duplicate id      {}", run.duplicate_trip_ids));
    lines.push(format!("  Outliers removed  : {}", run.outliers_removed));
    lines.push(format!("  Trips analyzed    : {}", bundle.total_trips));
    lines.push(format!(
        "  Total distance    : {:.2} km",
        bundle.total_distance_km
    ));
    match bundle.avg_duration_minutes {
        Some(avg) => lines.push(format!("  Avg duration      : {avg:.2} min")),
        None => lines.push("  Avg duration      : unavailable".to_string()),
    }

    section(&mut lines, "Peak Usage Hours");
    if bundle.peak_hours.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for entry in &bundle.peak_hours {
        lines.push(format!("  {:02}:00  {} trips", entry.hour, entry.trips));
    }

    section(&mut lines, "Busiest Day of Week");
    match &bundle.busiest_weekday {
        Some(day) => lines.push(format!("  {} ({} trips)", day.weekday, day.trips)),
        None => lines.push("  unavailable".to_string()),
    }

    section(&mut lines, "Monthly Trip Trend");
    if bundle.monthly_trend.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for month in &bundle.monthly_trend {
        lines.push(format!("  {}  {}", month.label(), month.trips));
    }

    section(&mut lines, "Top Active Users");
    if bundle.top_users.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for user in &bundle.top_users {
        lines.push(format!("  {}  {} trips", user.user_id, user.trips));
    }

    section(&mut lines, "Most Common Routes");
    if bundle.top_routes.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for route in &bundle.top_routes {
        lines.push(format!(
            "  {} -> {}  {} trips",
            route.start_station_id, route.end_station_id, route.trips
        ));
    }

    section(&mut lines, "Maintenance Cost");
    lines.push(format!("  Total: {:.2}", bundle.maintenance.total));
    if let Some(by_station) = &bundle.maintenance.by_station {
        lines.push("  By station:".to_string());
        for station in by_station {
            lines.push(format!("    {}  {:.2}", station.station_id, station.cost));
        }
    }

    section(&mut lines, "Duration Statistics");
    match &bundle.duration_stats {
        Some(s) => {
            lines.push(format!(
                "  mean {:.2} | median {:.2} | std {:.2}",
                s.mean, s.median, s.std_dev
            ));
            lines.push(format!(
                "  p25 {:.2} | p75 {:.2} | p90 {:.2}",
                s.p25, s.p75, s.p90
            ));
        }
        None => {
            let reason = failure_reason(&bundle.failures, "duration_stats").unwrap_or("no data");
            lines.push(format!("  unavailable ({reason})"));
        }
    }

    section(&mut lines, "Average Distance by User Type");
    if bundle.avg_distance_by_user_type.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for entry in &bundle.avg_distance_by_user_type {
        lines.push(format!(
            "  {}  {:.2} km ({} trips)",
            entry.user_type.label(),
            entry.value,
            entry.trips
        ));
    }

    section(&mut lines, "Estimated Revenue by User Type");
    if bundle.revenue_by_user_type.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for entry in &bundle.revenue_by_user_type {
        lines.push(format!(
            "  {}  €{:.2} ({} trips)",
            entry.user_type.label(),
            entry.revenue,
            entry.trips
        ));
    }

    section(&mut lines, "Top Start Stations");
    if bundle.station_counts.is_empty() {
        lines.push("  unavailable".to_string());
    }
    for station in &bundle.station_counts {
        lines.push(format!("  {}  {} trips", station.station_id, station.trips));
    }

    lines.join("\n") + "\n"
}

/// Writes the summary report to `<output>/summary_report.txt`,
/// overwriting any prior report.
pub fn export_report(bundle: &MetricBundle, config: &Config) -> Result<PathBuf> {
    let path = config.output_dir.join("summary_report.txt");
    write_output(&path, render_report(bundle).as_bytes())?;
    info!(path = %path.display(), "Report written");
    Ok(path)
}

/// Writes the full bundle as pretty JSON to `<output>/metrics.json`.
pub fn export_metrics_json(bundle: &MetricBundle, config: &Config) -> Result<PathBuf> {
    let path = config.output_dir.join("metrics.json");
    let json = serde_json::to_string_pretty(bundle)?;
    write_output(&path, json.as_bytes())?;
    info!(path = %path.display(), "Metrics JSON written");
    Ok(path)
}

/// Writes the cleaned trip table to `<output>/trips_clean.csv`.
pub fn export_clean_csv(table: &TripTable, config: &Config) -> Result<PathBuf> {
    let path = config.output_dir.join("trips_clean.csv");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .from_path(&path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    for trip in table.trips() {
        writer.serialize(trip)?;
    }
    writer.flush()?;

    info!(path = %path.display(), trips = table.len(), "Clean CSV written");
    Ok(path)
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}
