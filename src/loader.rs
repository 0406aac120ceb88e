//! CSV ingestion for trip records.
//!
//! Accepts a single CSV file or a directory of `*.csv` files. Input-level
//! problems (missing path, no CSV files, wrong header) are fatal; row-level
//! problems drop the row and bump a [`RunStats`] counter.

use anyhow::{Context, Result, bail};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::model::{RawTripRow, TripRecord};
use crate::stats::RunStats;

/// Columns every input file must declare in its header.
const REQUIRED_COLUMNS: &[&str] = &[
    "trip_id",
    "start_time",
    "end_time",
    "start_station_id",
    "end_station_id",
    "user_type",
];

/// Loads and validates all trips under `input`.
///
/// Returns the valid records in input order together with the row
/// accounting. Duplicate trip ids keep the first occurrence.
pub fn load_trips(input: &Path) -> Result<(Vec<TripRecord>, RunStats)> {
    let files = discover_csv_files(input)?;

    let mut stats = RunStats::default();
    let mut trips = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for file in &files {
        load_file(file, &mut trips, &mut seen_ids, &mut stats)
            .with_context(|| format!("failed to load {}", file.display()))?;
        stats.files_read += 1;
    }

    stats.trips_loaded = trips.len();
    info!(
        files = stats.files_read,
        rows = stats.rows_read,
        trips = stats.trips_loaded,
        dropped = stats.dropped(),
        "Trip load complete"
    );

    Ok((trips, stats))
}

/// Resolves the input path to a sorted list of CSV files.
fn discover_csv_files(input: &Path) -> Result<Vec<PathBuf>> {
    if !input.exists() {
        bail!("input path {} does not exist", input.display());
    }

    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(input)
        .with_context(|| format!("cannot read input directory {}", input.display()))?
    {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            files.push(path);
        }
    }
    // Sorted so repeated runs see the files in the same order.
    files.sort();

    if files.is_empty() {
        bail!("no CSV files found under {}", input.display());
    }

    Ok(files)
}

fn load_file(
    path: &Path,
    trips: &mut Vec<TripRecord>,
    seen_ids: &mut HashSet<String>,
    stats: &mut RunStats,
) -> Result<()> {
    let file = File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    check_header(path, &mut rdr)?;

    for result in rdr.deserialize() {
        stats.rows_read += 1;

        let raw: RawTripRow = match result {
            Ok(raw) => raw,
            Err(e) => {
                debug!(row = stats.rows_read, error = %e, "Malformed row dropped");
                stats.malformed_rows += 1;
                continue;
            }
        };

        match TripRecord::from_raw(raw) {
            Ok(trip) => {
                if !seen_ids.insert(trip.trip_id.clone()) {
                    stats.duplicate_trip_ids += 1;
                    continue;
                }
                trips.push(trip);
            }
            Err(reason) => {
                debug!(row = stats.rows_read, %reason, "Invalid row dropped");
                stats.record_drop(&reason);
            }
        }
    }

    Ok(())
}

/// Fails fast when a file's header is missing a required column, so a
/// wrong-schema file is reported by path instead of dropping every row.
fn check_header(path: &Path, rdr: &mut csv::Reader<File>) -> Result<()> {
    let headers = rdr
        .headers()
        .with_context(|| format!("unreadable CSV header in {}", path.display()))?;

    let present: HashSet<&str> = headers.iter().map(str::trim).collect();
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !present.contains(col))
        .collect();

    if !missing.is_empty() {
        warn!(path = %path.display(), ?missing, "Header check failed");
        bail!(
            "{} is missing required column(s): {}",
            path.display(),
            missing.join(", ")
        );
    }

    Ok(())
}
