//! Pipeline configuration.
//!
//! Everything tunable lives here and is passed explicitly into each stage,
//! so the engine stays testable without ambient state.

use chrono::{Datelike, NaiveDateTime, Timelike};
use std::path::PathBuf;

/// A set of half-open `[start, end)` hour ranges on weekdays during which
/// peak-hour surcharge pricing applies.
#[derive(Debug, Clone)]
pub struct PeakWindow {
    pub hour_ranges: Vec<(u32, u32)>,
}

impl Default for PeakWindow {
    fn default() -> Self {
        // Weekday morning and evening commute windows.
        PeakWindow {
            hour_ranges: vec![(7, 9), (16, 19)],
        }
    }
}

impl PeakWindow {
    /// Whether `ts` falls inside the window (weekdays only).
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        if ts.weekday().num_days_from_monday() >= 5 {
            return false;
        }
        let hour = ts.hour();
        self.hour_ranges
            .iter()
            .any(|&(start, end)| hour >= start && hour < end)
    }
}

/// How maintenance cost is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceGrouping {
    Overall,
    ByStation,
}

/// Per-trip maintenance cost estimate rates.
#[derive(Debug, Clone)]
pub struct MaintenanceRates {
    pub per_minute: f64,
    pub per_km: f64,
    pub grouping: MaintenanceGrouping,
}

impl Default for MaintenanceRates {
    fn default() -> Self {
        MaintenanceRates {
            per_minute: 0.05,
            per_km: 0.02,
            grouping: MaintenanceGrouping::ByStation,
        }
    }
}

/// Complete configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// CSV file, or directory scanned for `*.csv` files.
    pub input: PathBuf,
    /// Directory receiving the report, figures, and exports.
    pub output_dir: PathBuf,
    /// Truncation size for ranked lists (users, routes, stations).
    pub top_n: usize,
    /// Fixed ceiling for the outlier clean pass, in minutes.
    pub max_trip_minutes: f64,
    /// Bucket count for the duration histogram.
    pub histogram_buckets: usize,
    pub peak_window: PeakWindow,
    pub maintenance: MaintenanceRates,
}

impl Config {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Config {
            input: input.into(),
            output_dir: output_dir.into(),
            ..Config::default()
        }
    }

    /// Directory chart images are written to.
    pub fn figures_dir(&self) -> PathBuf {
        self.output_dir.join("figures")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            top_n: 10,
            max_trip_minutes: 480.0,
            histogram_buckets: 30,
            peak_window: PeakWindow::default(),
            maintenance: MaintenanceRates::default(),
        }
    }
}
