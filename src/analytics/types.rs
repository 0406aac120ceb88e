//! Value types produced by the analytics engine.
//!
//! The [`MetricBundle`] is built once per run and consumed read-only by
//! the chart renderer and the report exporter. It deliberately carries no
//! timestamps so the rendered report is byte-stable for identical input.

use serde::Serialize;

use crate::analytics::numerical::{FiveNumberSummary, HistogramBucket};
use crate::model::UserType;
use crate::stats::RunStats;

/// Trip count for one hour of the day.
#[derive(Debug, Clone, Serialize)]
pub struct HourCount {
    pub hour: u32,
    pub trips: usize,
}

/// Trip count for one weekday, `weekday` being the canonical English label.
#[derive(Debug, Clone, Serialize)]
pub struct WeekdayCount {
    pub weekday: String,
    pub trips: usize,
}

/// Trip count for one calendar month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthCount {
    pub year: i32,
    pub month: u32,
    pub trips: usize,
}

impl MonthCount {
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCount {
    pub user_id: String,
    pub trips: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCount {
    pub start_station_id: String,
    pub end_station_id: String,
    pub trips: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationCount {
    pub station_id: String,
    pub trips: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StationCost {
    pub station_id: String,
    pub cost: f64,
}

/// Maintenance cost estimate: overall total plus the optional per-station
/// breakdown when the run is configured for it.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceSummary {
    pub total: f64,
    pub by_station: Option<Vec<StationCost>>,
}

/// Central tendency and spread of trip durations, in minutes.
#[derive(Debug, Clone, Serialize)]
pub struct DurationStats {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserTypeDurations {
    pub user_type: UserType,
    pub summary: FiveNumberSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserTypeAverage {
    pub user_type: UserType,
    pub trips: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserTypeRevenue {
    pub user_type: UserType,
    pub trips: usize,
    pub revenue: f64,
}

/// A metric that could not be computed for this run. The rest of the
/// bundle is still valid; the report shows this metric as unavailable.
#[derive(Debug, Clone, Serialize)]
pub struct MetricFailure {
    pub metric: String,
    pub reason: String,
}

/// The complete set of computed analytics for one run.
#[derive(Debug, Serialize)]
pub struct MetricBundle {
    pub run: RunStats,

    pub total_trips: usize,
    pub total_distance_km: f64,
    pub avg_duration_minutes: Option<f64>,

    /// Hours ranked by trip count descending, earlier hour first on ties.
    pub peak_hours: Vec<HourCount>,
    /// Absent only when the table is empty.
    pub busiest_weekday: Option<WeekdayCount>,
    /// Chronologically ordered.
    pub monthly_trend: Vec<MonthCount>,
    /// Count descending, user id ascending on ties, at most top-N entries.
    pub top_users: Vec<UserCount>,
    /// Count descending, station pair ascending on ties, at most top-N.
    pub top_routes: Vec<RouteCount>,
    /// Start stations, count descending, station id ascending on ties.
    pub station_counts: Vec<StationCount>,

    pub maintenance: MaintenanceSummary,

    pub duration_stats: Option<DurationStats>,
    pub duration_histogram: Option<Vec<HistogramBucket>>,
    pub duration_by_user_type: Vec<UserTypeDurations>,
    pub avg_distance_by_user_type: Vec<UserTypeAverage>,
    pub revenue_by_user_type: Vec<UserTypeRevenue>,

    pub failures: Vec<MetricFailure>,
}
