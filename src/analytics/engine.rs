//! The analytics engine: outlier cleaning and metric computation.
//!
//! All grouping runs over ordered maps and every ranking has an explicit
//! secondary key, so identical input always produces identical output.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};
use tracing::{info, warn};

use crate::analytics::numerical::{self, EmptyInputError};
use crate::analytics::types::{
    DurationStats, HourCount, MaintenanceSummary, MetricBundle, MetricFailure, MonthCount,
    RouteCount, StationCost, StationCount, UserCount, UserTypeAverage, UserTypeDurations,
    UserTypeRevenue, WeekdayCount,
};
use crate::config::{Config, MaintenanceGrouping};
use crate::model::{TripRecord, UserType};
use crate::pricing::strategy_for;
use crate::stats::RunStats;

const WEEKDAY_LABELS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// The ordered collection of valid trips after cleaning. Owned by the
/// engine, read-only to downstream consumers.
#[derive(Debug, Default)]
pub struct TripTable {
    trips: Vec<TripRecord>,
}

impl TripTable {
    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn trips(&self) -> &[TripRecord] {
        &self.trips
    }
}

/// Second-pass filter: drops trips longer than the configured fixed
/// ceiling. The threshold is deliberately not statistically adaptive.
pub fn clean(records: Vec<TripRecord>, config: &Config, stats: &mut RunStats) -> TripTable {
    let before = records.len();
    let trips: Vec<TripRecord> = records
        .into_iter()
        .filter(|t| t.duration_minutes <= config.max_trip_minutes)
        .collect();

    stats.outliers_removed = before - trips.len();
    stats.trips_kept = trips.len();

    if stats.outliers_removed > 0 {
        info!(
            removed = stats.outliers_removed,
            ceiling_minutes = config.max_trip_minutes,
            "Outlier trips removed"
        );
    }

    TripTable { trips }
}

/// Computes the full [`MetricBundle`] from the cleaned table.
///
/// Metrics fail independently: a statistic that cannot be computed is
/// recorded as a [`MetricFailure`] and the rest of the bundle is still
/// produced.
pub fn compute_metrics(table: &TripTable, run: &RunStats, config: &Config) -> MetricBundle {
    let trips = table.trips();
    let mut failures = Vec::new();

    let durations: Vec<f64> = trips.iter().map(|t| t.duration_minutes).collect();

    let duration_stats = capture(&mut failures, "duration_stats", duration_stats(&durations));
    let duration_histogram = capture(
        &mut failures,
        "duration_histogram",
        numerical::histogram(&durations, config.histogram_buckets),
    );

    let bundle = MetricBundle {
        run: run.clone(),
        total_trips: trips.len(),
        total_distance_km: trips.iter().filter_map(|t| t.distance_km).sum(),
        avg_duration_minutes: duration_stats.as_ref().map(|s| s.mean),
        peak_hours: peak_hours(trips),
        busiest_weekday: busiest_weekday(trips),
        monthly_trend: monthly_trend(trips),
        top_users: top_users(trips, config.top_n),
        top_routes: top_routes(trips, config.top_n),
        station_counts: station_counts(trips, config.top_n),
        maintenance: maintenance_cost(trips, config),
        duration_stats,
        duration_histogram,
        duration_by_user_type: duration_by_user_type(trips),
        avg_distance_by_user_type: avg_distance_by_user_type(trips),
        revenue_by_user_type: revenue_by_user_type(trips, config),
        failures,
    };

    info!(
        trips = bundle.total_trips,
        months = bundle.monthly_trend.len(),
        failures = bundle.failures.len(),
        "Metrics computed"
    );
    bundle
}

/// Records a failed metric and maps the result into an `Option`.
fn capture<T>(
    failures: &mut Vec<MetricFailure>,
    metric: &str,
    result: Result<T, EmptyInputError>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(metric, reason = %e, "Metric unavailable");
            failures.push(MetricFailure {
                metric: metric.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

fn duration_stats(durations: &[f64]) -> Result<DurationStats, EmptyInputError> {
    Ok(DurationStats {
        mean: numerical::mean(durations)?,
        median: numerical::median(durations)?,
        std_dev: numerical::std_dev(durations)?,
        p25: numerical::percentile(durations, 25.0)?,
        p75: numerical::percentile(durations, 75.0)?,
        p90: numerical::percentile(durations, 90.0)?,
    })
}

/// Trips per start hour, ranked by count descending, earlier hour first.
fn peak_hours(trips: &[TripRecord]) -> Vec<HourCount> {
    let mut by_hour: BTreeMap<u32, usize> = BTreeMap::new();
    for trip in trips {
        *by_hour.entry(trip.start_time.hour()).or_default() += 1;
    }

    let mut ranked: Vec<HourCount> = by_hour
        .into_iter()
        .map(|(hour, trips)| HourCount { hour, trips })
        .collect();
    ranked.sort_by(|a, b| b.trips.cmp(&a.trips).then(a.hour.cmp(&b.hour)));
    ranked
}

/// Weekday with the most trips; ties resolve to the earlier weekday in
/// canonical Monday..Sunday order.
fn busiest_weekday(trips: &[TripRecord]) -> Option<WeekdayCount> {
    if trips.is_empty() {
        return None;
    }

    let mut counts = [0usize; 7];
    for trip in trips {
        counts[trip.start_time.weekday().num_days_from_monday() as usize] += 1;
    }

    let (best, &count) = counts
        .iter()
        .enumerate()
        .max_by(|&(i, a), &(j, b)| a.cmp(b).then(j.cmp(&i)))?;

    Some(WeekdayCount {
        weekday: WEEKDAY_LABELS[best].to_string(),
        trips: count,
    })
}

/// Trip counts per calendar month, chronologically ordered.
fn monthly_trend(trips: &[TripRecord]) -> Vec<MonthCount> {
    let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for trip in trips {
        let key = (trip.start_time.year(), trip.start_time.month());
        *by_month.entry(key).or_default() += 1;
    }

    by_month
        .into_iter()
        .map(|((year, month), trips)| MonthCount { year, month, trips })
        .collect()
}

/// Top-N users by trip count; ties broken by ascending user id. Trips
/// without a user id are excluded from the ranking.
fn top_users(trips: &[TripRecord], top_n: usize) -> Vec<UserCount> {
    let mut by_user: BTreeMap<&str, usize> = BTreeMap::new();
    for trip in trips {
        if let Some(user_id) = trip.user_id.as_deref() {
            *by_user.entry(user_id).or_default() += 1;
        }
    }

    let mut ranked: Vec<UserCount> = by_user
        .into_iter()
        .map(|(user_id, trips)| UserCount {
            user_id: user_id.to_string(),
            trips,
        })
        .collect();
    ranked.sort_by(|a, b| b.trips.cmp(&a.trips).then(a.user_id.cmp(&b.user_id)));
    ranked.truncate(top_n);
    ranked
}

/// Top-N (start, end) station pairs; ties broken by ascending pair.
fn top_routes(trips: &[TripRecord], top_n: usize) -> Vec<RouteCount> {
    let mut by_route: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for trip in trips {
        let key = (trip.start_station_id.as_str(), trip.end_station_id.as_str());
        *by_route.entry(key).or_default() += 1;
    }

    let mut ranked: Vec<RouteCount> = by_route
        .into_iter()
        .map(|((start, end), trips)| RouteCount {
            start_station_id: start.to_string(),
            end_station_id: end.to_string(),
            trips,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.trips.cmp(&a.trips).then_with(|| {
            (a.start_station_id.as_str(), a.end_station_id.as_str())
                .cmp(&(b.start_station_id.as_str(), b.end_station_id.as_str()))
        })
    });
    ranked.truncate(top_n);
    ranked
}

/// Top-N start stations by trip count; ties broken by ascending station id.
fn station_counts(trips: &[TripRecord], top_n: usize) -> Vec<StationCount> {
    let mut by_station: BTreeMap<&str, usize> = BTreeMap::new();
    for trip in trips {
        *by_station.entry(trip.start_station_id.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<StationCount> = by_station
        .into_iter()
        .map(|(station_id, trips)| StationCount {
            station_id: station_id.to_string(),
            trips,
        })
        .collect();
    ranked.sort_by(|a, b| b.trips.cmp(&a.trips).then(a.station_id.cmp(&b.station_id)));
    ranked.truncate(top_n);
    ranked
}

fn trip_maintenance_cost(trip: &TripRecord, config: &Config) -> f64 {
    config.maintenance.per_minute * trip.duration_minutes
        + config.maintenance.per_km * trip.distance_km.unwrap_or(0.0)
}

/// Per-trip maintenance estimate summed overall and, when configured,
/// grouped by start station (cost descending, station id ascending).
fn maintenance_cost(trips: &[TripRecord], config: &Config) -> MaintenanceSummary {
    let total = trips.iter().map(|t| trip_maintenance_cost(t, config)).sum();

    let by_station = match config.maintenance.grouping {
        MaintenanceGrouping::Overall => None,
        MaintenanceGrouping::ByStation => {
            let mut per_station: BTreeMap<&str, f64> = BTreeMap::new();
            for trip in trips {
                *per_station
                    .entry(trip.start_station_id.as_str())
                    .or_default() += trip_maintenance_cost(trip, config);
            }

            let mut ranked: Vec<StationCost> = per_station
                .into_iter()
                .map(|(station_id, cost)| StationCost {
                    station_id: station_id.to_string(),
                    cost,
                })
                .collect();
            ranked.sort_by(|a, b| {
                b.cost
                    .partial_cmp(&a.cost)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.station_id.cmp(&b.station_id))
            });
            Some(ranked)
        }
    };

    MaintenanceSummary { total, by_station }
}

fn trips_of_type(trips: &[TripRecord], user_type: UserType) -> Vec<&TripRecord> {
    trips.iter().filter(|t| t.user_type == user_type).collect()
}

/// Five-number duration summary per user type, in enum order. Types with
/// no trips are simply absent.
fn duration_by_user_type(trips: &[TripRecord]) -> Vec<UserTypeDurations> {
    [UserType::Casual, UserType::Member]
        .into_iter()
        .filter_map(|user_type| {
            let durations: Vec<f64> = trips_of_type(trips, user_type)
                .iter()
                .map(|t| t.duration_minutes)
                .collect();
            numerical::five_number_summary(&durations)
                .ok()
                .map(|summary| UserTypeDurations { user_type, summary })
        })
        .collect()
}

/// Mean trip distance per user type, over trips that carry a distance.
fn avg_distance_by_user_type(trips: &[TripRecord]) -> Vec<UserTypeAverage> {
    [UserType::Casual, UserType::Member]
        .into_iter()
        .filter_map(|user_type| {
            let distances: Vec<f64> = trips_of_type(trips, user_type)
                .iter()
                .filter_map(|t| t.distance_km)
                .collect();
            numerical::mean(&distances).ok().map(|value| UserTypeAverage {
                user_type,
                trips: distances.len(),
                value,
            })
        })
        .collect()
}

/// Estimated revenue per user type under the selected pricing strategy,
/// peak surcharge included.
fn revenue_by_user_type(trips: &[TripRecord], config: &Config) -> Vec<UserTypeRevenue> {
    [UserType::Casual, UserType::Member]
        .into_iter()
        .filter_map(|user_type| {
            let of_type = trips_of_type(trips, user_type);
            if of_type.is_empty() {
                return None;
            }
            let strategy = strategy_for(user_type, &config.peak_window);
            let revenue = of_type
                .iter()
                .map(|t| strategy.cost(t.duration_minutes, t.start_time))
                .sum();
            Some(UserTypeRevenue {
                user_type,
                trips: of_type.len(),
                revenue,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn trip(
        id: &str,
        start: &str,
        duration: f64,
        from: &str,
        to: &str,
        user_type: UserType,
        user_id: &str,
    ) -> TripRecord {
        let start_time =
            NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M:%S").expect("test timestamp");
        TripRecord {
            trip_id: id.to_string(),
            start_time,
            end_time: start_time + chrono::Duration::minutes(duration as i64),
            start_station_id: from.to_string(),
            end_station_id: to.to_string(),
            user_type,
            user_id: Some(user_id.to_string()),
            duration_minutes: duration,
            distance_km: Some(duration / 5.0),
        }
    }

    fn table(trips: Vec<TripRecord>) -> TripTable {
        TripTable { trips }
    }

    fn bundle_for(trips: Vec<TripRecord>) -> MetricBundle {
        compute_metrics(&table(trips), &RunStats::default(), &Config::default())
    }

    #[test]
    fn test_clean_removes_only_trips_over_ceiling() {
        let records = vec![
            trip("t1", "2024-01-08 08:00:00", 30.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 09:00:00", 500.0, "A", "B", UserType::Casual, "u1"),
            trip("t3", "2024-01-08 10:00:00", 480.0, "A", "B", UserType::Member, "u2"),
        ];
        let mut stats = RunStats::default();
        let table = clean(records, &Config::default(), &mut stats);

        assert_eq!(table.len(), 2);
        assert_eq!(stats.outliers_removed, 1);
        assert_eq!(stats.trips_kept, 2);
    }

    #[test]
    fn test_busiest_station_scenario() {
        // Mirrors the three-row scenario: the invalid row never reaches the
        // engine, so two trips from station A remain.
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 09:00:00", 15.0, "A", "C", UserType::Member, "u2"),
        ]);

        assert_eq!(bundle.total_trips, 2);
        let top = &bundle.station_counts[0];
        assert_eq!(top.station_id, "A");
        assert_eq!(top.trips, 2);
    }

    #[test]
    fn test_monthly_trend_chronological() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-02-10 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-05 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t3", "2024-01-20 08:00:00", 10.0, "A", "B", UserType::Member, "u2"),
        ]);

        let labels: Vec<String> = bundle.monthly_trend.iter().map(|m| m.label()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02"]);
        assert_eq!(bundle.monthly_trend[0].trips, 2);
        assert_eq!(bundle.monthly_trend[1].trips, 1);
    }

    #[test]
    fn test_top_users_tie_broken_by_ascending_id() {
        let mut trips = Vec::new();
        for i in 0..3 {
            trips.push(trip(
                &format!("a{i}"),
                "2024-01-08 08:00:00",
                10.0,
                "A",
                "B",
                UserType::Casual,
                "u2",
            ));
            trips.push(trip(
                &format!("b{i}"),
                "2024-01-08 09:00:00",
                10.0,
                "A",
                "B",
                UserType::Member,
                "u1",
            ));
        }
        let bundle = bundle_for(trips);

        assert_eq!(bundle.top_users.len(), 2);
        assert_eq!(bundle.top_users[0].user_id, "u1");
        assert_eq!(bundle.top_users[0].trips, 3);
        assert_eq!(bundle.top_users[1].user_id, "u2");
    }

    #[test]
    fn test_top_users_truncates_to_n() {
        let mut trips = Vec::new();
        for i in 0..15 {
            trips.push(trip(
                &format!("t{i}"),
                "2024-01-08 08:00:00",
                10.0,
                "A",
                "B",
                UserType::Casual,
                &format!("u{i:02}"),
            ));
        }
        let config = Config {
            top_n: 5,
            ..Config::default()
        };
        let bundle = compute_metrics(&table(trips), &RunStats::default(), &config);
        assert_eq!(bundle.top_users.len(), 5);
    }

    #[test]
    fn test_peak_hours_tie_prefers_earlier_hour() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 17:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
        ]);

        assert_eq!(bundle.peak_hours[0].hour, 8);
        assert_eq!(bundle.peak_hours[1].hour, 17);
    }

    #[test]
    fn test_busiest_weekday_tie_prefers_canonical_order() {
        // One trip on a Wednesday, one on a Monday: tie resolves to Monday.
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-10 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 08:00:00", 10.0, "A", "B", UserType::Member, "u2"),
        ]);

        let busiest = bundle.busiest_weekday.unwrap();
        assert_eq!(busiest.weekday, "Monday");
        assert_eq!(busiest.trips, 1);
    }

    #[test]
    fn test_top_routes_tie_broken_by_pair() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 08:00:00", 10.0, "B", "C", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 09:00:00", 10.0, "A", "Z", UserType::Casual, "u1"),
        ]);

        assert_eq!(bundle.top_routes[0].start_station_id, "A");
        assert_eq!(bundle.top_routes[1].start_station_id, "B");
    }

    #[test]
    fn test_maintenance_by_station_sums() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 09:00:00", 20.0, "B", "A", UserType::Member, "u2"),
        ]);

        // defaults: 0.05/min + 0.02/km, distance = duration / 5
        let t1 = 0.05 * 10.0 + 0.02 * 2.0;
        let t2 = 0.05 * 20.0 + 0.02 * 4.0;
        assert!((bundle.maintenance.total - (t1 + t2)).abs() < 1e-9);

        let by_station = bundle.maintenance.by_station.unwrap();
        assert_eq!(by_station[0].station_id, "B");
        assert!((by_station[0].cost - t2).abs() < 1e-9);
    }

    #[test]
    fn test_empty_table_records_failures_not_panics() {
        let bundle = bundle_for(vec![]);

        assert_eq!(bundle.total_trips, 0);
        assert!(bundle.duration_stats.is_none());
        assert!(bundle.duration_histogram.is_none());
        assert!(bundle.busiest_weekday.is_none());
        assert!(bundle.peak_hours.is_empty());
        assert!(bundle.failures.iter().any(|f| f.metric == "duration_stats"));
        assert!(
            bundle
                .failures
                .iter()
                .any(|f| f.metric == "duration_histogram")
        );
    }

    #[test]
    fn test_revenue_member_cheaper_than_casual() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 12:00:00", 20.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 12:00:00", 20.0, "A", "B", UserType::Member, "u2"),
        ]);

        let casual = bundle
            .revenue_by_user_type
            .iter()
            .find(|r| r.user_type == UserType::Casual)
            .unwrap();
        let member = bundle
            .revenue_by_user_type
            .iter()
            .find(|r| r.user_type == UserType::Member)
            .unwrap();
        assert!(casual.revenue > member.revenue);
    }

    #[test]
    fn test_duration_by_user_type_summaries() {
        let bundle = bundle_for(vec![
            trip("t1", "2024-01-08 08:00:00", 10.0, "A", "B", UserType::Casual, "u1"),
            trip("t2", "2024-01-08 09:00:00", 30.0, "A", "B", UserType::Casual, "u1"),
        ]);

        assert_eq!(bundle.duration_by_user_type.len(), 1);
        let casual = &bundle.duration_by_user_type[0];
        assert_eq!(casual.user_type, UserType::Casual);
        assert_eq!(casual.summary.min, 10.0);
        assert_eq!(casual.summary.max, 30.0);
        assert_eq!(casual.summary.median, 20.0);
    }
}
