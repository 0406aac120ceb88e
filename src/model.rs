//! Trip record types and row-level validation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted timestamp layouts, tried in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Rider category, used for pricing selection and per-type breakdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Casual,
    Member,
}

impl UserType {
    pub fn label(self) -> &'static str {
        match self {
            UserType::Casual => "casual",
            UserType::Member => "member",
        }
    }

    /// Parses a raw CSV value, tolerating case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<UserType> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "casual" => Some(UserType::Casual),
            "member" => Some(UserType::Member),
            _ => None,
        }
    }
}

/// One CSV row as read from disk, before any validation.
///
/// Everything beyond the timestamps is optional at this layer so a partial
/// row still deserializes and can be rejected with a precise reason.
#[derive(Debug, Deserialize)]
pub struct RawTripRow {
    pub trip_id: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub start_station_id: Option<String>,
    #[serde(default)]
    pub end_station_id: Option<String>,
    pub user_type: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

/// Why a row was rejected during load.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("unparseable timestamp")]
    BadTimestamp,
    #[error("non-positive or underivable duration")]
    BadDuration,
    #[error("missing station identifier")]
    MissingStation,
    #[error("unknown user type")]
    BadUserType,
}

/// One validated bike-share trip. Immutable for the rest of the run.
#[derive(Debug, Clone, Serialize)]
pub struct TripRecord {
    pub trip_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub start_station_id: String,
    pub end_station_id: String,
    pub user_type: UserType,
    pub user_id: Option<String>,
    pub duration_minutes: f64,
    pub distance_km: Option<f64>,
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let s = s.trim().to_string();
        if s.is_empty() { None } else { Some(s) }
    })
}

impl TripRecord {
    /// Validates a raw row into a [`TripRecord`].
    ///
    /// Duration comes from the `duration_minutes` column when present,
    /// otherwise it is derived from the timestamps. Rows with `end < start`,
    /// a non-positive duration, a missing station, or an unknown user type
    /// are rejected with the matching [`RowError`].
    pub fn from_raw(raw: RawTripRow) -> Result<TripRecord, RowError> {
        let start_time = parse_timestamp(&raw.start_time).ok_or(RowError::BadTimestamp)?;
        let end_time = parse_timestamp(&raw.end_time).ok_or(RowError::BadTimestamp)?;
        if end_time < start_time {
            return Err(RowError::BadTimestamp);
        }

        let duration_minutes = match raw.duration_minutes {
            Some(minutes) => minutes,
            None => (end_time - start_time).num_seconds() as f64 / 60.0,
        };
        if !duration_minutes.is_finite() || duration_minutes <= 0.0 {
            return Err(RowError::BadDuration);
        }

        let start_station_id = non_blank(raw.start_station_id).ok_or(RowError::MissingStation)?;
        let end_station_id = non_blank(raw.end_station_id).ok_or(RowError::MissingStation)?;

        let user_type = UserType::parse(&raw.user_type).ok_or(RowError::BadUserType)?;

        let distance_km = raw.distance_km.filter(|d| d.is_finite() && *d >= 0.0);

        Ok(TripRecord {
            trip_id: raw.trip_id.trim().to_string(),
            start_time,
            end_time,
            start_station_id,
            end_station_id,
            user_type,
            user_id: non_blank(raw.user_id),
            duration_minutes,
            distance_km,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> RawTripRow {
        RawTripRow {
            trip_id: "t1".to_string(),
            start_time: "2024-01-08 08:00:00".to_string(),
            end_time: "2024-01-08 08:20:00".to_string(),
            start_station_id: Some("S1".to_string()),
            end_station_id: Some("S2".to_string()),
            user_type: "casual".to_string(),
            user_id: Some("u1".to_string()),
            duration_minutes: Some(20.0),
            distance_km: Some(3.5),
        }
    }

    #[test]
    fn test_valid_row() {
        let trip = TripRecord::from_raw(raw_row()).unwrap();
        assert_eq!(trip.trip_id, "t1");
        assert_eq!(trip.user_type, UserType::Casual);
        assert_eq!(trip.duration_minutes, 20.0);
    }

    #[test]
    fn test_duration_derived_from_timestamps() {
        let mut raw = raw_row();
        raw.duration_minutes = None;
        let trip = TripRecord::from_raw(raw).unwrap();
        assert_eq!(trip.duration_minutes, 20.0);
    }

    #[test]
    fn test_negative_duration_rejected() {
        let mut raw = raw_row();
        raw.duration_minutes = Some(-5.0);
        assert_eq!(TripRecord::from_raw(raw).unwrap_err(), RowError::BadDuration);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let mut raw = raw_row();
        raw.end_time = "2024-01-08 07:00:00".to_string();
        assert_eq!(TripRecord::from_raw(raw).unwrap_err(), RowError::BadTimestamp);
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let mut raw = raw_row();
        raw.start_time = "not-a-date".to_string();
        assert_eq!(TripRecord::from_raw(raw).unwrap_err(), RowError::BadTimestamp);
    }

    #[test]
    fn test_blank_station_rejected() {
        let mut raw = raw_row();
        raw.end_station_id = Some("   ".to_string());
        assert_eq!(TripRecord::from_raw(raw).unwrap_err(), RowError::MissingStation);
    }

    #[test]
    fn test_unknown_user_type_rejected() {
        let mut raw = raw_row();
        raw.user_type = "corporate".to_string();
        assert_eq!(TripRecord::from_raw(raw).unwrap_err(), RowError::BadUserType);
    }

    #[test]
    fn test_user_type_normalized() {
        let mut raw = raw_row();
        raw.user_type = "  Member ".to_string();
        let trip = TripRecord::from_raw(raw).unwrap();
        assert_eq!(trip.user_type, UserType::Member);
    }

    #[test]
    fn test_negative_distance_treated_as_missing() {
        let mut raw = raw_row();
        raw.distance_km = Some(-1.0);
        let trip = TripRecord::from_raw(raw).unwrap();
        assert_eq!(trip.distance_km, None);
    }

    #[test]
    fn test_iso_t_separator_accepted() {
        let mut raw = raw_row();
        raw.start_time = "2024-01-08T08:00:00".to_string();
        assert!(TripRecord::from_raw(raw).is_ok());
    }
}
