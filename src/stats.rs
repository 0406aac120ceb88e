//! Row accounting for one pipeline run.
//!
//! Every row read from the input ends up in exactly one bucket: kept, or
//! one of the per-reason drop counters. The report header surfaces these
//! numbers so an analyst can see how much data survived cleaning.

use serde::Serialize;

use crate::model::RowError;

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub files_read: usize,
    pub rows_read: usize,

    // load-stage drops
    pub malformed_rows: usize,
    pub bad_timestamps: usize,
    pub bad_durations: usize,
    pub missing_stations: usize,
    pub bad_user_types: usize,
    pub duplicate_trip_ids: usize,

    // clean-stage drops
    pub outliers_removed: usize,

    /// Valid trips after the load stage, before outlier cleaning.
    pub trips_loaded: usize,
    /// Trips remaining in the table after cleaning.
    pub trips_kept: usize,
}

impl RunStats {
    /// Total rows dropped during the load stage.
    pub fn dropped(&self) -> usize {
        self.malformed_rows
            + self.bad_timestamps
            + self.bad_durations
            + self.missing_stations
            + self.bad_user_types
            + self.duplicate_trip_ids
    }

    pub fn record_drop(&mut self, reason: &RowError) {
        match reason {
            RowError::BadTimestamp => self.bad_timestamps += 1,
            RowError::BadDuration => self.bad_durations += 1,
            RowError::MissingStation => self.missing_stations += 1,
            RowError::BadUserType => self.bad_user_types += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_sums_all_reasons() {
        let stats = RunStats {
            malformed_rows: 1,
            bad_timestamps: 2,
            bad_durations: 3,
            missing_stations: 4,
            bad_user_types: 5,
            duplicate_trip_ids: 6,
            ..RunStats::default()
        };
        assert_eq!(stats.dropped(), 21);
    }

    #[test]
    fn test_record_drop_routes_to_counter() {
        let mut stats = RunStats::default();
        stats.record_drop(&RowError::BadDuration);
        stats.record_drop(&RowError::BadDuration);
        stats.record_drop(&RowError::MissingStation);
        assert_eq!(stats.bad_durations, 2);
        assert_eq!(stats.missing_stations, 1);
        assert_eq!(stats.dropped(), 3);
    }
}
