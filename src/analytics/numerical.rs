//! Pure summary statistics over numeric slices.
//!
//! Every function rejects empty input with [`EmptyInputError`] instead of
//! returning a degenerate value, so callers decide how a missing metric is
//! reported.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("empty input sequence")]
pub struct EmptyInputError;

/// One equal-width histogram bucket: `[lower, upper)` except the last
/// bucket, which includes its upper bound.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Minimum, quartiles, and maximum of a sample.
#[derive(Debug, Clone, Serialize)]
pub struct FiveNumberSummary {
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

pub fn mean(values: &[f64]) -> Result<f64, EmptyInputError> {
    if values.is_empty() {
        return Err(EmptyInputError);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Result<f64, EmptyInputError> {
    percentile(values, 50.0)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Result<f64, EmptyInputError> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Ok(variance.sqrt())
}

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is clamped to `[0, 100]`; `percentile(v, 0.0)` and
/// `percentile(v, 100.0)` are the minimum and maximum.
pub fn percentile(values: &[f64], p: f64) -> Result<f64, EmptyInputError> {
    if values.is_empty() {
        return Err(EmptyInputError);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Ok(sorted[lo]);
    }
    let weight = rank - lo as f64;
    Ok(sorted[lo] * (1.0 - weight) + sorted[hi] * weight)
}

pub fn five_number_summary(values: &[f64]) -> Result<FiveNumberSummary, EmptyInputError> {
    Ok(FiveNumberSummary {
        min: percentile(values, 0.0)?,
        p25: percentile(values, 25.0)?,
        median: percentile(values, 50.0)?,
        p75: percentile(values, 75.0)?,
        max: percentile(values, 100.0)?,
    })
}

/// Splits the value range into `buckets` equal-width bins and counts how
/// many values land in each.
///
/// A single distinct value produces one bucket holding everything.
pub fn histogram(values: &[f64], buckets: usize) -> Result<Vec<HistogramBucket>, EmptyInputError> {
    if values.is_empty() || buckets == 0 {
        return Err(EmptyInputError);
    }

    let min = percentile(values, 0.0)?;
    let max = percentile(values, 100.0)?;

    if min == max {
        return Ok(vec![HistogramBucket {
            lower: min,
            upper: max,
            count: values.len(),
        }]);
    }

    let width = (max - min) / buckets as f64;
    let mut counts = vec![0usize; buckets];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(buckets - 1);
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_statistic_rejects_empty_input() {
        let empty: [f64; 0] = [];
        assert_eq!(mean(&empty).unwrap_err(), EmptyInputError);
        assert_eq!(median(&empty).unwrap_err(), EmptyInputError);
        assert_eq!(std_dev(&empty).unwrap_err(), EmptyInputError);
        assert_eq!(percentile(&empty, 50.0).unwrap_err(), EmptyInputError);
        assert_eq!(five_number_summary(&empty).unwrap_err(), EmptyInputError);
        assert_eq!(histogram(&empty, 10).unwrap_err(), EmptyInputError);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10.0, 20.0, 30.0]).unwrap(), 20.0);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]).unwrap(), 2.5);
    }

    #[test]
    fn test_std_dev() {
        // population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_extremes_and_interpolation() {
        let values = [10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 0.0).unwrap(), 10.0);
        assert_eq!(percentile(&values, 100.0).unwrap(), 40.0);
        assert_eq!(percentile(&values, 50.0).unwrap(), 25.0);
    }

    #[test]
    fn test_five_number_summary() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let s = five_number_summary(&values).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.median, 3.0);
        assert_eq!(s.max, 5.0);
        assert_eq!(s.p25, 2.0);
        assert_eq!(s.p75, 4.0);
    }

    #[test]
    fn test_histogram_counts_cover_all_values() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let buckets = histogram(&values, 3).unwrap();
        assert_eq!(buckets.len(), 3);
        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, values.len());
        // the max lands in the last bucket, not past it
        assert_eq!(buckets.last().unwrap().upper, 10.0);
    }

    #[test]
    fn test_histogram_single_value_collapses_to_one_bucket() {
        let buckets = histogram(&[5.0, 5.0, 5.0], 10).unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 3);
    }
}
