//! Rolling statistical baseline and anomaly detection.
//!
//! A baseline is the mean/std envelope of the historical points that fall
//! inside a recency window, with bounds at mean +/- sigma * std (sigma is
//! 3.0 by default). Samples strictly outside the bounds are anomalies.
//!
//! An empty window is a typed error, not a null: the reference behavior of
//! handing a missing baseline straight into anomaly detection was a latent
//! crash, and callers here are forced to handle it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats;

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("no historical points within the last {window_days} day(s)")]
    EmptyWindow { window_days: u32 },
}

/// A timestamped historical sample for one channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Statistical envelope derived from a recency-filtered history window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BaselineModel {
    pub mean: f64,
    pub std_dev: f64,
    /// `mean + sigma * std_dev`
    pub upper_bound: f64,
    /// `mean - sigma * std_dev`
    pub lower_bound: f64,
    /// Points that survived the recency filter
    pub sample_count: usize,
}

/// Build a baseline from historical points within the recency window.
///
/// Points with `now - timestamp <= window_days * 86400 s` are kept (future
/// timestamps pass trivially). `now` is a parameter rather than sampled
/// internally so windows are reproducible under test.
pub fn build_baseline(
    points: &[HistoricalPoint],
    window_days: u32,
    sigma: f64,
    now: DateTime<Utc>,
) -> Result<BaselineModel, BaselineError> {
    let cutoff = now - Duration::seconds(i64::from(window_days) * 86_400);
    let values: Vec<f64> = points
        .iter()
        .filter(|p| p.timestamp >= cutoff)
        .map(|p| p.value)
        .collect();

    if values.is_empty() {
        return Err(BaselineError::EmptyWindow { window_days });
    }

    let stats = stats::describe(&values);
    Ok(BaselineModel {
        mean: stats.mean,
        std_dev: stats.std_dev,
        upper_bound: stats.mean + sigma * stats.std_dev,
        lower_bound: stats.mean - sigma * stats.std_dev,
        sample_count: values.len(),
    })
}

/// Samples strictly outside `[lower_bound, upper_bound]`.
pub fn detect_anomalies(signal: &[f64], baseline: &BaselineModel) -> Vec<f64> {
    signal
        .iter()
        .copied()
        .filter(|&v| v > baseline.upper_bound || v < baseline.lower_bound)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points_at_seconds_ago(values: &[f64], now: DateTime<Utc>) -> Vec<HistoricalPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| HistoricalPoint {
                timestamp: now - Duration::seconds((values.len() - i) as i64),
                value,
            })
            .collect()
    }

    #[test]
    fn test_baseline_mean_and_bounds() {
        let now = Utc::now();
        // Values near 10 with small spread
        let values: Vec<f64> = (0..100)
            .map(|i| 10.0 + if i % 2 == 0 { 0.1 } else { -0.1 })
            .collect();
        let points = points_at_seconds_ago(&values, now);

        let baseline = build_baseline(&points, 30, 3.0, now).unwrap();
        assert!((baseline.mean - 10.0).abs() < 0.01);
        assert_eq!(baseline.sample_count, 100);
        assert!((baseline.upper_bound - (baseline.mean + 3.0 * baseline.std_dev)).abs() < 1e-12);
        assert!((baseline.lower_bound - (baseline.mean - 3.0 * baseline.std_dev)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_window_is_error() {
        let now = Utc::now();
        let stale = vec![HistoricalPoint {
            timestamp: now - Duration::days(90),
            value: 1.0,
        }];

        let result = build_baseline(&stale, 30, 3.0, now);
        assert!(matches!(
            result,
            Err(BaselineError::EmptyWindow { window_days: 30 })
        ));

        let result = build_baseline(&[], 7, 3.0, now);
        assert!(result.is_err());
    }

    #[test]
    fn test_recency_filter_drops_old_points() {
        let now = Utc::now();
        let mut points = points_at_seconds_ago(&[5.0; 50], now);
        // An ancient outlier outside the window must not poison the mean
        points.push(HistoricalPoint {
            timestamp: now - Duration::days(31),
            value: 1_000_000.0,
        });

        let baseline = build_baseline(&points, 30, 3.0, now).unwrap();
        assert_eq!(baseline.sample_count, 50);
        assert!((baseline.mean - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_detect_anomalies_flags_excursion() {
        let now = Utc::now();
        let values: Vec<f64> = (0..200).map(|i| 10.0 + ((i % 7) as f64 - 3.0) * 0.1).collect();
        let points = points_at_seconds_ago(&values, now);
        let baseline = build_baseline(&points, 30, 3.0, now).unwrap();

        let spike = 10.0 + 10.0 * baseline.std_dev;
        let anomalies = detect_anomalies(&[10.0, spike, 9.9], &baseline);
        assert_eq!(anomalies.len(), 1);
        assert!((anomalies[0] - spike).abs() < 1e-12);
    }

    #[test]
    fn test_in_bounds_samples_pass() {
        let baseline = BaselineModel {
            mean: 0.0,
            std_dev: 1.0,
            upper_bound: 3.0,
            lower_bound: -3.0,
            sample_count: 10,
        };
        // Boundary values are not strictly outside
        let anomalies = detect_anomalies(&[3.0, -3.0, 0.0, 2.99], &baseline);
        assert!(anomalies.is_empty());
    }
}
