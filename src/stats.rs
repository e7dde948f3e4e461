//! Descriptive statistics and correlation for sensor sequences.
//!
//! All routines substitute defined finite values for numeric degeneracy:
//! empty input yields zeros, zero-variance correlation yields 0 rather than
//! NaN. Significance testing uses the statrs Student's-t CDF.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Summary statistics over a numeric sequence.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SignalStats {
    pub mean: f64,
    /// Population variance (divide by n, matching the reference behavior)
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    /// Average of the two middle sorted values for even length
    pub median: f64,
}

/// Compute summary statistics for a signal.
///
/// Returns all-zero stats for an empty slice - degeneracy is handled locally
/// per the error-handling contract, never surfaced as NaN.
pub fn describe(signal: &[f64]) -> SignalStats {
    let n = signal.len();
    if n == 0 {
        return SignalStats::default();
    }

    let nf = n as f64;
    let mean = signal.iter().sum::<f64>() / nf;
    let variance = signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;
    let std_dev = variance.sqrt();

    let mut sorted = signal.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };

    SignalStats {
        mean,
        variance,
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        median,
    }
}

/// Pearson correlation coefficient between two equal-length sequences.
///
/// Returns exactly `0` when the denominator is zero (constant series) or
/// when the inputs are empty or length-mismatched.
pub fn correlate(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n == 0 || n != y.len() {
        return 0.0;
    }

    let nf = n as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_x2: f64 = x.iter().map(|a| a * a).sum();
    let sum_y2: f64 = y.iter().map(|a| a * a).sum();

    let numerator = nf * sum_xy - sum_x * sum_y;
    let denominator = ((nf * sum_x2 - sum_x.powi(2)) * (nf * sum_y2 - sum_y.powi(2))).sqrt();

    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        numerator / denominator
    }
}

/// Two-tailed p-value for a Pearson correlation coefficient.
///
/// `t = r * sqrt(n-2) / sqrt(1-r^2)` against a Student's-t distribution
/// with `n-2` degrees of freedom. Returns `1.0` when the sample is too
/// small for the test to mean anything.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    if r.abs() >= 0.9999 {
        return 0.0;
    }

    let df = (n - 2) as f64;
    let t_stat = r * df.sqrt() / (1.0 - r * r).sqrt();

    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_stat.abs())),
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_known_values() {
        let stats = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((stats.mean - 5.0).abs() < 1e-9);
        // Population variance: 32 / 8 = 4.0
        assert!((stats.variance - 4.0).abs() < 1e-9);
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        // Even length: average of 4th and 5th sorted values (4 + 5) / 2
        assert!((stats.median - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_median_odd_length() {
        let stats = describe(&[9.0, 1.0, 5.0]);
        assert_eq!(stats.median, 5.0);
    }

    #[test]
    fn test_describe_empty_is_zeroed() {
        let stats = describe(&[]);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.median, 0.0);
    }

    #[test]
    fn test_self_correlation_is_one() {
        let x: Vec<f64> = (0..50).map(|i| (i as f64 * 0.7).sin()).collect();
        assert!((correlate(&x, &x) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_series_correlation_is_zero() {
        let x = vec![3.0; 40];
        let r = correlate(&x, &x);
        assert_eq!(r, 0.0, "zero variance must give 0, not NaN");
    }

    #[test]
    fn test_anti_correlation() {
        let x: Vec<f64> = (0..30).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..30).map(|i| 30.0 - i as f64).collect();
        assert!((correlate(&x, &y) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_length_mismatch_is_zero() {
        assert_eq!(correlate(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_p_value_strong_correlation_significant() {
        let p = correlation_p_value(0.9, 100);
        assert!(p < 0.001, "r=0.9 n=100 should be highly significant, p={p}");
    }

    #[test]
    fn test_p_value_weak_correlation_not_significant() {
        let p = correlation_p_value(0.05, 30);
        assert!(p > 0.5, "r=0.05 n=30 should not be significant, p={p}");
    }

    #[test]
    fn test_p_value_tiny_sample() {
        assert_eq!(correlation_p_value(0.99, 2), 1.0);
    }
}
