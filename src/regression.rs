//! Least-squares trend models for slide-rail channel histories.
//!
//! Two closed-form fits: ordinary least-squares linear regression, and
//! degree-2 polynomial regression solved from the 3x3 normal equations by
//! Cramer's rule. A singular normal matrix (constant x, too few distinct
//! points) downgrades the quadratic fit to the linear one - callers must
//! match on the returned variant, not assume degree 2 succeeded.

use serde::{Deserialize, Serialize};

/// Determinant magnitude below which the normal equations are treated as
/// singular and the quadratic fit falls back to linear.
const SINGULAR_EPS: f64 = 1e-10;

/// A fitted trend model. The discriminant is explicit: exactly one shape is
/// active and callers branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum RegressionModel {
    /// `y = slope * x + intercept`
    Linear { slope: f64, intercept: f64 },
    /// `y = a + b * x + c * x^2`
    Quadratic { a: f64, b: f64, c: f64 },
}

/// Ordinary least-squares linear fit.
///
/// `slope = (n * sum(xy) - sum(x) * sum(y)) / (n * sum(x^2) - sum(x)^2)`.
/// Degenerate x (zero denominator) propagates per IEEE-754; the quadratic
/// path guards this via its singularity fallback, and trend analysis guards
/// it via the clamped R².
pub fn fit_linear(x: &[f64], y: &[f64]) -> RegressionModel {
    let n = x.len() as f64;
    let sum_x: f64 = x.iter().sum();
    let sum_y: f64 = y.iter().sum();
    let sum_xy: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let sum_xx: f64 = x.iter().map(|a| a * a).sum();

    let slope = (n * sum_xy - sum_x * sum_y) / (n * sum_xx - sum_x * sum_x);
    let intercept = (sum_y - slope * sum_x) / n;

    RegressionModel::Linear { slope, intercept }
}

/// Degree-2 polynomial fit via the 3x3 normal equations and Cramer's rule.
///
/// Returns [`RegressionModel::Quadratic`] on success. When the normal
/// matrix determinant is within [`SINGULAR_EPS`] of zero the system is
/// unsolvable and the result is `fit_linear(x, y)` instead.
pub fn fit_quadratic(x: &[f64], y: &[f64]) -> RegressionModel {
    // Power sums s_k = sum(x^k) and mixed sums t_k = sum(x^k * y)
    let s0 = x.len() as f64;
    let s1: f64 = x.iter().sum();
    let s2: f64 = x.iter().map(|v| v.powi(2)).sum();
    let s3: f64 = x.iter().map(|v| v.powi(3)).sum();
    let s4: f64 = x.iter().map(|v| v.powi(4)).sum();

    let t0: f64 = y.iter().sum();
    let t1: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * b).sum();
    let t2: f64 = x.iter().zip(y.iter()).map(|(a, b)| a * a * b).sum();

    let m = [[s0, s1, s2], [s1, s2, s3], [s2, s3, s4]];
    let det = det3(&m);

    if det.abs() < SINGULAR_EPS || !det.is_finite() {
        return fit_linear(x, y);
    }

    let v = [t0, t1, t2];
    let a = det3(&replace_column(&m, 0, &v)) / det;
    let b = det3(&replace_column(&m, 1, &v)) / det;
    let c = det3(&replace_column(&m, 2, &v)) / det;

    RegressionModel::Quadratic { a, b, c }
}

/// Evaluate a fitted model at each of the given x values.
pub fn predict(model: &RegressionModel, xs: &[f64]) -> Vec<f64> {
    match *model {
        RegressionModel::Linear { slope, intercept } => {
            xs.iter().map(|&x| slope * x + intercept).collect()
        }
        RegressionModel::Quadratic { a, b, c } => {
            xs.iter().map(|&x| a + b * x + c * x * x).collect()
        }
    }
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// Clamped to [0, 1]; a non-finite raw value (constant signal, so
/// `SS_tot = 0`) substitutes 0.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return 0.0;
    }

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    let raw = 1.0 - ss_res / ss_tot;
    if !raw.is_finite() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn replace_column(m: &[[f64; 3]; 3], col: usize, v: &[f64; 3]) -> [[f64; 3]; 3] {
    let mut out = *m;
    for row in 0..3 {
        out[row][col] = v[row];
    }
    out
}
