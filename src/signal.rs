//! Synthetic slide-rail sensor signals and single-pole filters.
//!
//! Each monitored channel kind has a fixed closed-form model: a sum of
//! sinusoids (plus a linear drift term for strain) with uniform noise scaled
//! per kind. The coefficients are calibrated to the reference channel
//! behavior and must not drift - downstream spectrum tests depend on them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Named signal classes for the monitored sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Rail displacement: 2 Hz dominant plus a 5 Hz component
    Displacement,
    /// Acceleration: 1.5 Hz dominant plus an 8 Hz high-frequency component
    Acceleration,
    /// Strain: 3 Hz dominant plus slow linear drift
    Strain,
    /// Vibration: multi-component 2.5 / 7 / 15 Hz
    Vibration,
    /// Fallback: plain 1 Hz sinusoid
    Default,
}

impl SignalKind {
    /// Parse a data-source selector key.
    ///
    /// Empty keys mean "nothing selected" and return `None`; unrecognized
    /// keys fall back to [`SignalKind::Default`], matching the reference
    /// selector behavior.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some(match key {
            "displacement" => Self::Displacement,
            "acceleration" => Self::Acceleration,
            "strain" => Self::Strain,
            "vibration" => Self::Vibration,
            _ => Self::Default,
        })
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            Self::Displacement => "displacement",
            Self::Acceleration => "acceleration",
            Self::Strain => "strain",
            Self::Vibration => "vibration",
            Self::Default => "default",
        };
        write!(f, "{key}")
    }
}

/// Generate a synthetic time-domain signal for a channel kind.
///
/// Produces `duration_s * sampling_rate` samples, sample `i` evaluated at
/// `t = i / sampling_rate`. Noise is uniform in [-0.5, 0.5] scaled by a
/// kind-specific coefficient.
pub fn generate(kind: SignalKind, duration_s: f64, sampling_rate: f64) -> Vec<f64> {
    let samples = (duration_s * sampling_rate) as usize;
    let time_step = 1.0 / sampling_rate;
    let mut rng = rand::thread_rng();

    (0..samples)
        .map(|i| {
            let t = i as f64 * time_step;
            let noise = rng.gen::<f64>() - 0.5;
            match kind {
                SignalKind::Displacement => {
                    2.0 * (2.0 * PI * 2.0 * t).sin()
                        + 0.5 * (2.0 * PI * 5.0 * t).sin()
                        + 0.2 * noise
                }
                SignalKind::Acceleration => {
                    1.5 * (2.0 * PI * 1.5 * t).sin()
                        + 0.8 * (2.0 * PI * 8.0 * t).sin()
                        + 0.3 * noise
                }
                SignalKind::Strain => {
                    3.0 * (2.0 * PI * 3.0 * t).sin() + 0.1 * t + 0.4 * noise
                }
                SignalKind::Vibration => {
                    2.0 * (2.0 * PI * 2.5 * t).sin()
                        + 1.0 * (2.0 * PI * 7.0 * t).sin()
                        + 0.5 * (2.0 * PI * 15.0 * t).sin()
                        + 0.3 * noise
                }
                SignalKind::Default => (2.0 * PI * t).sin() + 0.1 * noise,
            }
        })
        .collect()
}

/// Single-pole recursive filter variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass,
    Highpass,
    /// Approximate bandpass: lowpass at 2x cutoff composed with highpass at
    /// 0.5x cutoff. Not a true bandpass - the rolloff is a single pole on
    /// each side.
    Bandpass,
}

impl FilterKind {
    /// Parse a filter selector key. Unknown keys are `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "lowpass" => Some(Self::Lowpass),
            "highpass" => Some(Self::Highpass),
            "bandpass" => Some(Self::Bandpass),
            _ => None,
        }
    }
}

/// Apply a single-pole recursive filter.
///
/// `alpha = cutoff_hz / (sampling_rate / 2)` with `y[0] = x[0]`:
/// - lowpass:  `y[i] = alpha * x[i] + (1 - alpha) * y[i-1]`
/// - highpass: `y[i] = alpha * (y[i-1] + x[i] - x[i-1])`
///
/// No bounds check on alpha: cutoffs outside (0, Nyquist) produce unstable
/// output, which is the caller's responsibility.
pub fn apply_filter(
    signal: &[f64],
    kind: FilterKind,
    cutoff_hz: f64,
    sampling_rate: f64,
) -> Vec<f64> {
    let alpha = cutoff_hz / (sampling_rate / 2.0);

    match kind {
        FilterKind::Lowpass => {
            let mut out = signal.to_vec();
            for i in 1..out.len() {
                out[i] = alpha * signal[i] + (1.0 - alpha) * out[i - 1];
            }
            out
        }
        FilterKind::Highpass => {
            let mut out = signal.to_vec();
            for i in 1..out.len() {
                out[i] = alpha * (out[i - 1] + signal[i] - signal[i - 1]);
            }
            out
        }
        FilterKind::Bandpass => {
            let low = apply_filter(signal, FilterKind::Lowpass, cutoff_hz * 2.0, sampling_rate);
            apply_filter(&low, FilterKind::Highpass, cutoff_hz * 0.5, sampling_rate)
        }
    }
}
