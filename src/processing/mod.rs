//! Signal processing module - spectrum analysis for slide-rail sensor channels

mod fft;

pub use fft::{fundamental_frequency, hann_window, magnitude_spectrum, transform, MAX_FFT_SIZE};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in signal processing
#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("Invalid sampling rate: {0}")]
    InvalidSamplingRate(f64),
}

/// Magnitude spectrum from FFT analysis.
///
/// Holds the one-sided (Nyquist-truncated) spectrum: the first `N/2` bins of
/// the transform, with `frequencies[i] = i * sample_rate / N`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumResult {
    /// Frequency bins (Hz), length `N/2`
    pub frequencies: Vec<f64>,
    /// Magnitude at each frequency bin
    pub magnitudes: Vec<f64>,
    /// Fundamental frequency (Hz) - strongest bin above DC, 0 when degenerate
    pub fundamental_freq: f64,
    /// Peak frequency (Hz) - global maximum over bins [1, N/2), 0 when degenerate
    pub peak_freq: f64,
    /// Sample rate used (Hz)
    pub sample_rate: f64,
    /// Timestamp of analysis
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
