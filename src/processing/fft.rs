//! Iterative radix-2 FFT for slide-rail vibration channels.
//!
//! The transform is deliberately non-recursive: bit-reversal permutation
//! followed by log2(N) butterfly stages, so arbitrarily large inputs never
//! grow the call stack. Inputs are zero-padded to the next power of two, and
//! anything beyond [`MAX_FFT_SIZE`] samples is truncated before transforming.
//!
//! # Example
//!
//! ```ignore
//! use railwatch::processing::{transform, magnitude_spectrum, hann_window};
//!
//! let samples: Vec<f64> = collect_rail_samples();
//! let bins = transform(&hann_window(&samples));
//! let spectrum = magnitude_spectrum(&bins, 100.0)?;
//! println!("fundamental: {:.2} Hz", spectrum.fundamental_freq);
//! ```

use chrono::Utc;
use num_complex::Complex;
use std::f64::consts::PI;

use super::{ProcessingError, SpectrumResult};

/// Hard ceiling on FFT input size (2^16).
///
/// Oversized inputs are truncated to this many samples before transforming.
/// This is a lossy safety valve against runaway allocations, not a precision
/// feature - callers must expect shorter output than requested.
pub const MAX_FFT_SIZE: usize = 65_536;

/// Compute the FFT of a real-valued signal.
///
/// Policy, in order:
/// - length <= 1: returned unchanged (lifted to complex values)
/// - length > [`MAX_FFT_SIZE`]: truncated to the first `MAX_FFT_SIZE` samples
/// - length not a power of two: zero-padded up to the next power of two
///
/// Output length is therefore always a power of two (or 0/1 for degenerate
/// input). Same input produces bit-identical output: the stage order below
/// fixes the floating-point association.
pub fn transform(signal: &[f64]) -> Vec<Complex<f64>> {
    let n = signal.len();
    if n <= 1 {
        return signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    }

    if n > MAX_FFT_SIZE {
        tracing::warn!(
            len = n,
            limit = MAX_FFT_SIZE,
            "FFT input oversized, truncating"
        );
        let buffer: Vec<Complex<f64>> = signal[..MAX_FFT_SIZE]
            .iter()
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        return fft_in_place(buffer);
    }

    let padded = n.next_power_of_two();
    let mut buffer: Vec<Complex<f64>> =
        signal.iter().map(|&x| Complex::new(x, 0.0)).collect();
    buffer.resize(padded, Complex::new(0.0, 0.0));
    fft_in_place(buffer)
}

/// Iterative radix-2 Cooley-Tukey. Buffer length must be a power of two.
fn fft_in_place(mut x: Vec<Complex<f64>>) -> Vec<Complex<f64>> {
    let n = x.len();
    if n <= 1 {
        return x;
    }
    debug_assert!(n.is_power_of_two());

    // Bit-reversal permutation
    let mut j = 0usize;
    for i in 1..n {
        let mut bit = n >> 1;
        while j & bit != 0 {
            j ^= bit;
            bit >>= 1;
        }
        j ^= bit;
        if i < j {
            x.swap(i, j);
        }
    }

    // Butterfly stages: merge sub-transforms of length len/2 into length len.
    // Twiddle factor exp(-2*pi*i/len) recomputed from cos/sin per stage.
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let wlen = Complex::new(angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let mut w = Complex::new(1.0, 0.0);
            for k in 0..len / 2 {
                let u = x[start + k];
                let v = x[start + k + len / 2] * w;
                x[start + k] = u + v;
                x[start + k + len / 2] = u - v;
                w *= wlen;
            }
        }
        len <<= 1;
    }

    x
}

/// Apply a Hann window to a signal.
///
/// Identity for inputs shorter than two samples.
pub fn hann_window(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    if n < 2 {
        return signal.to_vec();
    }
    let denom = (n - 1) as f64;
    signal
        .iter()
        .enumerate()
        .map(|(i, &x)| x * (0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos()))
        .collect()
}

/// Derive the one-sided magnitude spectrum from FFT output.
///
/// Takes magnitudes of the first `N/2` bins (real-input spectra are
/// symmetric, so the upper half carries no extra information) and computes
/// both frequency searches. Degenerate input (empty, single bin, all-zero)
/// yields `0` for both frequencies, never NaN.
pub fn magnitude_spectrum(
    bins: &[Complex<f64>],
    sample_rate: f64,
) -> Result<SpectrumResult, ProcessingError> {
    if sample_rate <= 0.0 {
        return Err(ProcessingError::InvalidSamplingRate(sample_rate));
    }

    let n = bins.len();
    let half = n / 2;
    let magnitudes: Vec<f64> = bins[..half].iter().map(|c| c.norm()).collect();
    let frequencies: Vec<f64> = (0..half)
        .map(|i| i as f64 * sample_rate / n as f64)
        .collect();

    let fundamental_freq = fundamental_frequency(bins, sample_rate);
    let peak_freq = peak_frequency(&frequencies, &magnitudes);

    Ok(SpectrumResult {
        frequencies,
        magnitudes,
        fundamental_freq,
        peak_freq,
        sample_rate,
        timestamp: Utc::now(),
    })
}

/// Find the fundamental frequency of a transformed signal.
///
/// Scans magnitude bins from `max(1, floor(1/freq_step))` (skipping DC and
/// sub-1Hz bins) up to the Nyquist bin `N/2`, returning the frequency of the
/// maximum-magnitude bin. Returns `0` when no bin exceeds zero.
pub fn fundamental_frequency(bins: &[Complex<f64>], sample_rate: f64) -> f64 {
    let n = bins.len();
    if n <= 1 {
        return 0.0;
    }

    let freq_step = sample_rate / n as f64;
    if freq_step <= 0.0 || !freq_step.is_finite() {
        return 0.0;
    }

    let start = ((1.0 / freq_step).floor() as usize).max(1);
    let end = n / 2;

    let mut max_magnitude = 0.0;
    let mut fundamental = 0.0;
    for (i, bin) in bins.iter().enumerate().take(end).skip(start) {
        let m = bin.norm();
        if m > max_magnitude {
            max_magnitude = m;
            fundamental = i as f64 * freq_step;
        }
    }
    fundamental
}

/// Peak frequency over bins [1, N/2): global maximum ignoring DC.
/// A slightly different metric than [`fundamental_frequency`] - no 1 Hz
/// lower cutoff - kept separate because FFT-analysis output reports both.
fn peak_frequency(frequencies: &[f64], magnitudes: &[f64]) -> f64 {
    let mut best = 0.0_f64;
    let mut peak = 0.0_f64;
    for i in 1..magnitudes.len() {
        if magnitudes[i] > best {
            best = magnitudes[i];
            peak = frequencies[i];
        }
    }
    if peak.is_finite() {
        peak
    } else {
        0.0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / rate).sin())
            .collect()
    }

    #[test]
    fn test_power_of_two_length_preserved() {
        let signal = sine(5.0, 100.0, 256);
        let bins = transform(&signal);
        assert_eq!(bins.len(), 256);
    }

    #[test]
    fn test_non_power_of_two_zero_padded() {
        let signal = vec![1.0; 100];
        let bins = transform(&signal);
        assert_eq!(bins.len(), 128, "length 100 must pad to 128");
    }

    #[test]
    fn test_oversized_input_truncated() {
        let signal = vec![0.5; 70_000];
        let bins = transform(&signal);
        assert_eq!(bins.len(), MAX_FFT_SIZE);
    }

    #[test]
    fn test_degenerate_inputs_pass_through() {
        assert!(transform(&[]).is_empty());

        let single = transform(&[3.25]);
        assert_eq!(single.len(), 1);
        assert!((single[0].re - 3.25).abs() < 1e-12);
        assert_eq!(single[0].im, 0.0);
    }

    #[test]
    fn test_dc_bin_is_sum_of_samples() {
        let signal = vec![1.0; 8];
        let bins = transform(&signal);
        assert!((bins[0].re - 8.0).abs() < 1e-9);
        assert!(bins[0].im.abs() < 1e-9);
        // All other bins of a constant signal are ~0
        for bin in &bins[1..] {
            assert!(bin.norm() < 1e-9);
        }
    }

    #[test]
    fn test_sine_peak_within_one_bin() {
        let rate = 1000.0;
        let n = 1024;
        let signal = sine(100.0, rate, n);
        let bins = transform(&signal);
        let spectrum = magnitude_spectrum(&bins, rate).unwrap();

        let bin_width = rate / n as f64;
        assert!(
            (spectrum.peak_freq - 100.0).abs() <= bin_width,
            "peak at {} Hz, expected within {} of 100 Hz",
            spectrum.peak_freq,
            bin_width
        );
        assert!((spectrum.fundamental_freq - 100.0).abs() <= bin_width);
    }

    #[test]
    fn test_spectrum_shape() {
        let signal = sine(10.0, 200.0, 512);
        let bins = transform(&signal);
        let spectrum = magnitude_spectrum(&bins, 200.0).unwrap();

        assert_eq!(spectrum.frequencies.len(), 256);
        assert_eq!(spectrum.magnitudes.len(), 256);
        // frequencies[i] = i * rate / N
        assert!((spectrum.frequencies[1] - 200.0 / 512.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_signal_degrades_to_zero() {
        let signal = vec![0.0; 256];
        let bins = transform(&signal);
        let spectrum = magnitude_spectrum(&bins, 100.0).unwrap();

        assert_eq!(spectrum.fundamental_freq, 0.0);
        assert_eq!(spectrum.peak_freq, 0.0);
        assert!(spectrum.fundamental_freq.is_finite());
    }

    #[test]
    fn test_invalid_sample_rate_rejected() {
        let bins = transform(&[1.0, 2.0, 3.0, 4.0]);
        assert!(matches!(
            magnitude_spectrum(&bins, 0.0),
            Err(ProcessingError::InvalidSamplingRate(_))
        ));
    }

    #[test]
    fn test_hann_window_tapers_edges() {
        let ones = [1.0; 64];
        let windowed = hann_window(&ones);
        assert_eq!(windowed.len(), 64);
        assert!(windowed[0].abs() < 1e-12, "first sample tapers to zero");
        assert!(windowed[63].abs() < 1e-12, "last sample tapers to zero");
        assert!((windowed[32] - 1.0).abs() < 0.01, "center near unity gain");
    }

    #[test]
    fn test_hann_window_short_input_identity() {
        assert_eq!(hann_window(&[]), Vec::<f64>::new());
        assert_eq!(hann_window(&[2.5]), vec![2.5]);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let signal = sine(7.0, 64.0, 300);
        let a = transform(&signal);
        let b = transform(&signal);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.re.to_bits(), y.re.to_bits());
            assert_eq!(x.im.to_bits(), y.im.to_bits());
        }
    }
}
