//! Analysis orchestrator for slide-rail channel diagnostics.
//!
//! [`AnalysisEngine`] is the entry point: given a request (data source,
//! analysis type, time window, sampling rate) it
//!
//! 1. validates the selectors and the sample-count ceiling before any
//!    allocation,
//! 2. synthesizes (and optionally filters) the channel signal,
//! 3. dispatches to one of the fft / trend / baseline / prediction routines,
//! 4. stores the record under its analysis-kind key and reports a run
//!    summary with elapsed milliseconds.
//!
//! The engine is an explicit context object owned by the caller - no
//! process-wide globals. Results accumulate across runs until [`reset`]
//! (`AnalysisEngine::reset`). A run already in progress makes a second
//! start a logged no-op (`Ok(None)`), never an error, and the running flag
//! is released on every exit path including failures.
//!
//! The core computation is synchronous; [`spawn_run`] wraps it in an
//! explicit future for callers that want the work off their thread.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

use crate::baseline::{self, BaselineError, BaselineModel, HistoricalPoint};
use crate::config::AnalysisConfig;
use crate::processing::{self, ProcessingError, SpectrumResult};
use crate::regression::{self, RegressionModel};
use crate::signal::{self, FilterKind, SignalKind};
use crate::stats::{self, SignalStats};

// ============================================================================
// Request types
// ============================================================================

/// The analysis routines the engine can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Fft,
    Trend,
    Baseline,
    Prediction,
}

impl AnalysisKind {
    /// Parse an analysis-type selector key. Empty and unknown keys are `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim() {
            "fft" => Some(Self::Fft),
            "trend" => Some(Self::Trend),
            "baseline" => Some(Self::Baseline),
            "prediction" => Some(Self::Prediction),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let key = match self {
            Self::Fft => "fft",
            Self::Trend => "trend",
            Self::Baseline => "baseline",
            Self::Prediction => "prediction",
        };
        write!(f, "{key}")
    }
}

/// Named analysis time windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    OneDay,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
}

impl TimeWindow {
    /// Parse a window selector key; anything unrecognized falls back to 1h.
    pub fn from_key(key: &str) -> Self {
        match key.trim() {
            "6h" => Self::SixHours,
            "24h" => Self::OneDay,
            "7d" => Self::SevenDays,
            "30d" => Self::ThirtyDays,
            _ => Self::OneHour,
        }
    }

    /// Window duration in seconds.
    pub fn duration_s(self) -> u64 {
        match self {
            Self::OneHour => 3_600,
            Self::SixHours => 21_600,
            Self::OneDay => 86_400,
            Self::SevenDays => 604_800,
            Self::ThirtyDays => 2_592_000,
        }
    }
}

/// Optional pre-analysis filter stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub cutoff_hz: f64,
}

/// A validated analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source: SignalKind,
    pub kind: AnalysisKind,
    pub window: TimeWindow,
    /// Positive sampling rate in Hz
    pub sampling_rate_hz: u32,
    /// Prediction horizon (prediction analysis only)
    pub prediction_steps: u32,
    /// Baseline recency window in days (baseline analysis only)
    pub baseline_window_days: u32,
    pub filter: Option<FilterSpec>,
}

impl AnalysisRequest {
    /// Build a request from raw selector keys, the way the form-control
    /// adapter hands them over.
    ///
    /// Empty source or analysis keys are a [`AnalysisError::MissingSelection`];
    /// an unrecognized analysis key is [`AnalysisError::UnknownAnalysisType`].
    /// An unrecognized window key falls back to 1h, and a missing or
    /// unparsable sampling rate falls back to the configured default.
    pub fn from_keys(
        source_key: &str,
        kind_key: &str,
        window_key: &str,
        rate_key: &str,
        config: &AnalysisConfig,
    ) -> Result<Self, AnalysisError> {
        if source_key.trim().is_empty() || kind_key.trim().is_empty() {
            return Err(AnalysisError::MissingSelection);
        }

        let source = SignalKind::from_key(source_key).ok_or(AnalysisError::MissingSelection)?;
        let kind = AnalysisKind::from_key(kind_key)
            .ok_or_else(|| AnalysisError::UnknownAnalysisType(kind_key.trim().to_string()))?;

        let sampling_rate_hz = rate_key
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|r| *r > 0)
            .unwrap_or(config.defaults.sampling_rate_hz);

        Ok(Self {
            source,
            kind,
            window: TimeWindow::from_key(window_key),
            sampling_rate_hz,
            prediction_steps: config.defaults.prediction_steps,
            baseline_window_days: config.defaults.baseline_window_days,
            filter: None,
        })
    }
}

// ============================================================================
// Result types
// ============================================================================

/// FFT analysis output: Hann-windowed spectrum plus the windowed signal the
/// rendering layer plots as the time trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FftAnalysis {
    pub spectrum: SpectrumResult,
    pub windowed_signal: Vec<f64>,
}

/// Trend analysis output: both fitted models, fit quality, and the lag-1
/// autocorrelation of the signal (with significance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub linear: RegressionModel,
    /// Quadratic fit; downgraded to the linear variant when the normal
    /// equations were singular
    pub quadratic: RegressionModel,
    /// R² of the linear fit, clamped to [0, 1]
    pub r_squared: f64,
    pub lag1_correlation: f64,
    pub lag1_p_value: f64,
    pub stats: SignalStats,
    /// Linear-model predictions over the observed time points
    pub predictions: Vec<f64>,
}

/// Baseline analysis output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineAnalysis {
    pub baseline: BaselineModel,
    /// Samples strictly outside the baseline envelope
    pub anomalies: Vec<f64>,
}

/// Prediction analysis output: a linear extrapolation past the window end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionAnalysis {
    pub model: RegressionModel,
    pub future_time_points: Vec<f64>,
    pub predictions: Vec<f64>,
}

/// One analysis routine's output record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisRecord {
    Fft(FftAnalysis),
    Trend(TrendAnalysis),
    Baseline(BaselineAnalysis),
    Prediction(PredictionAnalysis),
}

/// Accumulated results, keyed by analysis kind. Repeated runs of the same
/// kind overwrite that kind's entry; different kinds accumulate.
pub type AnalysisResults = HashMap<AnalysisKind, AnalysisRecord>;

/// Scalar summary the engine computes around a successful dispatch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RunSummary {
    pub kind: AnalysisKind,
    pub sample_count: usize,
    pub elapsed_ms: u64,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("data source and analysis type must both be selected")]
    MissingSelection,

    #[error("unknown analysis type: {0}")]
    UnknownAnalysisType(String),

    #[error(
        "requested {requested} samples exceeds the {limit}-sample ceiling; \
         shorten the time window or lower the sampling rate"
    )]
    SampleCeilingExceeded { requested: u64, limit: u64 },

    #[error("baseline analysis failed: {0}")]
    Baseline(#[from] BaselineError),

    #[error("spectrum computation failed: {0}")]
    Processing(#[from] ProcessingError),
}

// ============================================================================
// Engine
// ============================================================================

/// Caller-owned analysis context: configuration, accumulated results, and
/// the re-entrancy guard.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    results: AnalysisResults,
    running: bool,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            results: AnalysisResults::new(),
            running: false,
        }
    }

    /// Accumulated analysis records.
    pub fn results(&self) -> &AnalysisResults {
        &self.results
    }

    /// The record for one analysis kind, if that kind has run.
    pub fn record(&self, kind: AnalysisKind) -> Option<&AnalysisRecord> {
        self.results.get(&kind)
    }

    /// Clear all accumulated results.
    pub fn reset(&mut self) {
        self.results.clear();
        tracing::debug!("analysis results cleared");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one analysis.
    ///
    /// Returns `Ok(None)` without touching any state when a run is already
    /// in progress. Validation failures (ceiling, selectors) and dispatch
    /// failures leave the result map exactly as it was - a record is only
    /// written after its routine fully succeeded.
    pub fn run(&mut self, request: &AnalysisRequest) -> Result<Option<RunSummary>, AnalysisError> {
        if self.running {
            tracing::info!(kind = %request.kind, "analysis already in progress, ignoring request");
            return Ok(None);
        }

        // Ceiling check before any signal allocation
        let requested = request.window.duration_s() * u64::from(request.sampling_rate_hz);
        let limit = self.config.limits.max_samples;
        if requested > limit {
            return Err(AnalysisError::SampleCeilingExceeded { requested, limit });
        }

        self.running = true;
        let started = Instant::now();
        let outcome = self.dispatch(request);
        // Released on every path, including dispatch failure
        self.running = false;

        let (record, sample_count) = outcome?;
        self.results.insert(request.kind, record);

        let elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            kind = %request.kind,
            source = %request.source,
            samples = sample_count,
            elapsed_ms,
            "analysis complete"
        );

        Ok(Some(RunSummary {
            kind: request.kind,
            sample_count,
            elapsed_ms,
        }))
    }

    fn dispatch(
        &self,
        request: &AnalysisRequest,
    ) -> Result<(AnalysisRecord, usize), AnalysisError> {
        let rate = f64::from(request.sampling_rate_hz);
        let duration = request.window.duration_s() as f64;

        let mut samples = signal::generate(request.source, duration, rate);
        if let Some(filter) = &request.filter {
            samples = signal::apply_filter(&samples, filter.kind, filter.cutoff_hz, rate);
        }
        let sample_count = samples.len();

        let record = match request.kind {
            AnalysisKind::Fft => AnalysisRecord::Fft(run_fft(&samples, rate)?),
            AnalysisKind::Trend => AnalysisRecord::Trend(run_trend(&samples, rate)),
            AnalysisKind::Baseline => AnalysisRecord::Baseline(run_baseline(
                &samples,
                request.baseline_window_days,
                self.config.baseline.sigma,
            )?),
            AnalysisKind::Prediction => {
                AnalysisRecord::Prediction(run_prediction(&samples, rate, request.prediction_steps))
            }
        };

        Ok((record, sample_count))
    }
}

// ============================================================================
// Dispatch routines
// ============================================================================

fn run_fft(samples: &[f64], rate: f64) -> Result<FftAnalysis, AnalysisError> {
    let windowed = processing::hann_window(samples);
    let bins = processing::transform(&windowed);
    let spectrum = processing::magnitude_spectrum(&bins, rate)?;
    Ok(FftAnalysis {
        spectrum,
        windowed_signal: windowed,
    })
}

fn run_trend(samples: &[f64], rate: f64) -> TrendAnalysis {
    let time_points: Vec<f64> = (0..samples.len()).map(|i| i as f64 / rate).collect();

    let linear = regression::fit_linear(&time_points, samples);
    let quadratic = regression::fit_quadratic(&time_points, samples);
    let predictions = regression::predict(&linear, &time_points);
    let r_squared = regression::r_squared(samples, &predictions);

    // Lag-1 autocorrelation: current value vs previous value
    let (lag1_correlation, lag1_p_value) = if samples.len() >= 2 {
        let r = stats::correlate(&samples[..samples.len() - 1], &samples[1..]);
        (r, stats::correlation_p_value(r, samples.len() - 1))
    } else {
        (0.0, 1.0)
    };

    TrendAnalysis {
        linear,
        quadratic,
        r_squared,
        lag1_correlation,
        lag1_p_value,
        stats: stats::describe(samples),
        predictions,
    }
}

fn run_baseline(
    samples: &[f64],
    window_days: u32,
    sigma: f64,
) -> Result<BaselineAnalysis, AnalysisError> {
    // Treat the synthesized signal as one-second-spaced history ending now
    let now = chrono::Utc::now();
    let points: Vec<HistoricalPoint> = samples
        .iter()
        .enumerate()
        .map(|(i, &value)| HistoricalPoint {
            timestamp: now - chrono::Duration::seconds((samples.len() - i) as i64),
            value,
        })
        .collect();

    let baseline = baseline::build_baseline(&points, window_days, sigma, now)?;
    let anomalies = baseline::detect_anomalies(samples, &baseline);

    Ok(BaselineAnalysis {
        baseline,
        anomalies,
    })
}

fn run_prediction(samples: &[f64], rate: f64, steps: u32) -> PredictionAnalysis {
    let time_points: Vec<f64> = (0..samples.len()).map(|i| i as f64 / rate).collect();
    let model = regression::fit_linear(&time_points, samples);

    let last_time = time_points.last().copied().unwrap_or(0.0);
    let future_time_points: Vec<f64> = (1..=steps)
        .map(|i| last_time + f64::from(i) / rate)
        .collect();
    let predictions = regression::predict(&model, &future_time_points);

    PredictionAnalysis {
        model,
        future_time_points,
        predictions,
    }
}

// ============================================================================
// Explicit-future wrapper
// ============================================================================

/// Run an analysis on the blocking pool, returning the task handle.
///
/// The engine lock is tried, not awaited: if another run holds it, this is
/// the same logged no-op (`Ok(None)`) as calling [`AnalysisEngine::run`]
/// while a run is in progress.
pub fn spawn_run(
    engine: Arc<Mutex<AnalysisEngine>>,
    request: AnalysisRequest,
) -> tokio::task::JoinHandle<Result<Option<RunSummary>, AnalysisError>> {
    tokio::task::spawn_blocking(move || {
        let mut engine = match engine.try_lock() {
            Ok(engine) => engine,
            Err(_) => {
                tracing::info!(kind = %request.kind, "analysis engine busy, ignoring request");
                return Ok(None);
            }
        };
        engine.run(&request)
    })
}

// ============================================================================
// Tests
// ============================================================================
