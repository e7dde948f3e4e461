//! Railwatch: Slide-Rail Structural Monitoring
//!
//! Signal-analysis core for slide-rail sensor channels.
//!
//! ## Architecture
//!
//! - **Signal Synthesizer**: Deterministic-shape channel waveforms with noise
//! - **Processing**: Hann windowing and radix-2 FFT spectrum extraction
//! - **Statistics / Regression**: Descriptive stats, correlation, trend fits
//! - **Baseline**: Recency-windowed mean/sigma envelope and anomaly detection
//! - **Analysis Engine**: Request validation, dispatch, result accumulation

pub mod analyzer;
pub mod baseline;
pub mod config;
pub mod processing;
pub mod regression;
pub mod signal;
pub mod stats;

// Re-export configuration
pub use config::AnalysisConfig;

// Re-export the engine surface
pub use analyzer::{
    AnalysisEngine, AnalysisError, AnalysisKind, AnalysisRecord, AnalysisRequest, AnalysisResults,
    FilterSpec, RunSummary, TimeWindow, spawn_run,
};

// Re-export analysis record payloads
pub use analyzer::{BaselineAnalysis, FftAnalysis, PredictionAnalysis, TrendAnalysis};

// Re-export building blocks
pub use baseline::{BaselineError, BaselineModel, HistoricalPoint};
pub use processing::{ProcessingError, SpectrumResult, MAX_FFT_SIZE};
pub use regression::RegressionModel;
pub use signal::{FilterKind, SignalKind};
pub use stats::SignalStats;
