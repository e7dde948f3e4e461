//! Railwatch - Slide-Rail Structural Monitoring
//!
//! CLI adapter around the analysis engine: parse selector arguments, run
//! the requested analysis, print the record as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Spectrum of the vibration channel over the last hour at 100 Hz
//! railwatch --source vibration --analysis fft
//!
//! # Weekly strain trend at 10 Hz with a 5 Hz low-pass pre-filter
//! railwatch --source strain --analysis trend --window 7d --rate 10 \
//!     --filter lowpass --cutoff 5
//! ```
//!
//! # Environment Variables
//!
//! - `RAILWATCH_CONFIG`: Path to a TOML config file
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::{Arc, Mutex};

use railwatch::{
    analyzer, AnalysisConfig, AnalysisEngine, AnalysisRequest, FilterKind, FilterSpec, SignalKind,
};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "railwatch")]
#[command(about = "Slide-rail structural monitoring - signal analysis engine")]
#[command(version)]
struct CliArgs {
    /// Data source channel: displacement, acceleration, strain, vibration
    #[arg(short, long)]
    source: String,

    /// Analysis type: fft, trend, baseline, prediction
    #[arg(short, long)]
    analysis: String,

    /// Time window: 1h, 6h, 24h, 7d, 30d (unknown values fall back to 1h)
    #[arg(short, long, default_value = "1h")]
    window: String,

    /// Sampling rate in Hz (invalid values fall back to the configured default)
    #[arg(short, long, default_value = "")]
    rate: String,

    /// Optional pre-analysis filter: lowpass, highpass, bandpass
    #[arg(long)]
    filter: Option<String>,

    /// Filter cutoff frequency in Hz (required with --filter)
    #[arg(long)]
    cutoff: Option<f64>,

    /// Prediction horizon in steps (prediction analysis only)
    #[arg(long)]
    steps: Option<u32>,

    /// Baseline recency window in days (baseline analysis only)
    #[arg(long)]
    baseline_days: Option<u32>,

    /// Explicit config file path (overrides RAILWATCH_CONFIG and ./railwatch.toml)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => AnalysisConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AnalysisConfig::load(),
    };

    let mut request = AnalysisRequest::from_keys(
        &args.source,
        &args.analysis,
        &args.window,
        &args.rate,
        &config,
    )
    .context("invalid analysis request")?;
    request.filter = parse_filter(&args)?;
    if let Some(steps) = args.steps {
        request.prediction_steps = steps;
    }
    if let Some(days) = args.baseline_days {
        request.baseline_window_days = days;
    }

    if request.source == SignalKind::Default {
        tracing::warn!(source = %args.source, "unknown data source, using the default waveform");
    }

    let engine = Arc::new(Mutex::new(AnalysisEngine::new(config)));
    let kind = request.kind;

    let summary = analyzer::spawn_run(Arc::clone(&engine), request)
        .await
        .context("analysis task panicked")??
        .context("analysis engine was busy")?;

    tracing::info!(
        kind = %summary.kind,
        samples = summary.sample_count,
        elapsed_ms = summary.elapsed_ms,
        "run finished"
    );

    let engine = engine.lock().map_err(|_| anyhow::anyhow!("engine lock poisoned"))?;
    let record = engine
        .record(kind)
        .context("analysis produced no record")?;

    let json = if args.pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    println!("{json}");

    Ok(())
}

fn parse_filter(args: &CliArgs) -> Result<Option<FilterSpec>> {
    let Some(filter_key) = &args.filter else {
        return Ok(None);
    };
    let Some(kind) = FilterKind::from_key(filter_key) else {
        bail!("unknown filter type: {filter_key}");
    };
    let Some(cutoff_hz) = args.cutoff else {
        bail!("--filter requires --cutoff <Hz>");
    };
    if cutoff_hz <= 0.0 {
        bail!("--cutoff must be positive");
    }
    Ok(Some(FilterSpec { kind, cutoff_hz }))
}
