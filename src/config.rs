//! Analysis configuration loaded from TOML.
//!
//! ## Loading order
//!
//! 1. `RAILWATCH_CONFIG` environment variable (path to TOML file)
//! 2. `railwatch.toml` in the current working directory
//! 3. Built-in defaults
//!
//! Every field carries a serde default, so a partial file only overrides
//! what it names. The config is passed explicitly into
//! [`crate::AnalysisEngine::new`] - there is no process-wide config global.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an explicit config path.
pub const CONFIG_ENV_VAR: &str = "RAILWATCH_CONFIG";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "railwatch.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub limits: Limits,
    pub defaults: Defaults,
    pub baseline: BaselineConfig,
}

/// Hard resource limits enforced before any signal allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum `duration * sampling_rate` sample count per run
    pub max_samples: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_samples: 1_000_000,
        }
    }
}

/// Fallbacks for missing or unparsable request parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Sampling rate (Hz) when the request value is missing or invalid
    pub sampling_rate_hz: u32,
    /// Prediction horizon in steps
    pub prediction_steps: u32,
    /// Baseline recency window in days
    pub baseline_window_days: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            sampling_rate_hz: 100,
            prediction_steps: 24,
            baseline_window_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Sigma multiplier for the baseline anomaly envelope
    pub sigma: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self { sigma: 3.0 }
    }
}

impl AnalysisConfig {
    /// Load configuration using the documented lookup order.
    ///
    /// A missing file is normal and falls through silently; a present but
    /// unparsable file is logged and ignored rather than aborting startup.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            match Self::load_from(Path::new(&path)) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Failed to load config from env path, using defaults");
                    return Self::default();
                }
            }
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            match Self::load_from(default_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse railwatch.toml, using defaults");
                }
            }
        }

        Self::default()
    }

    /// Load configuration from an explicit TOML file path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        tracing::info!(path = %path.display(), "Analysis config loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.limits.max_samples, 1_000_000);
        assert_eq!(config.defaults.sampling_rate_hz, 100);
        assert_eq!(config.defaults.prediction_steps, 24);
        assert_eq!(config.defaults.baseline_window_days, 30);
        assert!((config.baseline.sigma - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_partial_file_overrides_only_named_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[limits]\nmax_samples = 5000").unwrap();

        let config = AnalysisConfig::load_from(file.path()).unwrap();
        assert_eq!(config.limits.max_samples, 5000);
        // Unnamed sections keep their defaults
        assert_eq!(config.defaults.sampling_rate_hz, 100);
        assert!((config.baseline.sigma - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml {{{{").unwrap();
        assert!(AnalysisConfig::load_from(file.path()).is_err());
    }
}
