//! Pipeline configuration
//!
//! All parameters are fixed before filtering begins. Window and step lengths
//! are derived here so every stage sees the same values for a run.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default sample rate (Hz)
pub const DEFAULT_FS: f64 = 50.0;

/// Default window duration (seconds)
pub const DEFAULT_WIN_S: f64 = 2.0;

/// Default fractional overlap between consecutive windows
pub const DEFAULT_OVERLAP: f64 = 0.5;

/// Default high-pass cutoff (Hz)
pub const DEFAULT_CUTOFF_HZ: f64 = 0.25;

/// Default Butterworth order
pub const DEFAULT_FILTER_ORDER: usize = 3;

/// Parameters for one feature-extraction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sample rate of the input (samples per second)
    pub fs: f64,
    /// Window duration in seconds
    pub win_s: f64,
    /// Fraction of a window shared with the next one, in [0, 1)
    pub overlap: f64,
    /// Apply global z-score standardization to the feature table
    pub standardize: bool,
    /// High-pass cutoff for the acceleration channels (Hz)
    pub cutoff: f64,
    /// Butterworth filter order
    pub filter_order: usize,
    /// Worker threads used for per-window extraction
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fs: DEFAULT_FS,
            win_s: DEFAULT_WIN_S,
            overlap: DEFAULT_OVERLAP,
            standardize: false,
            cutoff: DEFAULT_CUTOFF_HZ,
            filter_order: DEFAULT_FILTER_ORDER,
            workers: 1,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ComputeError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Window length in samples: `round(win_s * fs)`
    pub fn window_len(&self) -> usize {
        (self.win_s * self.fs).round().max(0.0) as usize
    }

    /// Step between window starts: `max(1, floor(win * (1 - overlap)))`
    pub fn step_len(&self) -> usize {
        let step = (self.window_len() as f64 * (1.0 - self.overlap)).floor();
        (step as usize).max(1)
    }

    /// Check every parameter before any processing starts
    pub fn validate(&self) -> Result<(), ComputeError> {
        if !self.fs.is_finite() || self.fs <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "fs must be a positive sample rate, got {}",
                self.fs
            )));
        }

        if !self.win_s.is_finite() || self.win_s <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "win_s must be positive, got {}",
                self.win_s
            )));
        }

        if self.window_len() == 0 {
            return Err(ComputeError::InvalidConfig(format!(
                "win_s={} at fs={} gives a window of 0 samples",
                self.win_s, self.fs
            )));
        }

        if !(0.0..1.0).contains(&self.overlap) {
            return Err(ComputeError::InvalidConfig(format!(
                "overlap must be in [0, 1), got {}",
                self.overlap
            )));
        }

        if !self.cutoff.is_finite() || self.cutoff <= 0.0 {
            return Err(ComputeError::InvalidConfig(format!(
                "cutoff must be positive, got {}",
                self.cutoff
            )));
        }

        if self.filter_order == 0 {
            return Err(ComputeError::InvalidConfig(
                "filter_order must be at least 1".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(ComputeError::InvalidConfig(
                "workers must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.fs, 50.0);
        assert_eq!(config.win_s, 2.0);
        assert_eq!(config.overlap, 0.5);
        assert!(!config.standardize);
        assert_eq!(config.cutoff, 0.25);
        assert_eq!(config.filter_order, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_window_and_step_lengths() {
        let config = PipelineConfig::default();
        assert_eq!(config.window_len(), 100);
        assert_eq!(config.step_len(), 50);

        // round, not truncate
        let config = PipelineConfig {
            fs: 33.0,
            win_s: 1.5,
            ..Default::default()
        };
        assert_eq!(config.window_len(), 50);
        assert_eq!(config.step_len(), 25);
    }

    #[test]
    fn test_step_never_zero() {
        let config = PipelineConfig {
            fs: 1.0,
            win_s: 1.0,
            overlap: 0.9,
            ..Default::default()
        };
        assert_eq!(config.window_len(), 1);
        assert_eq!(config.step_len(), 1);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            PipelineConfig { fs: 0.0, ..Default::default() },
            PipelineConfig { win_s: -1.0, ..Default::default() },
            PipelineConfig { win_s: 0.001, ..Default::default() },
            PipelineConfig { overlap: 1.0, ..Default::default() },
            PipelineConfig { overlap: -0.1, ..Default::default() },
            PipelineConfig { cutoff: 0.0, ..Default::default() },
            PipelineConfig { filter_order: 0, ..Default::default() },
            PipelineConfig { workers: 0, ..Default::default() },
        ];

        for config in bad {
            assert!(
                matches!(config.validate(), Err(ComputeError::InvalidConfig(_))),
                "expected rejection for {config:?}"
            );
        }
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"fs": 100, "standardize": true}"#).unwrap();
        assert_eq!(config.fs, 100.0);
        assert!(config.standardize);
        assert_eq!(config.win_s, DEFAULT_WIN_S);
        assert_eq!(config.window_len(), 200);
    }
}
