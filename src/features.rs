//! Per-window feature extraction
//!
//! Computes the fixed-order feature vector for one window:
//! - mean / population std / min / max for ax, ay, az, magnitude, heart rate, skin temp
//! - signal magnitude area over the three axes
//! - lag-1 autocorrelation of each axis

use crate::types::{WindowView, FEATURE_COUNT};

/// Guard added to the autocorrelation denominator for near-constant windows
pub const AUTOCORR_EPSILON: f64 = 1e-9;

/// Summary statistics of one channel within a window
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelStats {
    pub mean: f64,
    /// Population standard deviation (ddof = 0)
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ChannelStats {
    /// Statistics of `values`; an empty slice yields all zeros
    pub fn of(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Self {
            mean,
            std: variance.sqrt(),
            min,
            max,
        }
    }

    fn as_array(&self) -> [f64; 4] {
        [self.mean, self.std, self.min, self.max]
    }
}

/// Feature extractor for one window of samples
pub struct FeatureExtractor;

impl FeatureExtractor {
    /// Extract the 28 features of a window, ordered as [`crate::types::FEATURE_NAMES`]
    pub fn extract(window: &WindowView<'_>) -> [f64; FEATURE_COUNT] {
        let magnitude = vector_magnitude(window.ax, window.ay, window.az);

        let mut features = [0.0; FEATURE_COUNT];
        let channels: [&[f64]; 6] = [
            window.ax,
            window.ay,
            window.az,
            &magnitude,
            window.heart_rate,
            window.skin_temp,
        ];
        for (i, channel) in channels.iter().enumerate() {
            features[i * 4..i * 4 + 4].copy_from_slice(&ChannelStats::of(channel).as_array());
        }

        features[24] = signal_magnitude_area(window.ax, window.ay, window.az);
        features[25] = lag1_autocorrelation(window.ax);
        features[26] = lag1_autocorrelation(window.ay);
        features[27] = lag1_autocorrelation(window.az);

        features
    }
}

/// Elementwise Euclidean norm of the three axes
pub fn vector_magnitude(ax: &[f64], ay: &[f64], az: &[f64]) -> Vec<f64> {
    ax.iter()
        .zip(ay)
        .zip(az)
        .map(|((x, y), z)| (x * x + y * y + z * z).sqrt())
        .collect()
}

/// Signal magnitude area: `mean|ax| + mean|ay| + mean|az|`
pub fn signal_magnitude_area(ax: &[f64], ay: &[f64], az: &[f64]) -> f64 {
    mean_abs(ax) + mean_abs(ay) + mean_abs(az)
}

fn mean_abs(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64
}

/// Lag-1 autocorrelation of the mean-centered signal.
///
/// Formula: `Σ x[i]·x[i+1] / (Σ x[i]² + ε)` over the centered samples, with
/// `ε = 1e-9`. A constant window gives 0.
pub fn lag1_autocorrelation(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let centered: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let lagged: f64 = centered.windows(2).map(|pair| pair[0] * pair[1]).sum();
    let energy: f64 = centered.iter().map(|v| v * v).sum();

    lagged / (energy + AUTOCORR_EPSILON)
}
