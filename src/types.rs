//! Core types for the Synheart Motion pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw samples, their columnar form, per-window feature vectors, and
//! the assembled feature table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Activity label attached to every sample (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Sitting,
    Walking,
    Running,
    Stairs,
}

impl Activity {
    /// All activities in protocol order
    pub const ALL: [Activity; 4] = [
        Activity::Sitting,
        Activity::Walking,
        Activity::Running,
        Activity::Stairs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Sitting => "sitting",
            Activity::Walking => "walking",
            Activity::Running => "running",
            Activity::Stairs => "stairs",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "sitting" => Ok(Activity::Sitting),
            "walking" => Ok(Activity::Walking),
            "running" => Ok(Activity::Running),
            "stairs" => Ok(Activity::Stairs),
            other => Err(format!(
                "unknown activity '{other}' (expected sitting|walking|running|stairs)"
            )),
        }
    }
}

/// One time step of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Sample timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Acceleration, x axis (m/s²)
    pub ax: f64,
    /// Acceleration, y axis (m/s²)
    pub ay: f64,
    /// Acceleration, z axis (m/s²)
    pub az: f64,
    /// Heart rate (bpm)
    pub heart_rate: i32,
    /// Skin temperature (°C)
    pub skin_temp: f64,
    /// Activity being performed
    pub activity: Activity,
}

/// Columnar form of a sample sequence.
///
/// Filtering rewrites the acceleration columns in place of the raw ones; windows
/// borrow slices of these columns through [`SampleColumns::window`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleColumns {
    pub ax: Vec<f64>,
    pub ay: Vec<f64>,
    pub az: Vec<f64>,
    pub heart_rate: Vec<f64>,
    pub skin_temp: Vec<f64>,
    pub activity: Vec<Activity>,
}

impl SampleColumns {
    /// Split samples into per-channel columns
    pub fn from_samples(samples: &[Sample]) -> Self {
        let mut columns = SampleColumns {
            ax: Vec::with_capacity(samples.len()),
            ay: Vec::with_capacity(samples.len()),
            az: Vec::with_capacity(samples.len()),
            heart_rate: Vec::with_capacity(samples.len()),
            skin_temp: Vec::with_capacity(samples.len()),
            activity: Vec::with_capacity(samples.len()),
        };

        for s in samples {
            columns.ax.push(s.ax);
            columns.ay.push(s.ay);
            columns.az.push(s.az);
            columns.heart_rate.push(s.heart_rate as f64);
            columns.skin_temp.push(s.skin_temp);
            columns.activity.push(s.activity);
        }

        columns
    }

    pub fn len(&self) -> usize {
        self.activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_empty()
    }

    /// Borrow the samples in `range` without copying.
    ///
    /// Panics if the range is out of bounds, like slice indexing.
    pub fn window(&self, range: Range<usize>) -> WindowView<'_> {
        WindowView {
            ax: &self.ax[range.clone()],
            ay: &self.ay[range.clone()],
            az: &self.az[range.clone()],
            heart_rate: &self.heart_rate[range.clone()],
            skin_temp: &self.skin_temp[range.clone()],
            activity: &self.activity[range],
        }
    }
}

/// Borrowed view of the samples inside one window
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    pub ax: &'a [f64],
    pub ay: &'a [f64],
    pub az: &'a [f64],
    pub heart_rate: &'a [f64],
    pub skin_temp: &'a [f64],
    pub activity: &'a [Activity],
}

impl WindowView<'_> {
    pub fn len(&self) -> usize {
        self.activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activity.is_empty()
    }
}

/// Number of numeric features per window
pub const FEATURE_COUNT: usize = 28;

/// Feature column names, in output order
#[rustfmt::skip]
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "ax_mean", "ax_std", "ax_min", "ax_max",
    "ay_mean", "ay_std", "ay_min", "ay_max",
    "az_mean", "az_std", "az_min", "az_max",
    "mag_mean", "mag_std", "mag_min", "mag_max",
    "hr_mean", "hr_std", "hr_min", "hr_max",
    "temp_mean", "temp_std", "temp_min", "temp_max",
    "sma", "ax_ac1", "ay_ac1", "az_ac1",
];

/// Features computed for one window, plus its label and position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// 0-based window index in window-start order
    pub window_id: usize,
    /// Representative activity of the window
    pub label: Activity,
    /// Numeric features, ordered as [`FEATURE_NAMES`]
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Look up a feature by column name
    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.values[i])
    }
}

/// Ordered collection of feature vectors sharing the [`FEATURE_NAMES`] schema
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    rows: Vec<FeatureVector>,
}

impl FeatureTable {
    /// Build a table, ordering rows by `window_id`
    pub fn from_rows(mut rows: Vec<FeatureVector>) -> Self {
        rows.sort_by_key(|r| r.window_id);
        Self { rows }
    }

    pub fn rows(&self) -> &[FeatureVector] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<FeatureVector> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate the values of one feature column across all rows
    pub fn column(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(move |r| r.values[index])
    }

    /// Iterate the values of a named feature column
    pub fn column_by_name(&self, name: &str) -> Option<impl Iterator<Item = f64> + '_> {
        FEATURE_NAMES
            .iter()
            .position(|&n| n == name)
            .map(|i| self.column(i))
    }
}
