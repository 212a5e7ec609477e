//! motion.raw_sample.v1 record definition
//!
//! One CSV row per sample with the columns
//! `timestamp, ax, ay, az, heart_rate, skin_temp, activity`. Column order is
//! free and extra columns are ignored.

use crate::types::{Activity, Sample, FEATURE_COUNT};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current schema version
pub const SCHEMA_VERSION: &str = "motion.raw_sample.v1";

/// Columns every input file must carry
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "timestamp",
    "ax",
    "ay",
    "az",
    "heart_rate",
    "skin_temp",
    "activity",
];

/// Feature table columns, in output order
#[rustfmt::skip]
pub const OUTPUT_COLUMNS: [&str; FEATURE_COUNT + 2] = [
    "ax_mean", "ax_std", "ax_min", "ax_max",
    "ay_mean", "ay_std", "ay_min", "ay_max",
    "az_mean", "az_std", "az_min", "az_max",
    "mag_mean", "mag_std", "mag_min", "mag_max",
    "hr_mean", "hr_std", "hr_min", "hr_max",
    "temp_mean", "temp_std", "temp_min", "temp_max",
    "sma", "ax_ac1", "ay_ac1", "az_ac1",
    "activity", "window_id",
];

/// Timestamp formats accepted besides RFC 3339 (interpreted as UTC)
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// One input row as read from CSV, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: String,
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
    /// Beats per minute; must hold a whole number (`72` or `72.0`)
    pub heart_rate: f64,
    pub skin_temp: f64,
    pub activity: String,
}

impl RawSample {
    /// Validate this record and convert it into a [`Sample`].
    ///
    /// `row` is the 1-based data row number used in error reports.
    pub fn into_sample(self, row: usize) -> Result<Sample, SchemaError> {
        let readings = [
            ("ax", self.ax),
            ("ay", self.ay),
            ("az", self.az),
            ("heart_rate", self.heart_rate),
            ("skin_temp", self.skin_temp),
        ];
        for (column, value) in readings {
            if !value.is_finite() {
                return Err(SchemaError::NonFiniteValue {
                    row,
                    column: column.to_string(),
                });
            }
        }

        if self.heart_rate.fract() != 0.0 {
            return Err(SchemaError::InvalidValue {
                row,
                column: "heart_rate".to_string(),
                message: format!("expected an integer, got {}", self.heart_rate),
            });
        }
        if self.heart_rate < i32::MIN as f64 || self.heart_rate > i32::MAX as f64 {
            return Err(SchemaError::InvalidValue {
                row,
                column: "heart_rate".to_string(),
                message: format!("{} is out of range", self.heart_rate),
            });
        }

        let timestamp = parse_timestamp(&self.timestamp).ok_or_else(|| SchemaError::InvalidValue {
            row,
            column: "timestamp".to_string(),
            message: format!("cannot parse '{}' as a timestamp", self.timestamp),
        })?;

        let activity = self
            .activity
            .parse::<Activity>()
            .map_err(|message| SchemaError::InvalidValue {
                row,
                column: "activity".to_string(),
                message,
            })?;

        Ok(Sample {
            timestamp,
            ax: self.ax,
            ay: self.ay,
            az: self.az,
            heart_rate: self.heart_rate as i32,
            skin_temp: self.skin_temp,
            activity,
        })
    }
}

/// Parse an RFC 3339 timestamp, falling back to offset-less forms read as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Input schema violations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("Row {row}: invalid value in '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Row {row}: non-finite value in '{column}'")]
    NonFiniteValue { row: usize, column: String },

    #[error("Row {row}: timestamp does not increase over the previous row")]
    NonIncreasingTimestamp { row: usize },

    #[error("Row {row}: {message}")]
    MalformedRow { row: usize, message: String },

    #[error("Input contains no samples")]
    Empty,
}

impl SchemaError {
    /// Data row the violation was found on, if it is row-specific
    pub fn row(&self) -> Option<usize> {
        match self {
            SchemaError::InvalidValue { row, .. }
            | SchemaError::NonFiniteValue { row, .. }
            | SchemaError::NonIncreasingTimestamp { row }
            | SchemaError::MalformedRow { row, .. } => Some(*row),
            SchemaError::MissingColumn { .. } | SchemaError::Empty => None,
        }
    }
}
