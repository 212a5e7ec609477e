//! Feature standardization
//!
//! Global z-score over a whole feature table, done in two passes: [`ColumnStats::fit`]
//! reads every row to collect per-column mean and population std, then
//! [`Standardizer::transform`] rescales each row with those statistics. The
//! `window_id` and `label` of every row are carried through untouched.

use crate::types::{FeatureTable, FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Relative tolerance below which a column counts as constant
pub const ZERO_STD_TOLERANCE: f64 = 1e-12;

/// Per-column statistics over a full feature table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    /// Number of rows the statistics were fitted on
    pub count: usize,
    pub mean: [f64; FEATURE_COUNT],
    /// Population standard deviation (ddof = 0)
    pub std: [f64; FEATURE_COUNT],
}

impl ColumnStats {
    /// First pass: fit mean and std of every feature column
    pub fn fit(table: &FeatureTable) -> Self {
        let count = table.len();
        let mut mean = [0.0; FEATURE_COUNT];
        let mut std = [0.0; FEATURE_COUNT];

        if count == 0 {
            return Self { count, mean, std };
        }

        let n = count as f64;
        for (i, m) in mean.iter_mut().enumerate() {
            *m = table.column(i).sum::<f64>() / n;
        }
        for (i, s) in std.iter_mut().enumerate() {
            let variance = table.column(i).map(|v| (v - mean[i]).powi(2)).sum::<f64>() / n;
            *s = variance.sqrt();
        }

        Self { count, mean, std }
    }

    /// Whether column `index` is treated as constant.
    ///
    /// A column whose std is negligible relative to its mean standardizes to
    /// zeros instead of NaN or inf.
    pub fn is_constant(&self, index: usize) -> bool {
        self.std[index] <= ZERO_STD_TOLERANCE * self.mean[index].abs().max(1.0)
    }
}

/// Global z-score standardizer
pub struct Standardizer;

impl Standardizer {
    /// Second pass: rescale every row with previously fitted statistics
    pub fn transform(table: &FeatureTable, stats: &ColumnStats) -> FeatureTable {
        let constant: [bool; FEATURE_COUNT] = std::array::from_fn(|i| stats.is_constant(i));

        let rows = table
            .rows()
            .iter()
            .map(|row| {
                let mut values = row.values;
                for (i, v) in values.iter_mut().enumerate() {
                    *v = if constant[i] {
                        0.0
                    } else {
                        (*v - stats.mean[i]) / stats.std[i]
                    };
                }
                FeatureVector {
                    window_id: row.window_id,
                    label: row.label,
                    values,
                }
            })
            .collect();

        FeatureTable::from_rows(rows)
    }

    /// Fit then transform
    pub fn standardize(table: &FeatureTable) -> (FeatureTable, ColumnStats) {
        let stats = ColumnStats::fit(table);
        let standardized = Self::transform(table, &stats);
        (standardized, stats)
    }
}
