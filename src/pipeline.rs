//! Pipeline orchestration
//!
//! This module provides the public API for Synheart Motion.
//! It runs a recording through every stage and assembles the feature table.

use crate::config::PipelineConfig;
use crate::error::{ComputeError, PipelineWarning};
use crate::features::FeatureExtractor;
use crate::filter::FilterStage;
use crate::labels::LabelAggregator;
use crate::normalizer::{ColumnStats, Standardizer};
use crate::types::{FeatureTable, FeatureVector, Sample, SampleColumns};
use crate::windowing::Windower;
use crossbeam_channel::{bounded, unbounded};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Convert a recording into a feature table.
///
/// # Arguments
/// * `samples` - Validated samples in strictly increasing timestamp order
/// * `config` - Run parameters
///
/// # Returns
/// The feature table plus any non-fatal warnings. Input shorter than one
/// window yields an empty table and [`PipelineWarning::InsufficientData`].
///
/// # Example
/// ```ignore
/// let samples = SampleAdapter::read_csv_path(Path::new("session.csv"))?;
/// let output = samples_to_features(&samples, &PipelineConfig::default())?;
/// println!("{} windows", output.table().len());
/// ```
pub fn samples_to_features(
    samples: &[Sample],
    config: &PipelineConfig,
) -> Result<PipelineOutput, ComputeError> {
    FeaturePipeline::new(config.clone())?.run(samples)
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Feature table before standardization
    pub raw: FeatureTable,
    /// Standardized table, present when `standardize` was requested
    pub standardized: Option<FeatureTable>,
    /// Statistics the standardized table was computed with
    pub stats: Option<ColumnStats>,
    pub warnings: Vec<PipelineWarning>,
}

impl PipelineOutput {
    fn empty(warnings: Vec<PipelineWarning>) -> Self {
        Self {
            raw: FeatureTable::default(),
            standardized: None,
            stats: None,
            warnings,
        }
    }

    /// The table to emit: standardized if requested, raw otherwise
    pub fn table(&self) -> &FeatureTable {
        self.standardized.as_ref().unwrap_or(&self.raw)
    }

    pub fn into_table(self) -> FeatureTable {
        self.standardized.unwrap_or(self.raw)
    }
}

/// Configured pipeline, reusable across recordings.
///
/// Pipeline stages:
/// 1. FilterStage - zero-phase high-pass on ax, ay, az
/// 2. Windower - fixed-length overlapping windows, numbered in start order
/// 3. FeatureExtractor / LabelAggregator - one row per window
/// 4. Standardizer - optional global z-score
pub struct FeaturePipeline {
    config: PipelineConfig,
    filter: FilterStage,
}

impl FeaturePipeline {
    /// Validate `config` and design the filter
    pub fn new(config: PipelineConfig) -> Result<Self, ComputeError> {
        config.validate()?;
        let filter = FilterStage::new(config.filter_order, config.cutoff, config.fs)?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over row-oriented samples
    pub fn run(&self, samples: &[Sample]) -> Result<PipelineOutput, ComputeError> {
        self.run_columns(SampleColumns::from_samples(samples))
    }

    /// Run the pipeline over columnar samples
    pub fn run_columns(&self, columns: SampleColumns) -> Result<PipelineOutput, ComputeError> {
        let windower = Windower::from_config(columns.len(), &self.config)?;

        if windower.is_empty() {
            let warning = PipelineWarning::InsufficientData {
                samples: columns.len(),
                window: windower.window_len(),
            };
            warn!(
                samples = columns.len(),
                window = windower.window_len(),
                "{warning}"
            );
            return Ok(PipelineOutput::empty(vec![warning]));
        }

        // Stage 1: filter acceleration channels
        let filtered = self.filter.apply_to_columns(columns)?;
        debug!(samples = filtered.len(), "filtered acceleration channels");

        // Stages 2-3: window, extract, label
        let rows = if self.config.workers > 1 {
            extract_parallel(&filtered, &windower, self.config.workers)
        } else {
            extract_sequential(&filtered, &windower)
        };
        let raw = FeatureTable::from_rows(rows);
        debug!(
            windows = raw.len(),
            win = windower.window_len(),
            step = windower.step_len(),
            workers = self.config.workers,
            "extracted window features"
        );

        // Stage 4: optional standardization
        let (standardized, stats) = if self.config.standardize {
            let (table, stats) = Standardizer::standardize(&raw);
            (Some(table), Some(stats))
        } else {
            (None, None)
        };

        info!(
            samples = filtered.len(),
            windows = raw.len(),
            standardized = self.config.standardize,
            "feature extraction complete"
        );

        Ok(PipelineOutput {
            raw,
            standardized,
            stats,
            warnings: Vec::new(),
        })
    }
}

/// Features and label for the window at `range`
fn extract_window(
    columns: &SampleColumns,
    window_id: usize,
    range: Range<usize>,
) -> Option<FeatureVector> {
    let view = columns.window(range);
    // None only for an empty window, which the windower never produces
    let label = LabelAggregator::aggregate(view.activity)?;
    Some(FeatureVector {
        window_id,
        label,
        values: FeatureExtractor::extract(&view),
    })
}

fn extract_sequential(columns: &SampleColumns, windower: &Windower) -> Vec<FeatureVector> {
    windower
        .iter()
        .enumerate()
        .filter_map(|(id, range)| extract_window(columns, id, range))
        .collect()
}

/// Fan windows out to `workers` scoped threads.
///
/// Window ids are assigned here at enumeration time, so rows come back in any
/// order and [`FeatureTable::from_rows`] restores window order.
fn extract_parallel(
    columns: &SampleColumns,
    windower: &Windower,
    workers: usize,
) -> Vec<FeatureVector> {
    let (job_tx, job_rx) = bounded::<(usize, Range<usize>)>(workers * 4);
    let (result_tx, result_rx) = unbounded::<FeatureVector>();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (id, range) in job_rx {
                    if let Some(row) = extract_window(columns, id, range) {
                        if result_tx.send(row).is_err() {
                            break;
                        }
                    }
                }
            });
        }
        drop(job_rx);
        drop(result_tx);

        for job in windower.iter().enumerate() {
            if job_tx.send(job).is_err() {
                break;
            }
        }
        drop(job_tx);

        result_rx.iter().collect()
    })
}
