//! CSV adapter for motion.raw_sample.v1 input and feature table output
//!
//! Reading is all-or-nothing: the first schema violation aborts with a
//! [`SchemaError`] before any processing. [`SampleAdapter::validate_csv`] walks
//! the whole file instead and reports every violation it finds.

use crate::error::ComputeError;
use crate::schema::raw_sample::*;
use crate::types::{FeatureTable, Sample};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Adapter between CSV files and pipeline types
pub struct SampleAdapter;

impl SampleAdapter {
    /// Read and validate samples from CSV
    pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Sample>, ComputeError> {
        let mut csv_reader = build_reader(reader);
        let headers = csv_reader.headers()?.clone();
        check_headers(&headers)?;

        let mut samples: Vec<Sample> = Vec::new();
        for (idx, record) in csv_reader.deserialize::<RawSample>().enumerate() {
            let row = idx + 1;
            let raw = record.map_err(|e| row_error(row, &headers, e))?;
            let sample = raw.into_sample(row)?;

            if let Some(prev) = samples.last() {
                if sample.timestamp <= prev.timestamp {
                    return Err(SchemaError::NonIncreasingTimestamp { row }.into());
                }
            }
            samples.push(sample);
        }

        if samples.is_empty() {
            return Err(SchemaError::Empty.into());
        }

        Ok(samples)
    }

    /// Read and validate samples from a CSV file
    pub fn read_csv_path(path: &Path) -> Result<Vec<Sample>, ComputeError> {
        let file = File::open(path)?;
        Self::read_csv(file)
    }

    /// Check a CSV input against the schema without stopping at the first problem
    pub fn validate_csv<R: Read>(reader: R) -> Result<ValidationReport, ComputeError> {
        let mut csv_reader = build_reader(reader);
        let headers = csv_reader.headers()?.clone();

        let missing: Vec<SchemaError> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !headers.iter().any(|h| h == *column))
            .map(|column| SchemaError::MissingColumn {
                column: column.to_string(),
            })
            .collect();
        if !missing.is_empty() {
            return Ok(ValidationReport {
                rows: 0,
                issues: missing,
            });
        }

        let mut report = ValidationReport::default();
        let mut last_timestamp: Option<DateTime<Utc>> = None;

        for (idx, record) in csv_reader.deserialize::<RawSample>().enumerate() {
            let row = idx + 1;
            report.rows = row;

            let sample = match record {
                Ok(raw) => raw.into_sample(row),
                Err(e) => Err(row_error(row, &headers, e)),
            };
            match sample {
                Ok(sample) => {
                    if last_timestamp.is_some_and(|prev| sample.timestamp <= prev) {
                        report
                            .issues
                            .push(SchemaError::NonIncreasingTimestamp { row });
                    }
                    last_timestamp = Some(sample.timestamp);
                }
                Err(e) => report.issues.push(e),
            }
        }

        if report.rows == 0 {
            report.issues.push(SchemaError::Empty);
        }

        Ok(report)
    }

    /// Write a feature table with the [`OUTPUT_COLUMNS`] header.
    ///
    /// An empty table produces a header-only file.
    pub fn write_feature_table<W: Write>(
        writer: W,
        table: &FeatureTable,
    ) -> Result<(), ComputeError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(OUTPUT_COLUMNS)?;

        for row in table.rows() {
            let mut record: Vec<String> = row.values.iter().map(|v| v.to_string()).collect();
            record.push(row.label.to_string());
            record.push(row.window_id.to_string());
            csv_writer.write_record(&record)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Write samples in the input layout, timestamps at millisecond precision
    pub fn write_samples<W: Write>(writer: W, samples: &[Sample]) -> Result<(), ComputeError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(REQUIRED_COLUMNS)?;

        for s in samples {
            csv_writer.write_record(&[
                s.timestamp.to_rfc3339_opts(SecondsFormat::Millis, false),
                s.ax.to_string(),
                s.ay.to_string(),
                s.az.to_string(),
                s.heart_rate.to_string(),
                s.skin_temp.to_string(),
                s.activity.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

/// Outcome of [`SampleAdapter::validate_csv`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Data rows examined
    pub rows: usize,
    pub issues: Vec<SchemaError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

fn build_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader)
}

fn check_headers(headers: &csv::StringRecord) -> Result<(), SchemaError> {
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SchemaError::MissingColumn {
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Map a csv deserialization failure to a row-level schema error
fn row_error(row: usize, headers: &csv::StringRecord, err: csv::Error) -> SchemaError {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => {
            let column = err
                .field()
                .and_then(|i| headers.get(i as usize))
                .map(|c| c.to_string());
            match column {
                Some(column) => SchemaError::InvalidValue {
                    row,
                    column,
                    message: err.kind().to_string(),
                },
                None => SchemaError::MalformedRow {
                    row,
                    message: err.to_string(),
                },
            }
        }
        _ => SchemaError::MalformedRow {
            row,
            message: err.to_string(),
        },
    }
}
