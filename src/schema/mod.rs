//! motion.raw_sample.v1 CSV schema
//!
//! Defines the input record layout (one row per sample) and the feature table
//! output layout, plus the adapter that reads and writes them with `csv`.

mod raw_sample;
mod adapter;

pub use raw_sample::*;
pub use adapter::*;
