//! Synheart Motion - Batch feature extraction for wearable motion recordings
//!
//! Motion turns a raw multichannel recording (tri-axial acceleration, heart rate,
//! skin temperature, activity label) into a table of fixed-size feature vectors
//! through a deterministic pipeline: zero-phase high-pass filtering → windowing
//! → per-window feature extraction and labeling → optional standardization.
//!
//! ## Modules
//!
//! - **Pipeline**: [`FeaturePipeline`] and [`samples_to_features`] orchestrate a run
//! - **Stages**: [`filter`], [`windowing`], [`features`], [`labels`], [`normalizer`]
//! - **Schema**: CSV adapter for the documented input/output columns
//! - **Generator**: seeded synthetic sessions following the activity protocol

pub mod config;
pub mod error;
pub mod features;
pub mod filter;
pub mod generator;
pub mod labels;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod types;
pub mod windowing;

pub use config::PipelineConfig;
pub use error::{ComputeError, PipelineWarning};
pub use pipeline::{samples_to_features, FeaturePipeline, PipelineOutput};
pub use types::{Activity, FeatureTable, FeatureVector, Sample, SampleColumns, FEATURE_NAMES};

// Schema exports
pub use schema::{SampleAdapter, SchemaError, SCHEMA_VERSION};

/// Motion version reported by the CLI
pub const MOTION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI
pub const PRODUCER_NAME: &str = "synheart-motion";
