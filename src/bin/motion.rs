//! Motion CLI - Command-line interface for Synheart Motion
//!
//! Commands:
//! - transform: Turn a raw sample CSV into a feature table CSV
//! - generate: Write a seeded synthetic session CSV
//! - validate: Check a raw sample CSV against the input schema
//! - schema: Print input or output column layouts

use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::NamedTempFile;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use synheart_motion::generator::SessionGenerator;
use synheart_motion::schema::{
    parse_timestamp, SampleAdapter, ValidationReport, OUTPUT_COLUMNS, REQUIRED_COLUMNS,
    SCHEMA_VERSION,
};
use synheart_motion::{ComputeError, FeaturePipeline, PipelineConfig, Sample};
use synheart_motion::{MOTION_VERSION, PRODUCER_NAME};

/// Motion - Batch feature extraction for wearable motion recordings
#[derive(Parser)]
#[command(name = "motion")]
#[command(author = "Synheart AI Inc")]
#[command(version = MOTION_VERSION)]
#[command(about = "Turn wearable motion recordings into window feature tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract window features from a raw sample CSV
    Transform {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// JSON config file; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Sample rate in Hz
        #[arg(long)]
        fs: Option<f64>,

        /// Window duration in seconds
        #[arg(long)]
        win_s: Option<f64>,

        /// Fractional overlap between windows, in [0, 1)
        #[arg(long)]
        overlap: Option<f64>,

        /// Z-score every feature column over the whole table
        #[arg(long)]
        standardize: bool,

        /// High-pass cutoff in Hz
        #[arg(long)]
        cutoff: Option<f64>,

        /// Butterworth filter order
        #[arg(long)]
        filter_order: Option<usize>,

        /// Worker threads for feature extraction
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Generate a synthetic labeled session
    Generate {
        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Protocol length in minutes (missing activities are appended)
        #[arg(long, default_value = "10")]
        minutes: u32,

        /// Sample rate in Hz (1 to 1000)
        #[arg(long, default_value = "50")]
        fs: u32,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Timestamp of the first sample (RFC 3339, default: now)
        #[arg(long)]
        start: Option<String>,
    },

    /// Validate a raw sample CSV
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (motion.raw_sample.v1)
    Input,
    /// Output schema (feature table)
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), MotionCliError> {
    match cli.command {
        Commands::Transform {
            input,
            output,
            config,
            fs,
            win_s,
            overlap,
            standardize,
            cutoff,
            filter_order,
            workers,
        } => {
            let mut pipeline_config = match config {
                Some(path) => PipelineConfig::from_json_file(&path)?,
                None => PipelineConfig::default(),
            };
            if let Some(fs) = fs {
                pipeline_config.fs = fs;
            }
            if let Some(win_s) = win_s {
                pipeline_config.win_s = win_s;
            }
            if let Some(overlap) = overlap {
                pipeline_config.overlap = overlap;
            }
            if standardize {
                pipeline_config.standardize = true;
            }
            if let Some(cutoff) = cutoff {
                pipeline_config.cutoff = cutoff;
            }
            if let Some(filter_order) = filter_order {
                pipeline_config.filter_order = filter_order;
            }
            if let Some(workers) = workers {
                pipeline_config.workers = workers;
            }

            cmd_transform(&input, &output, pipeline_config)
        }

        Commands::Generate {
            output,
            minutes,
            fs,
            seed,
            start,
        } => cmd_generate(&output, minutes, fs, seed, start.as_deref()),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Schema { schema_type, json } => cmd_schema(schema_type, json),
    }
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    config: PipelineConfig,
) -> Result<(), MotionCliError> {
    // Fail on bad parameters before touching the input
    let pipeline = FeaturePipeline::new(config)?;

    let samples = read_samples(input)?;
    let result = pipeline.run(&samples)?;
    let table = result.table();

    write_output(output, |writer| {
        SampleAdapter::write_feature_table(writer, table)
    })?;

    info!(
        input = %input.display(),
        output = %output.display(),
        windows = table.len(),
        warnings = result.warnings.len(),
        "wrote feature table"
    );

    Ok(())
}

fn cmd_generate(
    output: &Path,
    minutes: u32,
    fs: u32,
    seed: u64,
    start: Option<&str>,
) -> Result<(), MotionCliError> {
    let start = match start {
        Some(value) => parse_timestamp(value).ok_or_else(|| {
            MotionCliError::InvalidArgument(format!("cannot parse start time '{value}'"))
        })?,
        None => Utc::now(),
    };

    let mut generator = SessionGenerator::new(seed);
    let samples = generator.generate_session(minutes, fs, start)?;

    write_output(output, |writer| SampleAdapter::write_samples(writer, &samples))?;

    info!(
        output = %output.display(),
        rows = samples.len(),
        seed,
        "wrote synthetic session"
    );

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), MotionCliError> {
    let report = if is_stdio(input) {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        SampleAdapter::validate_csv(buffer.as_slice())?
    } else {
        SampleAdapter::validate_csv(fs::File::open(input)?)?
    };

    let summary = ValidationSummary::from(&report);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Schema:       {}", summary.schema_version);
        println!("Rows checked: {}", summary.rows);
        println!("Issues:       {}", summary.issues.len());

        if !summary.issues.is_empty() {
            println!("\nIssues:");
            for issue in &summary.issues {
                match issue.row {
                    Some(row) => println!("  - Row {}: {}", row, issue.message),
                    None => println!("  - {}", issue.message),
                }
            }
        }
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(MotionCliError::ValidationFailed(report.issues.len()))
    }
}

fn cmd_schema(schema_type: SchemaType, json: bool) -> Result<(), MotionCliError> {
    match schema_type {
        SchemaType::Input => {
            if json {
                let schema = serde_json::json!({
                    "schema": SCHEMA_VERSION,
                    "format": "csv",
                    "required_columns": REQUIRED_COLUMNS,
                });
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else {
                println!("Input Schema: {}", SCHEMA_VERSION);
                println!();
                println!("CSV with a header row; column order is free, extra columns are ignored.");
                println!("Rows must be in strictly increasing timestamp order.");
                println!();
                println!("- timestamp:  RFC 3339 (offset-less values are read as UTC)");
                println!("- ax, ay, az: acceleration in m/s²");
                println!("- heart_rate: beats per minute");
                println!("- skin_temp:  degrees Celsius");
                println!("- activity:   sitting | walking | running | stairs");
            }
        }
        SchemaType::Output => {
            if json {
                let schema = serde_json::json!({
                    "producer": PRODUCER_NAME,
                    "version": MOTION_VERSION,
                    "format": "csv",
                    "columns": OUTPUT_COLUMNS,
                });
                println!("{}", serde_json::to_string_pretty(&schema)?);
            } else {
                println!("Output Schema: feature table");
                println!();
                println!("One row per window, ordered by window_id:");
                println!();
                println!("- <channel>_mean, _std, _min, _max for ax, ay, az, mag, hr, temp");
                println!("- sma: mean|ax| + mean|ay| + mean|az|");
                println!("- ax_ac1, ay_ac1, az_ac1: lag-1 autocorrelation");
                println!("- activity: most frequent label in the window");
                println!("- window_id: 0-based window index");
                println!();
                println!("Columns: {}", OUTPUT_COLUMNS.join(","));
            }
        }
    }

    Ok(())
}

// Helper functions

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_samples(input: &Path) -> Result<Vec<Sample>, MotionCliError> {
    let samples = if is_stdio(input) {
        SampleAdapter::read_csv(io::stdin().lock())?
    } else {
        SampleAdapter::read_csv_path(input)?
    };
    Ok(samples)
}

/// Write to stdout, or to a temporary file in the destination directory that
/// replaces `path` only once `write` has succeeded.
fn write_output<F>(path: &Path, write: F) -> Result<(), MotionCliError>
where
    F: FnOnce(&mut dyn Write) -> Result<(), ComputeError>,
{
    if is_stdio(path) {
        let mut stdout = io::stdout().lock();
        write(&mut stdout)?;
        stdout.flush()?;
        return Ok(());
    }

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    write(&mut file)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| MotionCliError::Io(e.error))?;
    Ok(())
}

// Error types

#[derive(Debug)]
enum MotionCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    InvalidArgument(String),
    ValidationFailed(usize),
}

impl From<io::Error> for MotionCliError {
    fn from(e: io::Error) -> Self {
        MotionCliError::Io(e)
    }
}

impl From<ComputeError> for MotionCliError {
    fn from(e: ComputeError) -> Self {
        MotionCliError::Compute(e)
    }
}

impl From<serde_json::Error> for MotionCliError {
    fn from(e: serde_json::Error) -> Self {
        MotionCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MotionCliError> for CliError {
    fn from(e: MotionCliError) -> Self {
        match e {
            MotionCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MotionCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::InputSchema(_) => (
                        "INPUT_SCHEMA",
                        format!("Ensure input matches {SCHEMA_VERSION}; run 'motion validate' for details"),
                    ),
                    ComputeError::FilterInstability(_) => (
                        "FILTER_INSTABILITY",
                        "Use a longer recording, a lower filter order, or a cutoff below fs/2".to_string(),
                    ),
                    ComputeError::InvalidConfig(_) => (
                        "INVALID_CONFIG",
                        "Check --fs, --win-s, --overlap, --cutoff, --filter-order and --workers".to_string(),
                    ),
                    ComputeError::Csv(_) => ("CSV_ERROR", "Check CSV syntax".to_string()),
                    ComputeError::Io(_) => (
                        "IO_ERROR",
                        "Check file paths and permissions".to_string(),
                    ),
                    ComputeError::JsonError(_) => (
                        "JSON_ERROR",
                        "Check config file JSON syntax".to_string(),
                    ),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
            MotionCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MotionCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                message: msg,
                hint: Some("Run 'motion --help' for usage".to_string()),
            },
            MotionCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} schema issues found", count),
                hint: Some("Fix the reported rows and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationSummary {
    schema_version: String,
    rows: usize,
    valid: bool,
    issues: Vec<ValidationIssue>,
}

#[derive(serde::Serialize)]
struct ValidationIssue {
    row: Option<usize>,
    message: String,
}

impl From<&ValidationReport> for ValidationSummary {
    fn from(report: &ValidationReport) -> Self {
        ValidationSummary {
            schema_version: SCHEMA_VERSION.to_string(),
            rows: report.rows,
            valid: report.is_valid(),
            issues: report
                .issues
                .iter()
                .map(|e| ValidationIssue {
                    row: e.row(),
                    message: e.to_string(),
                })
                .collect(),
        }
    }
}
