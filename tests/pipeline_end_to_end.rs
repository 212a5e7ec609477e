use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use synheart_motion::generator::SessionGenerator;
use synheart_motion::schema::{SampleAdapter, SchemaError, OUTPUT_COLUMNS};
use synheart_motion::{
    samples_to_features, Activity, ComputeError, PipelineConfig, PipelineWarning,
};

/// Sitting recording at 50 Hz with every input column present
fn sitting_csv(n: usize) -> String {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let mut csv = String::from("timestamp,ax,ay,az,heart_rate,skin_temp,activity\n");
    for i in 0..n {
        let ts = start + Duration::milliseconds(20 * i as i64);
        let sway = 0.02 * (i as f64 * 0.025).sin();
        writeln!(
            csv,
            "{},{:.5},{:.5},{:.5},{},{:.3},sitting",
            ts.format("%Y-%m-%dT%H:%M:%S%.3f+00:00"),
            sway,
            -sway,
            9.81 + sway,
            68 + (i % 5),
            33.2 + 0.0001 * i as f64,
        )
        .unwrap();
    }
    csv
}

fn transform(input: &Path, output: &Path, config: &PipelineConfig) -> Result<usize, ComputeError> {
    let samples = SampleAdapter::read_csv_path(input)?;
    let result = samples_to_features(&samples, config)?;
    let mut file = fs::File::create(output)?;
    SampleAdapter::write_feature_table(&mut file, result.table())?;
    Ok(result.table().len())
}

#[test]
fn ten_seconds_of_sitting_gives_nine_windows() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("session.csv");
    let output = dir.path().join("features.csv");
    fs::write(&input, sitting_csv(500)).unwrap();

    let rows = transform(&input, &output, &PipelineConfig::default()).unwrap();
    assert_eq!(rows, 9);

    let mut reader = csv::Reader::from_path(&output).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, OUTPUT_COLUMNS.to_vec());

    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 9);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(&record[28], "sitting");
        assert_eq!(record[29].parse::<usize>().unwrap(), i);
        for value in record.iter().take(28) {
            assert!(value.parse::<f64>().unwrap().is_finite());
        }
    }
}

#[test]
fn missing_skin_temp_is_rejected_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("session.csv");
    let output = dir.path().join("features.csv");

    let csv: String = sitting_csv(500)
        .lines()
        .map(|line| {
            let mut fields: Vec<&str> = line.split(',').collect();
            fields.remove(5);
            fields.join(",") + "\n"
        })
        .collect();
    fs::write(&input, csv).unwrap();

    match transform(&input, &output, &PipelineConfig::default()) {
        Err(ComputeError::InputSchema(SchemaError::MissingColumn { column })) => {
            assert_eq!(column, "skin_temp");
        }
        other => panic!("expected missing skin_temp, got {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn short_recording_yields_empty_table_and_warning() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("short.csv");
    fs::write(&input, sitting_csv(80)).unwrap();

    let samples = SampleAdapter::read_csv_path(&input).unwrap();
    let result = samples_to_features(&samples, &PipelineConfig::default()).unwrap();

    assert!(result.table().is_empty());
    assert_eq!(
        result.warnings,
        vec![PipelineWarning::InsufficientData {
            samples: 80,
            window: 100
        }]
    );

    let mut out = Vec::new();
    SampleAdapter::write_feature_table(&mut out, result.table()).unwrap();
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
}

#[test]
fn generated_session_round_trips_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("generated.csv");
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();

    // zero minutes: the protocol is one 100 s segment per activity
    let samples = SessionGenerator::new(42).generate_session(0, 50, start).unwrap();
    let mut file = fs::File::create(&input).unwrap();
    SampleAdapter::write_samples(&mut file, &samples).unwrap();
    drop(file);

    let read_back = SampleAdapter::read_csv_path(&input).unwrap();
    assert_eq!(read_back.len(), 4 * 100 * 50);

    let config = PipelineConfig {
        standardize: true,
        workers: 4,
        ..Default::default()
    };
    let result = samples_to_features(&read_back, &config).unwrap();
    let table = result.table();

    for activity in Activity::ALL {
        assert!(table.rows().iter().any(|r| r.label == activity), "{activity}");
    }

    let ids: Vec<usize> = table.rows().iter().map(|r| r.window_id).collect();
    assert_eq!(ids, (0..table.len()).collect::<Vec<_>>());

    let n = table.len() as f64;
    let mean = table.column_by_name("mag_std").unwrap().sum::<f64>() / n;
    assert!(mean.abs() < 1e-9);
}
