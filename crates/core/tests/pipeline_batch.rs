//! Batch runs over a directory of trajectory files
//!
//! Trajectory files are empty placeholders on disk; a fake reader derives
//! the trajectories from the file's date so ordering, failure isolation and
//! output stability can be checked through `Pipeline::run`.

use std::fs::{self, File};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cbl_hours_core::grid::{CloudField, FieldArray};
use cbl_hours_core::{
    write_records_to_path, CblError, CloudGrid, Pipeline, PipelineConfig, Result, Trajectory,
    TrajectoryReader,
};
use chrono::{Datelike, NaiveDate};

const SHAPE: [usize; 4] = [24, 30, 30, 2];

/// Route pipeline logs through the test harness (`RUST_LOG=debug` to see them)
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Three releases per day at 00, 06 and 12 UTC; position drifts with the
/// day so different files give different scores
struct DailyReleases {
    /// Day-of-month whose file is corrupt
    corrupt_day: Option<u32>,
}

impl TrajectoryReader for DailyReleases {
    fn read(&self, path: &Path, date: NaiveDate) -> Result<Vec<Trajectory>> {
        if self.corrupt_day == Some(date.day()) {
            return Err(CblError::Dataset {
                path: path.to_path_buf(),
                message: "truncated file".to_string(),
            });
        }
        let drift = f64::from(date.day()) * 0.5;
        Ok([0, 6, 12]
            .into_iter()
            .map(|hour| {
                let release = date.and_hms_opt(hour, 0, 0).unwrap();
                let rows = (0..30).map(|k| {
                    let k = f64::from(k);
                    (30.0 + 0.25 * k, -125.0 + drift, 150.0 + 40.0 * k, 0.7)
                });
                Trajectory::from_positional(release, rows)
            })
            .collect())
    }
}

/// Grid whose cloud base rises with the hour of day
fn hourly_grid(date: NaiveDate) -> CloudGrid {
    let offsets = (0..24).map(|h| f64::from(h) * 3600.0).collect();
    let mut base = FieldArray::filled(SHAPE, 0.1);
    for hour in 0..24 {
        for row in 0..30 {
            for col in 0..30 {
                let raw = 0.1 + 0.02 * hour as f64 + 0.001 * (row + col) as f64;
                base.set([hour, row, col, 1], raw);
            }
        }
    }
    // Thin cloud on even days at the release cell
    let fraction_raw = if date.day() % 2 == 0 { 0.015 } else { 0.06 };
    CloudGrid::new(offsets)
        .with_field(CloudField::BaseHeight, base)
        .with_field(CloudField::TopHeight, FieldArray::filled(SHAPE, 1.8))
        .with_field(CloudField::Fraction, FieldArray::filled(SHAPE, fraction_raw))
}

struct Fixture {
    dir: tempfile::TempDir,
    config: PipelineConfig,
}

fn fixture(days: &[u32]) -> Fixture {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let trajectories = dir.path().join("traj");
    fs::create_dir(&trajectories).unwrap();

    // Created out of order; the run must sort by name
    for &day in days.iter().rev() {
        let name = format!("epcarmtrajsfcM1.c1.202301{day:02}.000000.nc");
        File::create(trajectories.join(name)).unwrap();
    }
    File::create(trajectories.join("README.txt")).unwrap();

    let mut table = String::from("Site,Start Time,24 hr limit,Notes\n");
    for &day in days {
        for hour in [0, 6, 12] {
            // 06 UTC on day 3 is absent
            if day == 3 && hour == 6 {
                continue;
            }
            let limit = if hour == 12 { "12.0".to_string() } else { "24".to_string() };
            table.push_str(&format!("SGP,2023-01-{day:02} {hour:02}:00:00,{limit},\n"));
        }
    }
    let transit_table = dir.path().join("limits.csv");
    fs::write(&transit_table, table).unwrap();

    let config = PipelineConfig {
        trajectory_dir: trajectories,
        transit_table,
        output: dir.path().join("24hrUCVF.csv"),
        ..PipelineConfig::default()
    };
    Fixture { dir, config }
}

fn counting_opener(opens: Arc<AtomicUsize>) -> impl Fn(NaiveDate) -> Result<CloudGrid> + Send + Sync {
    move |date: NaiveDate| -> Result<CloudGrid> {
        opens.fetch_add(1, Ordering::SeqCst);
        Ok(hourly_grid(date))
    }
}

#[test]
fn test_records_follow_file_then_trajectory_order() {
    let fx = fixture(&[4, 2, 3]);
    let reader = DailyReleases { corrupt_day: None };
    let opens = Arc::new(AtomicUsize::new(0));

    let report = Pipeline::run(&fx.config, &reader, Box::new(counting_opener(opens))).unwrap();

    let dates: Vec<String> = report.records.iter().map(|r| r.date_utc()).collect();
    assert_eq!(
        dates,
        [
            "2023-01-02 00:00",
            "2023-01-02 06:00",
            "2023-01-02 12:00",
            "2023-01-03 00:00",
            "2023-01-03 12:00",
            "2023-01-04 00:00",
            "2023-01-04 06:00",
            "2023-01-04 12:00",
        ]
    );
    assert_eq!(report.files_processed, 3);
    assert_eq!(report.trajectory_failures.len(), 1);
    assert!(report.file_failures.is_empty());

    // Transit limits are echoed, "12.0" included
    for record in &report.records {
        let expected = if record.date_utc().ends_with("12:00") { 12 } else { 24 };
        assert_eq!(record.transit_limit, expected);
    }
}

#[test]
fn test_corrupt_file_does_not_disturb_other_files() {
    let fx = fixture(&[1, 2, 3]);
    let clean_reader = DailyReleases { corrupt_day: None };
    let broken_reader = DailyReleases {
        corrupt_day: Some(2),
    };

    let clean = Pipeline::run(
        &fx.config,
        &clean_reader,
        Box::new(counting_opener(Arc::default())),
    )
    .unwrap();
    let broken = Pipeline::run(
        &fx.config,
        &broken_reader,
        Box::new(counting_opener(Arc::default())),
    )
    .unwrap();

    assert_eq!(broken.file_failures.len(), 1);
    assert!(broken.file_failures[0]
        .file
        .to_string_lossy()
        .contains("20230102"));

    let kept: Vec<_> = clean
        .records
        .iter()
        .filter(|r| !r.date_utc().starts_with("2023-01-02"))
        .copied()
        .collect();
    assert_eq!(broken.records, kept);
}

#[test]
fn test_grid_open_failure_aborts_file() {
    let fx = fixture(&[5, 6]);
    let reader = DailyReleases { corrupt_day: None };
    let opener = |date: NaiveDate| -> Result<CloudGrid> {
        if date.day() == 6 {
            return Err(CblError::Dataset {
                path: format!("grid.{date}.cdf").into(),
                message: "unreadable".to_string(),
            });
        }
        Ok(hourly_grid(date))
    };

    let report = Pipeline::run(&fx.config, &reader, Box::new(opener)).unwrap();

    assert_eq!(report.file_failures.len(), 1);
    assert!(report
        .records
        .iter()
        .all(|r| r.date_utc().starts_with("2023-01-05")));
    // Day 5 walks back only into day 5 and day 4
    assert_eq!(report.records.len(), 3);
}

#[test]
fn test_rerun_output_is_byte_identical() {
    let fx = fixture(&[1, 2, 3]);
    let reader = DailyReleases { corrupt_day: None };

    let first = Pipeline::run(&fx.config, &reader, Box::new(counting_opener(Arc::default())))
        .unwrap();
    write_records_to_path(&first.records, &fx.config.output).unwrap();
    let first_bytes = fs::read(&fx.config.output).unwrap();

    let sequential = PipelineConfig {
        parallel: false,
        workers: 2,
        cache_capacity: 1,
        ..fx.config.clone()
    };
    let second = Pipeline::run(&sequential, &reader, Box::new(counting_opener(Arc::default())))
        .unwrap();
    let second_path = fx.dir.path().join("again.csv");
    write_records_to_path(&second.records, &second_path).unwrap();

    assert_eq!(first_bytes, fs::read(&second_path).unwrap());
    let text = String::from_utf8(first_bytes).unwrap();
    assert!(text.starts_with("dateUTC,24hr-UCVF,transit_time_limit\n"));
    assert_eq!(text.lines().count(), 1 + first.records.len());
}

#[test]
fn test_each_day_opened_once_with_room_in_cache() {
    let fx = fixture(&[1, 2, 3]);
    let reader = DailyReleases { corrupt_day: None };
    let opens = Arc::new(AtomicUsize::new(0));

    let report =
        Pipeline::run(&fx.config, &reader, Box::new(counting_opener(Arc::clone(&opens)))).unwrap();

    // Dec 31 plus Jan 1-3
    assert_eq!(opens.load(Ordering::SeqCst), 4);
    assert_eq!(report.cache_stats.opens, 4);
    assert_eq!(report.cache_stats.evictions, 0);
    assert!(report.cache_stats.hits > 0);
}

#[test]
fn test_missing_transit_table_stops_run() {
    let fx = fixture(&[1]);
    let config = PipelineConfig {
        transit_table: fx.dir.path().join("nope.csv"),
        ..fx.config.clone()
    };
    let reader = DailyReleases { corrupt_day: None };
    let err = Pipeline::run(&config, &reader, Box::new(counting_opener(Arc::default())))
        .unwrap_err();
    assert!(matches!(err, CblError::Io { .. }));
}

#[test]
fn test_unusable_limit_row_fails_only_its_release_time() {
    let fx = fixture(&[1]);
    let mut table = fs::read_to_string(&fx.config.transit_table).unwrap();
    table.push_str("SGP,2023-05-05 09:00:00,,blank\n");
    // A release time that a trajectory actually uses loses its limit too
    let table = table.replace("2023-01-01 06:00:00,24,", "2023-01-01 06:00:00,,");
    fs::write(&fx.config.transit_table, table).unwrap();
    let reader = DailyReleases { corrupt_day: None };

    let report = Pipeline::run(&fx.config, &reader, Box::new(counting_opener(Arc::default())))
        .unwrap();

    let dates: Vec<String> = report.records.iter().map(|r| r.date_utc()).collect();
    assert_eq!(dates, ["2023-01-01 00:00", "2023-01-01 12:00"]);
    assert_eq!(report.trajectory_failures.len(), 1);
    assert!(matches!(
        report.trajectory_failures[0].error,
        CblError::Lookup { .. }
    ));
    assert!(report.file_failures.is_empty());
}
