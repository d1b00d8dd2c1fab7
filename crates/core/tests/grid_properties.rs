//! Grid indexing, monotone accumulation and output formatting properties

use std::num::NonZeroUsize;

use cbl_hours_core::core_types::Meters;
use cbl_hours_core::grid::{grid_index, nearest_time_index, sample_grid, CloudField, FieldArray};
use cbl_hours_core::{
    BackwardTrajectoryWalker, CloudGrid, GridCache, GridSampler, HoursInCblRecord,
    MixingClassifier, Result, Trajectory,
};
use chrono::NaiveDate;

#[test]
fn test_index_total_and_bounded_over_grid_coverage() {
    // Rows run from 43.0°N (row 0) down to 28.5°N (row 29)
    for lat_step in 0..=58 {
        let lat = 28.5 + 0.25 * f64::from(lat_step);
        for lon_step in 0..=58 {
            let lon = -130.0 + 0.25 * f64::from(lon_step);
            let index = grid_index(lat, lon, 30, 30)
                .unwrap_or_else(|| panic!("({lat}, {lon}) should be on the grid"));
            assert!(index.row < 30 && index.col < 30);
        }
    }
}

#[test]
fn test_index_missing_off_grid() {
    // South of the anchor row, west of the first column, east of the last
    for (lat, lon) in [
        (21.0, -120.0),
        (28.0, -120.0),
        (30.0, -131.0),
        (30.0, -115.0),
        (44.0, -120.0),
        (f64::NAN, -120.0),
        (30.0, f64::INFINITY),
    ] {
        assert_eq!(grid_index(lat, lon, 30, 30), None, "({lat}, {lon})");
    }
}

#[test]
fn test_half_cell_ties_round_to_even() {
    // 28.75 is halfway between rows 29 and 28; (0.25 / 0.5) rounds to 0
    assert_eq!(grid_index(28.75, -130.0, 30, 30).unwrap().row, 29);
    // 29.25 → 1.5 steps → 2
    assert_eq!(grid_index(29.25, -130.0, 30, 30).unwrap().row, 27);
    // -129.75 → 0.5 steps → 0
    assert_eq!(grid_index(30.0, -129.75, 30, 30).unwrap().col, 0);
}

#[test]
fn test_nearest_time_tie_takes_lowest_index() {
    let offsets = [0.0, 1800.0, 5400.0, 7200.0];
    assert_eq!(nearest_time_index(&offsets, 3600.0), Some(1));
    assert_eq!(nearest_time_index(&offsets, 7000.0), Some(3));
    assert_eq!(nearest_time_index(&[], 0.0), None);
}

#[test]
fn test_sampling_off_grid_scores_zero() {
    let shape = [1, 30, 30, 2];
    let grid = CloudGrid::new(vec![0.0])
        .with_field(CloudField::BaseHeight, FieldArray::filled(shape, 0.2))
        .with_field(CloudField::TopHeight, FieldArray::filled(shape, 0.8))
        .with_field(CloudField::Fraction, FieldArray::filled(shape, 0.05));

    let sample = sample_grid(&grid, 0, 25.0, -120.0);
    assert!(sample.is_missing());
    assert_eq!(
        MixingClassifier::default().classify(Meters::new(500.0), &sample),
        0.0
    );
}

#[test]
fn test_cumulative_is_monotone_over_varied_grid() {
    let shape = [24, 30, 30, 2];
    let offsets = (0..24).map(|h| f64::from(h) * 3600.0).collect();
    let mut base = FieldArray::filled(shape, 0.0);
    let mut top = FieldArray::filled(shape, 0.0);
    let mut fraction = FieldArray::filled(shape, 0.0);
    for hour in 0..24 {
        for row in 0..30 {
            for col in 0..30 {
                let seed = (hour * 31 + row * 7 + col * 3) % 17;
                let seed = seed as f64;
                base.set([hour, row, col, 1], 0.05 * seed);
                top.set([hour, row, col, 1], 0.9 - 0.02 * seed);
                fraction.set([hour, row, col, 1], if seed > 4.0 { 0.05 } else { f64::NAN });
            }
        }
    }
    let grid = CloudGrid::new(offsets)
        .with_field(CloudField::BaseHeight, base)
        .with_field(CloudField::TopHeight, top)
        .with_field(CloudField::Fraction, fraction);
    let opener = move |_date: NaiveDate| -> Result<CloudGrid> { Ok(grid.clone()) };
    let cache = GridCache::new(Box::new(opener), NonZeroUsize::new(2).unwrap());
    let sampler = GridSampler::new(&cache);
    let walker = BackwardTrajectoryWalker::new(&sampler, MixingClassifier::default());

    let release = NaiveDate::from_ymd_opt(2023, 3, 10)
        .unwrap()
        .and_hms_opt(18, 0, 0)
        .unwrap();
    let trajectory = Trajectory::from_positional(
        release,
        (0..36).map(|k| {
            let k = f64::from(k);
            (29.0 + 0.3 * k, -128.0 + 0.35 * k, 100.0 + 25.0 * k, 0.5)
        }),
    );

    let trace = walker.walk_traced(&trajectory, 30).unwrap();
    assert_eq!(trace.steps.len(), 30);
    let mut previous = 0.0;
    for step in &trace.steps {
        assert!((0.0..1.0).contains(&step.score), "score {}", step.score);
        assert!(step.cumulative >= previous);
        previous = step.cumulative;
    }
    assert!(trace.record.cumulative_hours <= 30.0);
}

#[test]
fn test_date_utc_format_and_limit_echo() {
    let release = NaiveDate::from_ymd_opt(2024, 2, 29)
        .unwrap()
        .and_hms_opt(7, 0, 0)
        .unwrap();
    let record = HoursInCblRecord::new(release, 3.25, 18);
    assert_eq!(record.date_utc(), "2024-02-29 07:00");
    assert_eq!(record.transit_limit, 18);
}
