//! Point queries against the daily cloud grids

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use super::cache::GridCache;
use super::dataset::CloudGrid;
use super::geometry::{grid_index, nearest_time_index, CLOUD_LEVEL_INDEX};
use super::sample::{CloudField, CloudGridSample};
use crate::error::Result;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Anything that can report cloud properties at a time and place
///
/// The backward walker is written against this trait so it can be driven by
/// the real grid cache or by fixed per-hour samples in tests.
pub trait CloudSampleSource: Sync {
    /// # Errors
    /// Returns an error only when the underlying dataset cannot be opened.
    /// Missing data is reported through the sample's empty fields.
    fn sample_at(&self, time: NaiveDateTime, lat: f64, lon: f64) -> Result<CloudGridSample>;
}

/// Sample one grid at `hour_of_day` and a coordinate.
///
/// Never fails: a coordinate outside the grid, an absent variable or a
/// fill value leaves the corresponding field empty.
pub fn sample_grid(grid: &CloudGrid, hour_of_day: u32, lat: f64, lon: f64) -> CloudGridSample {
    let target = f64::from(hour_of_day) * SECONDS_PER_HOUR;
    let Some(time_index) = nearest_time_index(grid.time_offsets(), target) else {
        return CloudGridSample::MISSING;
    };

    let read = |field: CloudField| -> Option<f64> {
        let array = grid.field(field)?;
        let cell = grid_index(lat, lon, array.rows(), array.cols())?;
        array.get([time_index, cell.row, cell.col, CLOUD_LEVEL_INDEX])
    };

    CloudGridSample::from_raw(
        read(CloudField::BaseHeight),
        read(CloudField::TopHeight),
        read(CloudField::Fraction),
    )
}

/// Resolves `(date, hour, lat, lon)` queries through the per-date cache
#[derive(Debug, Clone, Copy)]
pub struct GridSampler<'a> {
    cache: &'a GridCache,
}

impl<'a> GridSampler<'a> {
    pub fn new(cache: &'a GridCache) -> Self {
        Self { cache }
    }

    /// Cloud properties for a date, hour of day and coordinate.
    ///
    /// # Errors
    /// Returns an error if the grid file for `date` cannot be opened.
    pub fn sample(
        &self,
        date: NaiveDate,
        hour_of_day: u32,
        lat: f64,
        lon: f64,
    ) -> Result<CloudGridSample> {
        let grid = self.cache.get(date)?;
        Ok(sample_grid(&grid, hour_of_day, lat, lon))
    }
}

impl CloudSampleSource for GridSampler<'_> {
    fn sample_at(&self, time: NaiveDateTime, lat: f64, lon: f64) -> Result<CloudGridSample> {
        self.sample(time.date(), time.hour(), lat, lon)
    }
}
