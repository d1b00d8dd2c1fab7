//! Trajectory file discovery and loading
//!
//! Daily trajectory files are named `<prefix>.<prefix2>.<YYYYMMDD>.<suffix>.<ext>`
//! (for example `epcarmtrajsfcM1.c1.20230101.000000.nc`). Files are always
//! processed in ascending lexicographic order of their names; that order is
//! the order of rows in the output table.

#[cfg(feature = "netcdf")]
pub mod netcdf_reader;

#[cfg(feature = "netcdf")]
pub use netcdf_reader::NetCdfTrajectoryReader;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::core_types::Trajectory;
use crate::error::{CblError, Result};

/// Number of dot-separated parts in a trajectory file name
const FILE_NAME_PARTS: usize = 5;

/// Position of the `YYYYMMDD` part
const DATE_PART: usize = 2;

/// Loads every trajectory stored in one daily file
pub trait TrajectoryReader: Send + Sync {
    /// Trajectories in file order, one per release time
    ///
    /// # Errors
    /// Returns an error when the file is unreadable or its variables are
    /// missing or inconsistent.
    fn read(&self, path: &Path, date: NaiveDate) -> Result<Vec<Trajectory>>;
}

/// Directory of daily trajectory files
#[derive(Debug, Clone)]
pub struct DatasetRepository {
    directory: PathBuf,
    extension: String,
}

impl DatasetRepository {
    /// `extension` is matched against the end of the file name, with or
    /// without a leading dot
    pub fn new(directory: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Trajectory files sorted by name, ascending
    ///
    /// # Errors
    /// Returns `CblError::Io` if the directory cannot be listed.
    pub fn list_trajectory_files(&self) -> Result<Vec<PathBuf>> {
        let suffix = format!(".{}", self.extension);
        let entries = fs::read_dir(&self.directory).map_err(|e| CblError::io(&self.directory, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CblError::io(&self.directory, e))?;
            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping non-UTF-8 file name {}", path.display());
                continue;
            };
            if name.ends_with(&suffix) && path.is_file() {
                names.push(name);
            }
        }
        names.sort_unstable();

        debug!(
            "Found {} trajectory files in {}",
            names.len(),
            self.directory.display()
        );
        Ok(names.into_iter().map(|n| self.directory.join(n)).collect())
    }
}

/// Calendar date encoded in a trajectory file name
///
/// # Errors
/// Returns `CblError::FileNameParse` unless the name has exactly five
/// non-empty dot-separated parts with a valid `YYYYMMDD` third part.
pub fn date_of(file_name: &str) -> Result<NaiveDate> {
    let fail = |reason: &str| CblError::FileNameParse {
        file_name: file_name.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = file_name.split('.').collect();
    if parts.len() != FILE_NAME_PARTS || parts.iter().any(|p| p.is_empty()) {
        return Err(fail("expected <prefix>.<prefix2>.<YYYYMMDD>.<suffix>.<ext>"));
    }
    let date_part = parts[DATE_PART];
    if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail("date part is not YYYYMMDD"));
    }
    NaiveDate::parse_from_str(date_part, "%Y%m%d").map_err(|_| fail("date part is not a valid date"))
}

/// [`date_of`] applied to the final component of a path
///
/// # Errors
/// Returns `CblError::FileNameParse` for paths without a UTF-8 file name or
/// whose name does not encode a date.
pub fn date_of_path(path: &Path) -> Result<NaiveDate> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CblError::FileNameParse {
            file_name: path.display().to_string(),
            reason: "no UTF-8 file name".to_string(),
        })?;
    date_of(name)
}

/// Release time for a `time` value given in seconds since the file's day.
///
/// Sub-hour seconds are dropped; hours past 23 roll over into the next day.
/// Returns `None` for negative or non-finite offsets.
pub fn release_time_from_offset(date: NaiveDate, seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    let hours = (seconds / 3600.0).floor();
    if hours > f64::from(u32::MAX) {
        return None;
    }
    date.and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_hours(hours as i64)?)
}

/// True when point offsets advance by one hour per point.
///
/// Accepts offsets in hours or seconds, either sign (backward trajectories
/// often count down), relative to the first point.
pub fn offsets_are_hourly(offsets: &[f64]) -> bool {
    const TOLERANCE: f64 = 1e-6;
    let Some(&first) = offsets.first() else {
        return true;
    };
    [1.0, 3600.0].iter().any(|&unit| {
        offsets.iter().enumerate().all(|(k, &v)| {
            let steps = (v - first).abs() / unit;
            (steps - k as f64).abs() < TOLERANCE
        })
    })
}
