//! Error type shared by every stage of the pipeline
//!
//! Failures come in three scopes. Missing grid data is not an error at all
//! (it becomes a missing sample field). A release time absent from the
//! transit-limit table stops only that trajectory. Anything that makes a
//! trajectory or grid file unusable aborts the file being processed, and the
//! batch moves on to the next one.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CblError>;

/// Errors raised while computing hours in the cloud mixing layer
#[derive(Debug, Error)]
pub enum CblError {
    /// Release time has no row in the transit-limit table
    #[error("no transit limit for release time '{release_time}'")]
    Lookup { release_time: String },

    /// Trajectory file name does not encode a date the expected way
    #[error("cannot parse date from file name '{file_name}': {reason}")]
    FileNameParse { file_name: String, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File opened but its content is not usable (bad shape, wrong dimensions)
    #[error("invalid dataset {}: {message}", path.display())]
    Dataset { path: PathBuf, message: String },

    #[error("dataset {} has no variable '{variable}'", path.display())]
    MissingVariable { path: PathBuf, variable: String },

    #[error("invalid transit-limit table {}: {message}", path.display())]
    TransitTable { path: PathBuf, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("release time {release_time} cannot be stepped back {hours} hours")]
    TimeOverflow {
        release_time: NaiveDateTime,
        hours: u32,
    },

    #[cfg(feature = "netcdf")]
    #[error("netCDF error on {}: {source}", path.display())]
    NetCdf {
        path: PathBuf,
        #[source]
        source: netcdf::Error,
    },
}

impl CblError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CblError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn dataset(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        CblError::Dataset {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True when the error stops only the trajectory that raised it
    pub fn is_trajectory_fatal(&self) -> bool {
        matches!(self, CblError::Lookup { .. } | CblError::TimeOverflow { .. })
    }

    /// True when the error aborts the whole trajectory file
    pub fn is_file_fatal(&self) -> bool {
        !self.is_trajectory_fatal()
    }
}
