//! Transit-time limits keyed by trajectory release time
//!
//! The reference table is a delimited text file with a header row. Only two
//! columns matter: `Start Time` (`YYYY-MM-DD HH:MM:SS`) and `24 hr limit`
//! (an integer count of backward hourly steps). Lookups are by exact string
//! equality on the start time.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::{info, warn};

use crate::core_types::Trajectory;
use crate::error::{CblError, Result};

/// Header of the release-time column
pub const START_TIME_COLUMN: &str = "Start Time";

/// Header of the backward-step limit column
pub const LIMIT_COLUMN: &str = "24 hr limit";

/// Limit resolved for one release time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitLimit {
    /// Backward hourly steps the walk may take
    pub max_backward_steps: u32,
    /// Zero-based data row the limit came from, for audit output
    pub row_index: usize,
}

/// Immutable release-time → limit table, built once per run
#[derive(Debug, Clone, Default)]
pub struct TransitLimitTable {
    limits: FxHashMap<String, TransitLimit>,
    rows: usize,
    /// Rows whose limit could not be parsed
    skipped: usize,
}

impl TransitLimitTable {
    /// Build from `(start_time, limit)` pairs; the first row for a start
    /// time wins.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut table = Self::default();
        for (start_time, limit) in entries {
            table.insert(start_time.into(), limit);
        }
        table
    }

    /// Load the table from a CSV file
    ///
    /// Rows whose limit is not a non-negative integer are logged and left
    /// out, so only trajectories released at those times fail to resolve.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or a required column is
    /// absent.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| CblError::io(path, e))?;
        let table = Self::from_reader(file, path)?;
        info!(
            "Loaded {} transit limits ({} rows, {} skipped) from {}",
            table.len(),
            table.rows,
            table.skipped,
            path.display()
        );
        Ok(table)
    }

    /// Load from any reader; `source` is only used in error messages
    ///
    /// # Errors
    /// Same as [`TransitLimitTable::from_path`].
    pub fn from_reader<R: Read>(reader: R, source: &Path) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| table_error(source, format!("missing column '{name}'")))
        };
        let start_col = column(START_TIME_COLUMN)?;
        let limit_col = column(LIMIT_COLUMN)?;

        let mut table = Self::default();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            let start_time = record.get(start_col).unwrap_or_default();
            let raw_limit = record.get(limit_col).unwrap_or_default();
            let Some(limit) = parse_limit(raw_limit) else {
                // Only trajectories released at this time are affected
                warn!(
                    "{}: row {}: invalid limit '{}' for '{}', row skipped",
                    source.display(),
                    row + 1,
                    raw_limit,
                    start_time
                );
                table.rows += 1;
                table.skipped += 1;
                continue;
            };
            table.insert(start_time.to_string(), limit);
        }
        Ok(table)
    }

    fn insert(&mut self, start_time: String, limit: u32) {
        let row_index = self.rows;
        self.rows += 1;
        if self.limits.contains_key(&start_time) {
            warn!("Duplicate transit-limit row for '{}', keeping the first", start_time);
            return;
        }
        self.limits.insert(
            start_time,
            TransitLimit {
                max_backward_steps: limit,
                row_index,
            },
        );
    }

    /// Rows left out because their limit was unusable
    pub fn skipped_rows(&self) -> usize {
        self.skipped
    }

    pub fn get(&self, start_time: &str) -> Option<TransitLimit> {
        self.limits.get(start_time).copied()
    }

    /// Number of distinct release times
    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// Number of data rows read, duplicates included
    pub fn row_count(&self) -> usize {
        self.rows
    }
}

/// Resolves release times against a preloaded table
#[derive(Debug, Clone, Copy)]
pub struct TransitLimitResolver<'a> {
    table: &'a TransitLimitTable,
}

impl<'a> TransitLimitResolver<'a> {
    pub fn new(table: &'a TransitLimitTable) -> Self {
        Self { table }
    }

    /// Limit for a `"YYYY-MM-DD HH:MM:SS"` release time
    ///
    /// # Errors
    /// Returns `CblError::Lookup` when the table has no such start time.
    pub fn resolve(&self, release_time: &str) -> Result<TransitLimit> {
        self.table
            .get(release_time)
            .ok_or_else(|| CblError::Lookup {
                release_time: release_time.to_string(),
            })
    }

    /// Limit for a trajectory's release time
    ///
    /// # Errors
    /// Returns `CblError::Lookup` when the table has no such start time.
    pub fn resolve_trajectory(&self, trajectory: &Trajectory) -> Result<TransitLimit> {
        self.resolve(&trajectory.lookup_key())
    }
}

/// Integer limit; `"12.0"` is accepted because spreadsheet exports write
/// integer columns that way
fn parse_limit(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(limit) = raw.parse::<u32>() {
        return Some(limit);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Some(value as u32)
    } else {
        None
    }
}

fn table_error(source: &Path, message: String) -> CblError {
    CblError::TransitTable {
        path: PathBuf::from(source),
        message,
    }
}
