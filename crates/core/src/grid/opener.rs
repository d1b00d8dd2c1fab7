//! Locating and opening the per-day cloud grid files

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dataset::CloudGrid;
use crate::error::Result;

/// Loads the cloud grid covering one calendar day
///
/// Implementations must be shareable between worker threads; the cache
/// serializes calls, so `open` itself need not be reentrant-safe beyond that.
pub trait GridOpener: Send + Sync {
    /// # Errors
    /// Returns an error when the day's grid file is absent, unreadable or
    /// malformed.
    fn open(&self, date: NaiveDate) -> Result<CloudGrid>;
}

impl<F> GridOpener for F
where
    F: Fn(NaiveDate) -> Result<CloudGrid> + Send + Sync,
{
    fn open(&self, date: NaiveDate) -> Result<CloudGrid> {
        self(date)
    }
}

/// Naming scheme `<prefix>.<YYYYMMDD>.<suffix>` of the daily grid files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridFileNaming {
    pub prefix: String,
    pub suffix: String,
}

impl Default for GridFileNaming {
    fn default() -> Self {
        Self {
            prefix: "epcvisstgridg18minnisX1.c1".to_string(),
            suffix: "000000.cdf".to_string(),
        }
    }
}

impl GridFileNaming {
    pub fn file_name(&self, date: NaiveDate) -> String {
        format!("{}.{}.{}", self.prefix, date.format("%Y%m%d"), self.suffix)
    }

    pub fn path_in(&self, directory: &Path, date: NaiveDate) -> PathBuf {
        directory.join(self.file_name(date))
    }
}
