//! Run configuration
//!
//! Every location the pipeline touches is injected here; nothing is read
//! from ambient globals. The headless binary fills this from command-line
//! arguments.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CblError, Result};
use crate::grid::GridFileNaming;

/// Grid days kept open at once. A 24-hour walk spans at most two days.
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Locations and tuning for one batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory of daily trajectory files
    pub trajectory_dir: PathBuf,
    /// File-name ending that marks trajectory files
    pub trajectory_extension: String,
    /// Directory of daily cloud grid files
    pub grid_dir: PathBuf,
    pub grid_naming: GridFileNaming,
    /// Transit-limit CSV table
    pub transit_table: PathBuf,
    /// Output CSV table
    pub output: PathBuf,
    /// Grid days held in the cache
    pub cache_capacity: usize,
    /// Worker threads for trajectory walks (0 = one per core)
    pub workers: usize,
    /// Walk trajectories of a file in parallel
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            trajectory_dir: PathBuf::from("."),
            trajectory_extension: "nc".to_string(),
            grid_dir: PathBuf::from("."),
            grid_naming: GridFileNaming::default(),
            transit_table: PathBuf::from("transit_limits.csv"),
            output: PathBuf::from("24hrUCVF.csv"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            workers: 0,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    /// Check settings that would otherwise fail deep inside a run
    ///
    /// # Errors
    /// Returns `CblError::Config` describing the first bad setting.
    pub fn validate(&self) -> Result<()> {
        if self.cache_capacity == 0 {
            return Err(CblError::Config(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.trajectory_extension.trim_start_matches('.').is_empty() {
            return Err(CblError::Config(
                "trajectory_extension must not be empty".to_string(),
            ));
        }
        if self.grid_naming.prefix.is_empty() {
            return Err(CblError::Config("grid prefix must not be empty".to_string()));
        }
        Ok(())
    }

    /// Cache capacity as a non-zero count
    ///
    /// # Errors
    /// Returns `CblError::Config` when the capacity is zero.
    pub fn cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.cache_capacity)
            .ok_or_else(|| CblError::Config("cache_capacity must be at least 1".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache_capacity().unwrap().get(), DEFAULT_CACHE_CAPACITY);
        assert!(config.parallel);
    }

    #[test]
    fn test_zero_cache_rejected() {
        let config = PipelineConfig {
            cache_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(config.validate(), Err(CblError::Config(_))));
        assert!(config.cache_capacity().is_err());
    }

    #[test]
    fn test_empty_extension_rejected() {
        let config = PipelineConfig {
            trajectory_extension: ".".to_string(),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
