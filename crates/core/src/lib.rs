//! Hours-in-CBL Core Library
//!
//! Estimates how many hours an air parcel spent inside the cloud mixing
//! layer (the cloud-topped boundary layer, CBL) before arriving at a
//! surface site. Ensemble-mean back-trajectories are walked backward hour by
//! hour; at each hour the parcel position is matched against a daily 0.5°
//! cloud-property grid, and every hour spent inside a sufficiently cloudy
//! layer contributes a fractional score to the total.
//!
//! ## Pipeline
//!
//! - [`repository`] discovers daily trajectory files and reads trajectories
//! - [`transit`] resolves the backward-step limit for each release time
//! - [`grid`] opens, caches and samples the daily cloud grids
//! - [`mixing`] classifies one hour as inside or outside the cloud layer
//! - [`walker`] accumulates the per-hour scores along a trajectory
//! - [`pipeline`] drives a batch run; [`output`] writes the result table

// Core types and utilities
pub mod core_types;
pub mod error;

pub mod config;
pub mod grid;
pub mod mixing;
#[cfg(feature = "netcdf")]
mod nc;
pub mod output;
pub mod pipeline;
pub mod repository;
pub mod transit;
pub mod walker;

// Re-export core types
pub use core_types::{HoursInCblRecord, Meters, Percent, Trajectory, TrajectoryPoint};
pub use error::{CblError, Result};

// Re-export pipeline types
pub use config::PipelineConfig;
pub use grid::{CacheStats, CloudGrid, CloudGridSample, GridCache, GridOpener, GridSampler};
pub use mixing::MixingClassifier;
pub use output::{write_records, write_records_to_path, RecordWriter};
pub use pipeline::{FileFailure, Pipeline, RunReport, TrajectoryFailure};
pub use repository::{DatasetRepository, TrajectoryReader};
pub use transit::{TransitLimit, TransitLimitResolver, TransitLimitTable};
pub use walker::{BackwardTrajectoryWalker, WalkStep, WalkTrace};

#[cfg(feature = "netcdf")]
pub use grid::NetCdfGridOpener;
#[cfg(feature = "netcdf")]
pub use repository::NetCdfTrajectoryReader;
