//! Gridded cloud-property datasets

pub mod cache;
pub mod dataset;
pub mod geometry;
#[cfg(feature = "netcdf")]
pub mod netcdf_grid;
pub mod opener;
pub mod sample;
pub mod sampler;

// Re-export main types
pub use cache::{CacheStats, GridCache};
pub use dataset::{CloudGrid, FieldArray};
pub use geometry::{grid_index, nearest_time_index, GridIndex, CLOUD_LEVEL_INDEX};
#[cfg(feature = "netcdf")]
pub use netcdf_grid::{load_cloud_grid, NetCdfGridOpener};
pub use opener::{GridFileNaming, GridOpener};
pub use sample::{CloudField, CloudGridSample, RAW_VALUE_SCALE};
pub use sampler::{sample_grid, CloudSampleSource, GridSampler};
