//! Reading ensemble-mean back-trajectories from daily netCDF files

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{offsets_are_hourly, release_time_from_offset, TrajectoryReader};
use crate::core_types::Trajectory;
use crate::error::{CblError, Result};
use crate::nc;

/// Release time of each trajectory, seconds since the file's day
pub const TIME_VARIABLE: &str = "time";
pub const LATITUDE_VARIABLE: &str = "latitude_ens_mean";
pub const LONGITUDE_VARIABLE: &str = "longitude_ens_mean";
pub const HEIGHT_VARIABLE: &str = "height_ens_mean";
pub const PBLH_RATIO_VARIABLE: &str = "height_to_pblh_ratio_ens_mean";

/// Reads `(time, points)` trajectory variables from netCDF
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfTrajectoryReader;

impl NetCdfTrajectoryReader {
    pub fn new() -> Self {
        Self
    }
}

/// Decoded `(time, points)` variable
struct PointTable {
    values: Vec<f64>,
    releases: usize,
    points: usize,
}

impl PointTable {
    fn read(file: &netcdf::File, name: &str, path: &Path) -> Result<Self> {
        let var = nc::variable(file, name, path)?;
        let &[releases, points] = nc::shape(&var).as_slice() else {
            return Err(CblError::dataset(
                path,
                format!("variable '{name}' is not shaped (time, points)"),
            ));
        };
        let values = nc::read_decoded(&var, path)?;
        Ok(Self {
            values,
            releases,
            points,
        })
    }

    fn row(&self, release: usize) -> &[f64] {
        &self.values[release * self.points..(release + 1) * self.points]
    }
}

impl TrajectoryReader for NetCdfTrajectoryReader {
    fn read(&self, path: &Path, date: NaiveDate) -> Result<Vec<Trajectory>> {
        let file = nc::open(path)?;
        let times = nc::read_decoded(&nc::variable(&file, TIME_VARIABLE, path)?, path)?;

        let lat = PointTable::read(&file, LATITUDE_VARIABLE, path)?;
        let lon = PointTable::read(&file, LONGITUDE_VARIABLE, path)?;
        let height = PointTable::read(&file, HEIGHT_VARIABLE, path)?;
        let ratio = PointTable::read(&file, PBLH_RATIO_VARIABLE, path)?;

        for table in [&lon, &height, &ratio] {
            if (table.releases, table.points) != (lat.releases, lat.points) {
                return Err(CblError::dataset(
                    path,
                    "trajectory variables disagree on (time, points) shape",
                ));
            }
        }
        if times.len() != lat.releases {
            return Err(CblError::dataset(
                path,
                format!(
                    "'{}' has {} values but trajectories have {} release times",
                    TIME_VARIABLE,
                    times.len(),
                    lat.releases
                ),
            ));
        }

        check_point_offsets(&file, path, lat.points);

        let mut trajectories = Vec::with_capacity(lat.releases);
        for (t, &seconds) in times.iter().enumerate() {
            let release_time = release_time_from_offset(date, seconds).ok_or_else(|| {
                CblError::dataset(path, format!("invalid release time offset {seconds}"))
            })?;
            let rows = (0..lat.points).map(|k| {
                (
                    lat.row(t)[k],
                    lon.row(t)[k],
                    height.row(t)[k],
                    ratio.row(t)[k],
                )
            });
            trajectories.push(Trajectory::from_positional(release_time, rows));
        }

        debug!(
            "Read {} trajectories of {} points from {}",
            trajectories.len(),
            lat.points,
            path.display()
        );
        Ok(trajectories)
    }
}

/// Warn when the point coordinate does not advance one hour per point.
///
/// Offsets are always taken from position; this only flags files where
/// that reading would be wrong.
fn check_point_offsets(file: &netcdf::File, path: &Path, points: usize) {
    let Some(var) = file.variable(LATITUDE_VARIABLE) else {
        return;
    };
    let Some(point_dim) = var.dimensions().get(1).map(netcdf::Dimension::name) else {
        return;
    };
    let Some(coord) = file.variable(&point_dim) else {
        debug!(
            "{}: no coordinate for '{}', assuming hourly points",
            path.display(),
            point_dim
        );
        return;
    };
    match nc::read_decoded(&coord, path) {
        Ok(offsets) if offsets.len() == points && offsets_are_hourly(&offsets) => {}
        Ok(_) => warn!(
            "{}: '{}' does not advance one hour per point; offsets are taken from position",
            path.display(),
            point_dim
        ),
        Err(e) => warn!("{}: cannot read '{}': {}", path.display(), point_dim, e),
    }
}
