//! Loading daily cloud grids from netCDF files

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::dataset::{CloudGrid, FieldArray};
use super::opener::{GridFileNaming, GridOpener};
use super::sample::CloudField;
use crate::error::Result;
use crate::nc;

/// Name of the time axis variable (seconds since the start of the day)
pub const TIME_OFFSET_VARIABLE: &str = "time_offset";

/// Read `time_offset` and the three cloud variables of one grid file.
///
/// A cloud variable that is absent or not 4-D is left out of the grid, so
/// every sample of it reads as missing. A missing time axis makes the file
/// unusable.
///
/// # Errors
/// Returns an error if the file cannot be opened or decoded, or has no
/// `time_offset` variable.
pub fn load_cloud_grid(path: &Path) -> Result<CloudGrid> {
    let file = nc::open(path)?;
    let time_var = nc::variable(&file, TIME_OFFSET_VARIABLE, path)?;
    let mut grid = CloudGrid::new(nc::read_decoded(&time_var, path)?);

    for field in CloudField::ALL {
        let name = field.variable_name();
        let Some(var) = file.variable(name) else {
            warn!("{}: variable '{}' absent, treating as missing", path.display(), name);
            continue;
        };
        let dims = nc::shape(&var);
        let &[t, rows, cols, levels] = dims.as_slice() else {
            warn!(
                "{}: variable '{}' has shape {:?}, expected 4 dimensions",
                path.display(),
                name,
                dims
            );
            continue;
        };
        let values = nc::read_decoded(&var, path)?;
        grid.set_field(field, FieldArray::new(values, [t, rows, cols, levels], path)?);
    }

    debug!(
        "Loaded cloud grid {} ({} time steps)",
        path.display(),
        grid.time_offsets().len()
    );
    Ok(grid)
}

/// Opens `<directory>/<prefix>.<YYYYMMDD>.<suffix>` for each requested day
#[derive(Debug, Clone)]
pub struct NetCdfGridOpener {
    directory: PathBuf,
    naming: GridFileNaming,
}

impl NetCdfGridOpener {
    pub fn new(directory: impl Into<PathBuf>, naming: GridFileNaming) -> Self {
        Self {
            directory: directory.into(),
            naming,
        }
    }
}

impl GridOpener for NetCdfGridOpener {
    fn open(&self, date: NaiveDate) -> Result<CloudGrid> {
        load_cloud_grid(&self.naming.path_in(&self.directory, date))
    }
}
