//! Shared netCDF helpers
//!
//! Values are decoded the way the upstream analysis tooling sees them:
//! `_FillValue` and `missing_value` become NaN, then `scale_factor` and
//! `add_offset` are applied.

use std::path::Path;

use netcdf::{AttributeValue, Variable};

use crate::error::{CblError, Result};

pub(crate) fn open(path: &Path) -> Result<netcdf::File> {
    if !path.is_file() {
        return Err(CblError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    netcdf::open(path).map_err(|source| CblError::NetCdf {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn variable<'f>(
    file: &'f netcdf::File,
    name: &str,
    path: &Path,
) -> Result<Variable<'f>> {
    file.variable(name).ok_or_else(|| CblError::MissingVariable {
        path: path.to_path_buf(),
        variable: name.to_string(),
    })
}

/// Dimension lengths of a variable
pub(crate) fn shape(var: &Variable<'_>) -> Vec<usize> {
    var.dimensions().iter().map(netcdf::Dimension::len).collect()
}

/// Read a whole variable as decoded `f64` values
pub(crate) fn read_decoded(var: &Variable<'_>, path: &Path) -> Result<Vec<f64>> {
    let mut values: Vec<f64> = var.get_values::<f64, _>(..).map_err(|source| CblError::NetCdf {
        path: path.to_path_buf(),
        source,
    })?;

    let fill = attribute_f64(var, "_FillValue");
    let missing = attribute_f64(var, "missing_value");
    let scale = attribute_f64(var, "scale_factor");
    let offset = attribute_f64(var, "add_offset");

    for value in &mut values {
        if fill.is_some_and(|f| *value == f) || missing.is_some_and(|m| *value == m) {
            *value = f64::NAN;
            continue;
        }
        if let Some(scale) = scale {
            *value *= scale;
        }
        if let Some(offset) = offset {
            *value += offset;
        }
    }
    Ok(values)
}

fn attribute_f64(var: &Variable<'_>, name: &str) -> Option<f64> {
    match var.attribute(name)?.value().ok()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|x| f64::from(*x)),
        _ => None,
    }
}
