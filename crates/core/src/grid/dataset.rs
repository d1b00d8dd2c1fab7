//! In-memory cloud grid for one calendar day
//!
//! A `CloudGrid` holds the `time_offset` axis and the three cloud variables
//! as dense (time, row, col, level) arrays. Grids are loaded once per date
//! and then shared read-only between threads behind an `Arc`.

use std::path::Path;

use super::sample::CloudField;
use crate::error::{CblError, Result};

/// Dense 4-D variable in row-major (time, row, col, level) order
#[derive(Debug, Clone, PartialEq)]
pub struct FieldArray {
    values: Vec<f64>,
    shape: [usize; 4],
}

impl FieldArray {
    /// Wrap decoded values. Missing data must already be NaN.
    ///
    /// # Errors
    /// Returns `CblError::Dataset` if `values` does not match `shape`.
    pub fn new(values: Vec<f64>, shape: [usize; 4], source: &Path) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(CblError::dataset(
                source,
                format!(
                    "variable has {} values but shape {:?} needs {}",
                    values.len(),
                    shape,
                    expected
                ),
            ));
        }
        Ok(Self { values, shape })
    }

    /// Array filled with one value, mostly useful for building fixtures
    pub fn filled(shape: [usize; 4], value: f64) -> Self {
        Self {
            values: vec![value; shape.iter().product()],
            shape,
        }
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape[1]
    }

    pub fn cols(&self) -> usize {
        self.shape[2]
    }

    #[inline]
    fn offset(&self, index: [usize; 4]) -> Option<usize> {
        if index.iter().zip(self.shape.iter()).any(|(&i, &n)| i >= n) {
            return None;
        }
        let [_, rows, cols, levels] = self.shape;
        Some(((index[0] * rows + index[1]) * cols + index[2]) * levels + index[3])
    }

    /// Value at `(time, row, col, level)`, `None` if out of range or NaN
    #[inline]
    pub fn get(&self, index: [usize; 4]) -> Option<f64> {
        let value = self.values[self.offset(index)?];
        (!value.is_nan()).then_some(value)
    }

    /// Overwrite one value; out-of-range writes are ignored
    pub fn set(&mut self, index: [usize; 4], value: f64) {
        if let Some(i) = self.offset(index) {
            self.values[i] = value;
        }
    }
}

/// Cloud variables for one day
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CloudGrid {
    /// Seconds since the start of the day, one per time step
    time_offsets: Vec<f64>,
    /// Indexed by `CloudField::slot`; `None` when the variable is absent
    fields: [Option<FieldArray>; 3],
}

impl CloudGrid {
    pub fn new(time_offsets: Vec<f64>) -> Self {
        Self {
            time_offsets,
            fields: [None, None, None],
        }
    }

    /// Attach a variable
    pub fn with_field(mut self, field: CloudField, array: FieldArray) -> Self {
        self.fields[field.slot()] = Some(array);
        self
    }

    pub fn set_field(&mut self, field: CloudField, array: FieldArray) {
        self.fields[field.slot()] = Some(array);
    }

    pub fn time_offsets(&self) -> &[f64] {
        &self.time_offsets
    }

    pub fn field(&self, field: CloudField) -> Option<&FieldArray> {
        self.fields[field.slot()].as_ref()
    }

    pub fn field_mut(&mut self, field: CloudField) -> Option<&mut FieldArray> {
        self.fields[field.slot()].as_mut()
    }
}
