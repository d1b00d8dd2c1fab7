//! Cloud properties sampled from the grid at one point

use crate::core_types::units::{Meters, Percent};

/// Scale applied to every raw cloud value before use.
///
/// Converts kilometre heights to meters. The fraction variable is scaled by
/// the same factor, which matches the product as consumed downstream even
/// though it is dimensionally odd for a percentage.
pub const RAW_VALUE_SCALE: f64 = 1000.0;

/// Cloud variables read from the gridded product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudField {
    BaseHeight,
    TopHeight,
    Fraction,
}

impl CloudField {
    pub const ALL: [CloudField; 3] = [
        CloudField::BaseHeight,
        CloudField::TopHeight,
        CloudField::Fraction,
    ];

    /// Variable name in the dataset
    pub fn variable_name(self) -> &'static str {
        match self {
            CloudField::BaseHeight => "cloud_height_base_level",
            CloudField::TopHeight => "cloud_height_top_level",
            CloudField::Fraction => "cloud_percentage_level",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            CloudField::BaseHeight => 0,
            CloudField::TopHeight => 1,
            CloudField::Fraction => 2,
        }
    }
}

/// Cloud base, top and fraction at one grid cell and time.
///
/// Each field is missing independently (index outside the grid, variable
/// absent from the file, or a fill/NaN value in the data).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CloudGridSample {
    pub base_height: Option<Meters>,
    pub top_height: Option<Meters>,
    pub fraction: Option<Percent>,
}

impl CloudGridSample {
    /// Sample with every field missing
    pub const MISSING: CloudGridSample = CloudGridSample {
        base_height: None,
        top_height: None,
        fraction: None,
    };

    pub fn new(base_height: f64, top_height: f64, fraction: f64) -> Self {
        Self {
            base_height: Some(Meters::new(base_height)),
            top_height: Some(Meters::new(top_height)),
            fraction: Some(Percent::new(fraction)),
        }
    }

    /// Build from raw (unscaled) values as stored in the product
    pub fn from_raw(base: Option<f64>, top: Option<f64>, fraction: Option<f64>) -> Self {
        let scale = |v: f64| v * RAW_VALUE_SCALE;
        Self {
            base_height: base.map(|v| Meters::new(scale(v))),
            top_height: top.map(|v| Meters::new(scale(v))),
            fraction: fraction.map(|v| Percent::new(scale(v))),
        }
    }

    /// All three fields present
    pub fn complete(&self) -> Option<(Meters, Meters, Percent)> {
        Some((self.base_height?, self.top_height?, self.fraction?))
    }

    pub fn is_missing(&self) -> bool {
        self.complete().is_none()
    }
}
