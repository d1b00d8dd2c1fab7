//! Cloud mixing-layer membership and penetration score
//!
//! A point counts as inside the cloud mixing layer when the sampled cloud
//! has positive depth, the point sits below the cloud top, and the cloud
//! fraction exceeds the threshold. Its score is the fraction of the column
//! below the top that is cloud, `1 - base/top`.
//!
//! No `altitude >= base` test is applied: a point under the cloud base
//! still scores when the other conditions hold.

use crate::core_types::units::{Meters, Percent};
use crate::grid::CloudGridSample;

/// Cloud fraction a cell must exceed to count as cloudy
pub const DEFAULT_FRACTION_THRESHOLD: Percent = Percent::new(20.0);

/// Decides cloud membership for a trajectory point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixingClassifier {
    fraction_threshold: Percent,
}

impl Default for MixingClassifier {
    fn default() -> Self {
        Self {
            fraction_threshold: DEFAULT_FRACTION_THRESHOLD,
        }
    }
}

impl MixingClassifier {
    pub fn new(fraction_threshold: Percent) -> Self {
        Self { fraction_threshold }
    }

    pub fn fraction_threshold(&self) -> Percent {
        self.fraction_threshold
    }

    /// True when the point is inside the cloud mixing layer.
    ///
    /// Any missing field means "not in cloud". Comparisons use IEEE
    /// semantics, so a NaN altitude is never in cloud.
    pub fn is_in_cloud(&self, altitude: Meters, sample: &CloudGridSample) -> bool {
        let Some((base, top, fraction)) = sample.complete() else {
            return false;
        };
        top.value() > base.value()
            && altitude.value() < top.value()
            && fraction.value() > self.fraction_threshold.value()
    }

    /// Penetration score: `1 - base/top` in cloud, `0` otherwise
    pub fn classify(&self, altitude: Meters, sample: &CloudGridSample) -> f64 {
        if !self.is_in_cloud(altitude, sample) {
            return 0.0;
        }
        match (sample.base_height, sample.top_height) {
            (Some(base), Some(top)) => 1.0 - base.value() / top.value(),
            _ => 0.0,
        }
    }
}
