//! Fixed 0.5° cloud grid geometry
//!
//! The cloud product is laid out on a regular latitude/longitude grid with
//! 30 rows counted from the north edge down to the 28.5°N anchor row, and
//! columns counted eastward from 130°W:
//!
//! ```text
//! row = 29 - round((lat - 28.5) / 0.5)
//! col =      round((lon + 130) / 0.5)
//! ```
//!
//! Rounding is half-to-even, so a coordinate sitting exactly between two
//! cell centres resolves the same way every time. Index resolution never
//! fails: anything that lands outside the grid simply has no index.

use serde::{Deserialize, Serialize};

/// Grid spacing (degrees)
pub const GRID_RESOLUTION_DEG: f64 = 0.5;

/// Latitude of the southernmost (last) row (degrees north)
pub const GRID_ANCHOR_LAT: f64 = 28.5;

/// Longitude of the first column (degrees east)
pub const GRID_ANCHOR_LON: f64 = -130.0;

/// Row index of the anchor latitude
pub const GRID_ANCHOR_ROW: i64 = 29;

/// Vertical level read from the cloud product
pub const CLOUD_LEVEL_INDEX: usize = 1;

/// Row/column position in the cloud grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

/// Unbounded row for a latitude, `None` for non-finite input
pub fn latitude_row(lat: f64) -> Option<i64> {
    if !lat.is_finite() {
        return None;
    }
    let steps = ((lat - GRID_ANCHOR_LAT) / GRID_RESOLUTION_DEG).round_ties_even();
    to_i64(steps).map(|s| GRID_ANCHOR_ROW - s)
}

/// Unbounded column for a longitude, `None` for non-finite input
pub fn longitude_col(lon: f64) -> Option<i64> {
    if !lon.is_finite() {
        return None;
    }
    let steps = ((lon - GRID_ANCHOR_LON) / GRID_RESOLUTION_DEG).round_ties_even();
    to_i64(steps)
}

/// Resolve a coordinate to a cell of a `rows` x `cols` grid.
///
/// Returns `None` when the coordinate falls outside the grid. Negative
/// indices are outside the grid, never wrapped around.
pub fn grid_index(lat: f64, lon: f64, rows: usize, cols: usize) -> Option<GridIndex> {
    let row = bounded(latitude_row(lat)?, rows)?;
    let col = bounded(longitude_col(lon)?, cols)?;
    Some(GridIndex { row, col })
}

/// Index of the offset closest to `target_seconds`.
///
/// Linear scan; on an exact tie the lowest index wins. Non-finite offsets
/// never match. Returns `None` for an empty or all-NaN axis.
pub fn nearest_time_index(offsets: &[f64], target_seconds: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &offset) in offsets.iter().enumerate() {
        let diff = (offset - target_seconds).abs();
        if !diff.is_finite() {
            continue;
        }
        match best {
            Some((_, best_diff)) if diff >= best_diff => {}
            _ => best = Some((i, diff)),
        }
    }
    best.map(|(i, _)| i)
}

fn to_i64(steps: f64) -> Option<i64> {
    // Far outside any plausible grid; keeps the cast exact
    if steps.abs() > 1.0e9 {
        return None;
    }
    Some(steps as i64)
}

fn bounded(index: i64, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}
