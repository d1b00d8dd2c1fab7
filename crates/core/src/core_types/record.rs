//! Per-trajectory output record

use chrono::NaiveDateTime;
use serde::Serialize;

use super::trajectory::OUTPUT_DATE_FORMAT;

/// Hours a trajectory spent in the cloud mixing layer before release
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoursInCblRecord {
    /// Trajectory release time
    pub release_time: NaiveDateTime,
    /// Sum of per-step mixing scores
    pub cumulative_hours: f64,
    /// Backward steps the trajectory was allowed
    pub transit_limit: u32,
}

impl HoursInCblRecord {
    pub fn new(release_time: NaiveDateTime, cumulative_hours: f64, transit_limit: u32) -> Self {
        Self {
            release_time,
            cumulative_hours,
            transit_limit,
        }
    }

    /// Release hour as `"YYYY-MM-DD HH:00"`
    pub fn date_utc(&self) -> String {
        self.release_time.format(OUTPUT_DATE_FORMAT).to_string()
    }

    pub(crate) fn to_row(self) -> OutputRow {
        OutputRow {
            date_utc: self.date_utc(),
            cumulative_hours: self.cumulative_hours,
            transit_limit: self.transit_limit,
        }
    }
}

/// Output table row; field names double as the CSV header
#[derive(Debug, Serialize)]
pub(crate) struct OutputRow {
    #[serde(rename = "dateUTC")]
    pub(crate) date_utc: String,
    #[serde(rename = "24hr-UCVF")]
    pub(crate) cumulative_hours: f64,
    #[serde(rename = "transit_time_limit")]
    pub(crate) transit_limit: u32,
}
