//! Core types shared across the pipeline

pub mod record;
pub mod trajectory;
pub mod units;

pub use record::HoursInCblRecord;
pub use trajectory::{Trajectory, TrajectoryPoint, LOOKUP_KEY_FORMAT, OUTPUT_DATE_FORMAT};
pub use units::{Meters, Percent};
