//! Back-trajectories and their points
//!
//! A trajectory file holds one trajectory per release time. Points carry no
//! timestamp of their own: the k-th point of a trajectory is taken to sit k
//! hours before release. Readers assign `time_offset_hours` from that
//! position and check it against any offset coordinate the file provides.

use chrono::NaiveDateTime;

use super::units::Meters;

/// Release-time format used as the transit-limit table key
pub const LOOKUP_KEY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Release-time format written to the output table
pub const OUTPUT_DATE_FORMAT: &str = "%Y-%m-%d %H:00";

/// One hourly position along a back-trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Hours before release (0 = release point)
    pub time_offset_hours: u32,
    /// Latitude (degrees north)
    pub latitude: f64,
    /// Longitude (degrees east, negative west)
    pub longitude: f64,
    /// Altitude of the air parcel
    pub altitude: Meters,
    /// Parcel height divided by the planetary boundary-layer height
    pub height_to_pblh_ratio: f64,
}

/// A back-trajectory released at a single time
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    release_time: NaiveDateTime,
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new(release_time: NaiveDateTime, points: Vec<TrajectoryPoint>) -> Self {
        Self {
            release_time,
            points,
        }
    }

    /// Build a trajectory from raw `(lat, lon, altitude_m, pblh_ratio)` rows,
    /// assigning each row its positional hour offset.
    pub fn from_positional<I>(release_time: NaiveDateTime, rows: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64, f64, f64)>,
    {
        let points = rows
            .into_iter()
            .enumerate()
            .map(|(k, (latitude, longitude, altitude, ratio))| TrajectoryPoint {
                time_offset_hours: k as u32,
                latitude,
                longitude,
                altitude: Meters::new(altitude),
                height_to_pblh_ratio: ratio,
            })
            .collect();
        Self::new(release_time, points)
    }

    pub fn release_time(&self) -> NaiveDateTime {
        self.release_time
    }

    /// Points ordered by increasing backward offset
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `"YYYY-MM-DD HH:MM:SS"` key used against the transit-limit table
    pub fn lookup_key(&self) -> String {
        self.release_time.format(LOOKUP_KEY_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn release() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_positional_offsets() {
        let traj = Trajectory::from_positional(
            release(),
            vec![
                (33.0, -117.5, 400.0, 0.5),
                (33.1, -117.6, 450.0, 0.6),
                (33.2, -117.7, 500.0, 0.7),
            ],
        );

        assert_eq!(traj.len(), 3);
        for (k, point) in traj.points().iter().enumerate() {
            assert_eq!(point.time_offset_hours as usize, k);
        }
        assert_eq!(traj.points()[2].time_offset_hours, 2);
        assert_eq!(*traj.points()[1].altitude, 450.0);
    }

    #[test]
    fn test_lookup_key_format() {
        let traj = Trajectory::new(release(), Vec::new());
        assert_eq!(traj.lookup_key(), "2023-03-14 09:00:00");
        assert!(traj.is_empty());
    }
}
