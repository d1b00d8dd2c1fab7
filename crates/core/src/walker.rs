//! Backward walk along a trajectory accumulating hours in the mixing layer
//!
//! Starting at the release time, the walker takes the k-th trajectory point
//! as the parcel position k hours earlier, samples the cloud grid for that
//! hour and place, and adds the mixing score to a running total. The walk
//! stops after `transit_limit` steps or when the trajectory runs out of
//! points, whichever comes first. A limit of zero short-circuits to a zero
//! total without touching the grid.

use chrono::{NaiveDateTime, TimeDelta};

use crate::core_types::{HoursInCblRecord, Trajectory};
use crate::error::{CblError, Result};
use crate::grid::{CloudGridSample, CloudSampleSource};
use crate::mixing::MixingClassifier;

/// One evaluated backward step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkStep {
    /// Hours before release
    pub offset_hours: u32,
    /// Time the grid was sampled at
    pub query_time: NaiveDateTime,
    pub sample: CloudGridSample,
    /// Mixing score of this step
    pub score: f64,
    /// Running total after this step
    pub cumulative: f64,
}

/// Final record plus every step that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct WalkTrace {
    pub record: HoursInCblRecord,
    pub steps: Vec<WalkStep>,
}

/// Walks trajectories backward through the cloud grids
pub struct BackwardTrajectoryWalker<'a, S: CloudSampleSource + ?Sized> {
    source: &'a S,
    classifier: MixingClassifier,
}

impl<'a, S: CloudSampleSource + ?Sized> BackwardTrajectoryWalker<'a, S> {
    pub fn new(source: &'a S, classifier: MixingClassifier) -> Self {
        Self { source, classifier }
    }

    /// Cumulative hours in the mixing layer for one trajectory.
    ///
    /// # Errors
    /// Returns an error when a grid file cannot be opened, or the release
    /// time cannot be stepped back by the required hours.
    pub fn walk(&self, trajectory: &Trajectory, transit_limit: u32) -> Result<HoursInCblRecord> {
        self.walk_with(trajectory, transit_limit, |_| {})
    }

    /// Like [`walk`](Self::walk), also returning each evaluated step
    ///
    /// # Errors
    /// Same as [`walk`](Self::walk).
    pub fn walk_traced(&self, trajectory: &Trajectory, transit_limit: u32) -> Result<WalkTrace> {
        let mut steps = Vec::with_capacity(trajectory.len().min(transit_limit as usize));
        let record = self.walk_with(trajectory, transit_limit, |step| steps.push(step))?;
        Ok(WalkTrace { record, steps })
    }

    fn walk_with<F>(
        &self,
        trajectory: &Trajectory,
        transit_limit: u32,
        mut on_step: F,
    ) -> Result<HoursInCblRecord>
    where
        F: FnMut(WalkStep),
    {
        let release_time = trajectory.release_time();
        let mut record = HoursInCblRecord::new(release_time, 0.0, transit_limit);
        if transit_limit == 0 {
            return Ok(record);
        }

        // Ends at the transit limit or the last point, whichever comes first
        let mut cumulative = 0.0;
        for (point, iteration) in trajectory.points().iter().zip(0..transit_limit) {
            let query_time = release_time
                .checked_sub_signed(TimeDelta::hours(i64::from(iteration)))
                .ok_or(CblError::TimeOverflow {
                    release_time,
                    hours: iteration,
                })?;
            let sample = self
                .source
                .sample_at(query_time, point.latitude, point.longitude)?;
            let score = self.classifier.classify(point.altitude, &sample);

            cumulative += score;
            record = HoursInCblRecord::new(release_time, cumulative, transit_limit);
            on_step(WalkStep {
                offset_hours: iteration,
                query_time,
                sample,
                score,
                cumulative,
            });
        }

        Ok(record)
    }
}
