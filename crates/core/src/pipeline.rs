//! Batch driver: files in, hours-in-CBL records out
//!
//! Files are processed strictly one after another in discovery order.
//! Within a file the trajectory walks may run on the rayon pool; results are
//! collected in trajectory order, so the output never depends on thread
//! scheduling. A file-level failure discards that file's partial records and
//! the run moves on; rows from earlier files are never touched.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rayon::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::core_types::{HoursInCblRecord, Trajectory};
use crate::error::{CblError, Result};
use crate::grid::{CacheStats, GridCache, GridOpener, GridSampler};
use crate::mixing::MixingClassifier;
use crate::repository::{date_of_path, DatasetRepository, TrajectoryReader};
use crate::transit::{TransitLimitResolver, TransitLimitTable};
use crate::walker::BackwardTrajectoryWalker;

/// A trajectory that produced no row
#[derive(Debug)]
pub struct TrajectoryFailure {
    pub file: PathBuf,
    pub release_time: NaiveDateTime,
    pub error: CblError,
}

/// A file that was aborted
#[derive(Debug)]
pub struct FileFailure {
    pub file: PathBuf,
    pub error: CblError,
}

/// Everything a batch run produced
#[derive(Debug, Default)]
pub struct RunReport {
    /// Output rows in file-then-trajectory order
    pub records: Vec<HoursInCblRecord>,
    pub trajectory_failures: Vec<TrajectoryFailure>,
    pub file_failures: Vec<FileFailure>,
    /// Files whose trajectories were all attempted
    pub files_processed: usize,
    pub cache_stats: CacheStats,
}

impl RunReport {
    /// No trajectory or file failed
    pub fn is_clean(&self) -> bool {
        self.trajectory_failures.is_empty() && self.file_failures.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.trajectory_failures.len() + self.file_failures.len()
    }
}

/// Records and per-trajectory failures of one file
#[derive(Debug, Default)]
struct FileOutcome {
    records: Vec<HoursInCblRecord>,
    trajectory_failures: Vec<(NaiveDateTime, CblError)>,
}

/// Wires the lookup table, grid cache and trajectory reader together
pub struct Pipeline<'a> {
    table: &'a TransitLimitTable,
    cache: &'a GridCache,
    reader: &'a dyn TrajectoryReader,
    classifier: MixingClassifier,
    parallel: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        table: &'a TransitLimitTable,
        cache: &'a GridCache,
        reader: &'a dyn TrajectoryReader,
    ) -> Self {
        Self {
            table,
            cache,
            reader,
            classifier: MixingClassifier::default(),
            parallel: true,
        }
    }

    #[must_use]
    pub fn with_classifier(mut self, classifier: MixingClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Walk the trajectories of a file on the rayon pool (default) or on
    /// the calling thread
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run a whole batch from configuration.
    ///
    /// Loads the transit-limit table, lists the trajectory directory and
    /// processes every file. When `config.workers` is non-zero the walks run
    /// on a dedicated pool of that size.
    ///
    /// # Errors
    /// Returns an error only for problems that stop the run before any file
    /// is processed: invalid configuration, an unreadable transit table or
    /// trajectory directory, or a pool that cannot be built. Per-file and
    /// per-trajectory failures are collected in the report.
    pub fn run(
        config: &PipelineConfig,
        reader: &dyn TrajectoryReader,
        opener: Box<dyn GridOpener>,
    ) -> Result<RunReport> {
        config.validate()?;
        let table = TransitLimitTable::from_path(&config.transit_table)?;
        let cache = GridCache::new(opener, config.cache_capacity()?);
        let repository =
            DatasetRepository::new(&config.trajectory_dir, &config.trajectory_extension);
        let files = repository.list_trajectory_files()?;

        info!(
            "Processing {} trajectory files from {}",
            files.len(),
            repository.directory().display()
        );

        let pipeline = Pipeline::new(&table, &cache, reader).with_parallel(config.parallel);
        if config.workers == 0 {
            return Ok(pipeline.process_files(&files));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .build()
            .map_err(|e| CblError::Config(format!("cannot build worker pool: {e}")))?;
        Ok(pool.install(|| pipeline.process_files(&files)))
    }

    /// Process files in the given order
    pub fn process_files(&self, files: &[PathBuf]) -> RunReport {
        let mut report = RunReport::default();

        for file in files {
            match self.process_file(file) {
                Ok(outcome) => {
                    report.files_processed += 1;
                    report.records.extend(outcome.records);
                    report.trajectory_failures.extend(
                        outcome
                            .trajectory_failures
                            .into_iter()
                            .map(|(release_time, error)| TrajectoryFailure {
                                file: file.clone(),
                                release_time,
                                error,
                            }),
                    );
                }
                Err(e) => {
                    error!("Aborting {}: {}", file.display(), e);
                    report.file_failures.push(FileFailure {
                        file: file.clone(),
                        error: e,
                    });
                }
            }
        }

        report.cache_stats = self.cache.stats();
        info!(
            "Finished: {} records, {} trajectory failures, {} file failures",
            report.records.len(),
            report.trajectory_failures.len(),
            report.file_failures.len()
        );
        debug!("Grid cache: {:?}", report.cache_stats);
        report
    }

    fn process_file(&self, path: &Path) -> Result<FileOutcome> {
        let date = date_of_path(path)?;
        let trajectories = self.reader.read(path, date)?;
        info!(
            "Processing {} ({} trajectories)",
            path.display(),
            trajectories.len()
        );

        let results: Vec<Result<HoursInCblRecord>> = if self.parallel {
            trajectories
                .par_iter()
                .map(|trajectory| self.process_trajectory(trajectory))
                .collect()
        } else {
            trajectories
                .iter()
                .map(|trajectory| self.process_trajectory(trajectory))
                .collect()
        };

        let mut outcome = FileOutcome::default();
        for (trajectory, result) in trajectories.iter().zip(results) {
            match result {
                Ok(record) => outcome.records.push(record),
                Err(e) if e.is_trajectory_fatal() => {
                    warn!("{}: skipping trajectory: {}", path.display(), e);
                    outcome
                        .trajectory_failures
                        .push((trajectory.release_time(), e));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(outcome)
    }

    fn process_trajectory(&self, trajectory: &Trajectory) -> Result<HoursInCblRecord> {
        let limit = TransitLimitResolver::new(self.table).resolve_trajectory(trajectory)?;
        let sampler = GridSampler::new(self.cache);
        BackwardTrajectoryWalker::new(&sampler, self.classifier)
            .walk(trajectory, limit.max_backward_steps)
    }
}
