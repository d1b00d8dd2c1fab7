use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use cbl_hours_core::grid::GridFileNaming;
use cbl_hours_core::{
    write_records_to_path, NetCdfGridOpener, NetCdfTrajectoryReader, Pipeline, PipelineConfig,
};
use clap::{ArgAction, Parser, ValueHint};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Cumulative hours in the cloud mixing layer along back-trajectories",
    long_about = None
)]
struct Args {
    /// Directory of daily trajectory files
    #[arg(long, value_hint = ValueHint::DirPath)]
    trajectories: PathBuf,

    /// Directory of daily cloud grid files
    #[arg(long, value_hint = ValueHint::DirPath)]
    grids: PathBuf,

    /// Transit-limit CSV table (`Start Time`, `24 hr limit`)
    #[arg(long, value_hint = ValueHint::FilePath)]
    transit_table: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "24hrUCVF.csv", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Trajectory file extension
    #[arg(long, default_value = "nc")]
    extension: String,

    /// Grid file name prefix (before `.YYYYMMDD.`)
    #[arg(long)]
    grid_prefix: Option<String>,

    /// Grid file name suffix (after `.YYYYMMDD.`)
    #[arg(long)]
    grid_suffix: Option<String>,

    /// Grid days kept open at once
    #[arg(long, default_value_t = 4)]
    cache_capacity: usize,

    /// Worker threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Walk trajectories on a single thread
    #[arg(long, action = ArgAction::SetTrue)]
    sequential: bool,

    /// Enable debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Args {
    fn to_config(&self) -> PipelineConfig {
        let mut grid_naming = GridFileNaming::default();
        if let Some(prefix) = &self.grid_prefix {
            grid_naming.prefix.clone_from(prefix);
        }
        if let Some(suffix) = &self.grid_suffix {
            grid_naming.suffix.clone_from(suffix);
        }
        PipelineConfig {
            trajectory_dir: self.trajectories.clone(),
            trajectory_extension: self.extension.clone(),
            grid_dir: self.grids.clone(),
            grid_naming,
            transit_table: self.transit_table.clone(),
            output: self.output.clone(),
            cache_capacity: self.cache_capacity,
            workers: self.workers,
            parallel: !self.sequential,
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = args.to_config();
    config.validate().context("invalid arguments")?;

    let reader = NetCdfTrajectoryReader::new();
    let opener = NetCdfGridOpener::new(&config.grid_dir, config.grid_naming.clone());
    let report = Pipeline::run(&config, &reader, Box::new(opener)).with_context(|| {
        format!(
            "failed to process trajectories in {}",
            config.trajectory_dir.display()
        )
    })?;

    write_records_to_path(&report.records, &config.output)
        .with_context(|| format!("failed to write {}", config.output.display()))?;

    for failure in &report.trajectory_failures {
        warn!(
            "{} @ {}: {}",
            failure.file.display(),
            failure.release_time,
            failure.error
        );
    }
    for failure in &report.file_failures {
        warn!("{}: {}", failure.file.display(), failure.error);
    }
    info!(
        "{} files, {} records written to {} (grid cache: {} opens, {} hits, {} evictions)",
        report.files_processed,
        report.records.len(),
        config.output.display(),
        report.cache_stats.opens,
        report.cache_stats.hits,
        report.cache_stats.evictions
    );

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        warn!("{} failures during run", report.failure_count());
        Ok(ExitCode::FAILURE)
    }
}
