use std::{panic, path::PathBuf, process};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use nightlapse_core::{
    report::{CameraReport, RunReport},
    settings::{self, DEFAULT_DATE_OFFSET},
    upload,
    CodecProfile,
    TimelapseContext,
    TimelapseOutcome,
};
use tracing::{error, info, level_filters::LevelFilter};

use crate::configuration::Configuration;

mod configuration;
mod logging;

pub const DEFAULT_LOG_PATH: &str = "./logs/nightlapse.log";

#[derive(Parser, Debug)]
#[command(
    name = "nightlapse",
    version,
    about = "Nightly time-lapse assembly from per-camera snapshot clips"
)]
pub struct Cli {
    /// Process this date instead of deriving one from --days-back
    #[arg(long, value_parser = parse_date, value_name = "YYYYMMDD", conflicts_with = "days_back")]
    pub date: Option<NaiveDate>,

    /// How many days back from today to process
    #[arg(long, value_name = "DAYS")]
    pub days_back: Option<u64>,

    /// Playback speed divisor applied to presentation timestamps
    #[arg(long, value_name = "FACTOR")]
    pub speed: Option<f64>,

    /// Codec profile for the chunk encode stage (h264 or hevc)
    #[arg(long, value_name = "CODEC")]
    pub codec: Option<CodecProfile>,

    /// Worker pool size; defaults to host parallelism
    #[arg(long, value_name = "COUNT")]
    pub workers: Option<usize>,

    /// Scratch directory for intermediates (default: <output dir>/temp)
    #[arg(long, value_name = "DIR")]
    pub temp: Option<PathBuf>,

    /// Log file location
    #[arg(long, value_name = "FILE")]
    pub logs: Option<PathBuf>,

    /// Write a JSON run report here after processing
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Assume the share is already reachable; skip mounting
    #[arg(long)]
    pub no_mount: bool,

    /// Keep artifacts local; skip the NAS upload
    #[arg(long)]
    pub no_upload: bool,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}

fn parse_date(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(s, "%Y%m%d")
}

fn main() -> Result<()> {
    let orig_hook = panic::take_hook();
    // Catch panics in worker threads
    panic::set_hook(Box::new(move |panic_info| {
        orig_hook(panic_info);
        process::exit(1);
    }));

    if run()? {
        // Per-camera failures were already logged; signal them to the
        // scheduler once everything had its chance to run.
        process::exit(1);
    }

    Ok(())
}

/// Returns whether any camera failed.
fn run() -> Result<bool> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
        return Ok(false);
    }

    // A .env in the working directory is honoured; real environment
    // variables win over it.
    dotenvy::dotenv().ok();

    let cwd = std::env::current_dir()?;
    let logs = cli.logs.clone().unwrap_or_else(|| cwd.join(DEFAULT_LOG_PATH));
    let _guard = logging::init_logging(LevelFilter::INFO, &logs, LevelFilter::DEBUG)?;

    let configuration = Configuration::from_env(&cli)?;
    let date = cli
        .date
        .unwrap_or_else(|| settings::target_date(cli.days_back.unwrap_or(DEFAULT_DATE_OFFSET)));

    if cli.no_mount {
        info!(
            "Skipping mount of //{}/{}",
            configuration.share.host, configuration.share.share
        );
    } else {
        // Every camera reads through the mount point, so there is no
        // point continuing without it.
        configuration.share.mount().context("Failed to mount the SMB share")?;
    }

    let ctx = TimelapseContext::new(
        configuration.io,
        configuration.speedup,
        configuration.cameras,
        date,
    )?;
    info!(
        "Processing {} cameras for {}",
        ctx.cameras.directories.len(),
        settings::date_key(date)
    );

    let mut report = RunReport::new(date);
    for camera in ctx.cameras.directories.clone() {
        let label = ctx.cameras.label_for(&camera).to_owned();
        let entry = match ctx.create_timelapse(&camera) {
            Ok(outcome) => {
                let mut entry = CameraReport::from_outcome(&camera, &label, &outcome);
                if let TimelapseOutcome::Created {
                    artifact, ..
                } = &outcome
                {
                    if cli.no_upload {
                        info!("Skipping upload of {}", artifact.display());
                    } else {
                        match upload::upload_artifact(artifact, &configuration.upload_dir) {
                            Ok(destination) => entry.uploaded_to = Some(destination),
                            Err(e) => {
                                error!("Failed to upload {}: {e}", artifact.display());
                                entry.error = Some(format!("upload failed: {e}"));
                            },
                        }
                    }
                }
                entry
            },
            Err(e) => {
                // One bad camera must not keep the rest from running.
                error!("Processing {camera} failed: {e:#}");
                CameraReport::failed(&camera, &label, &e)
            },
        };
        report.cameras.push(entry);
    }

    if let Some(path) = &cli.report {
        report.save(path)?;
    }

    if report.has_failures() {
        error!("Run completed with failures");
    } else {
        info!("Run completed");
    }

    Ok(report.has_failures())
}
