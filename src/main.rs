//! Gas Meter Reader
//!
//! Reads an analog gas meter through a network camera: the snapshot is
//! rectified, enhanced and cut into digit cells, each cell is recognized with
//! Tesseract, and the assembled value is checked against the last accepted
//! reading before it is stored and printed.

mod artifacts;
mod capture;
mod config;
mod error;
mod geometry;
mod ocr;
mod paths;
mod pipeline;
mod reading;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::artifacts::{Artifact, ArtifactStore};
use crate::capture::Camera;
use crate::config::MeterConfig;
use crate::ocr::TesseractEngine;
use crate::pipeline::segment::DigitIndex;
use crate::pipeline::MeterReader;
use crate::reading::ReadingStore;

const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Parser, Debug)]
#[command(about = "Read an analog gas meter through a network camera")]
struct Args {
    /// Configuration file (default: config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture a snapshot, read the meter and print the accepted reading
    Read,
    /// Print the path of a debug image from the last reading
    Artifact {
        #[command(subcommand)]
        which: ArtifactArg,
    },
    /// Print the last accepted reading
    Last,
}

#[derive(Subcommand, Debug)]
enum ArtifactArg {
    /// Raw camera snapshot
    Raw,
    /// Contrast-filtered reading strip
    Picture,
    /// A single digit cell (1-8)
    Digit { index: usize },
}

/// Logs to stderr and appends to `<exe_dir>/logs/gas.log`.
fn init_logging() -> Result<()> {
    paths::ensure_directories().context("Failed to create log directory")?;
    let log_path = paths::get_logs_dir().join("gas.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open {}", log_path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_timer(ChronoLocal::new(LOG_TIME_FORMAT.to_string()))
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging()?;

    let config_path = args.config.unwrap_or_else(paths::get_config_path);
    let config = MeterConfig::load(&config_path);
    config.check().context("Invalid configuration")?;

    match args.command {
        Command::Read => run_read(config),
        Command::Artifact { which } => run_artifact(&config, which),
        Command::Last => run_last(&config),
    }
}

fn run_read(config: MeterConfig) -> Result<()> {
    info!("Running gas reading");

    let tesseract = ocr::ensure_tesseract(&config.ocr)?;
    let camera = Camera::new(&config.capture)?;
    let reader = MeterReader::new(config, TesseractEngine::new(tesseract));

    match reader.read_current(&camera) {
        Ok(reading) => {
            println!("{}", serde_json::to_string(&reading)?);
            Ok(())
        }
        Err(e) => {
            error!("Issue reading gas meter: {e}");
            Err(e.into())
        }
    }
}

fn run_artifact(config: &MeterConfig, which: ArtifactArg) -> Result<()> {
    let artifact = match which {
        ArtifactArg::Raw => Artifact::RawCapture,
        ArtifactArg::Picture => Artifact::Filtered,
        ArtifactArg::Digit { index } => Artifact::Digit(DigitIndex::new(index)?),
    };

    let store = ArtifactStore::new(config.storage.artifact_dir());
    let path = store
        .find(artifact)
        .ok_or_else(|| anyhow!("{} not found", store.path(artifact).display()))?;
    println!("{}", path.display());
    Ok(())
}

fn run_last(config: &MeterConfig) -> Result<()> {
    let store = ReadingStore::new(config.storage.last_reading_file());
    let reading = store
        .load()?
        .ok_or_else(|| anyhow!("No reading stored at {}", store.path().display()))?;
    println!("{}", serde_json::to_string(&reading)?);
    Ok(())
}
