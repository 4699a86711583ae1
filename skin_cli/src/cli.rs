//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use skin_ui::OutputArgs;
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "skin", version, about = "Tactile e-skin sensor CLI")]
pub struct Cli {
    /// Path to the sensor config TOML.
    #[arg(long, value_name = "FILE", default_value = "etc/skin_config.toml")]
    pub config: PathBuf,

    /// Path to the patch/cell layout file (`patch cell x y` grammar).
    #[arg(long, value_name = "FILE", default_value = "etc/layout.txt")]
    pub layout: PathBuf,

    /// Optional calibration profile CSV (`patch,cell,baseline,c0,c1,c2`).
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Use an in-process simulated device instead of opening `device.path`.
    #[arg(long, action = ArgAction::SetTrue)]
    pub simulate: bool,

    #[command(flatten)]
    pub output: OutputArgs,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start ingest and print periodic patch snapshots until interrupted.
    Run {
        /// Milliseconds between printed snapshots.
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,
        /// Write the raw per-cell sample stream to this CSV.
        #[arg(long, value_name = "FILE")]
        log: Option<PathBuf>,
    },
    /// Start ingest, print one snapshot of every patch, then stop.
    Snapshot {
        /// How long to let the reader thread settle before sampling.
        #[arg(long, default_value_t = 200)]
        settle_ms: u64,
    },
    /// Run a calibration window: average raw readings per cell, then
    /// commit the rounded mean as each cell's new baseline.
    Calibrate {
        /// Duration of the capture window in milliseconds.
        #[arg(long, default_value_t = 2000)]
        duration_ms: u64,
        /// Persist the updated profile to this CSV after committing.
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,
    },
    /// Verify the config, layout, and (if given) profile parse and the
    /// device can be opened, without starting continuous ingest.
    SelfCheck,
}
