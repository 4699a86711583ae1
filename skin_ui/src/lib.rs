#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Shared `clap::Args` fragments for `skin_cli`'s output formatting
//! flags, kept in their own crate so a future second front end (a
//! plotting/visualization binary, explicitly out of scope for the core)
//! can reuse the same `--json`/`--log-level` surface without depending
//! on the rest of the CLI crate.
use clap::Args;

/// Output-formatting flags shared by every `skin_cli` subcommand.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Emit structured JSON instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: String,
}

impl Default for OutputArgs {
    fn default() -> Self {
        Self { json: false, log_level: "info".to_string() }
    }
}
