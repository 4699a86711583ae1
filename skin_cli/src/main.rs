#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the tactile e-skin sensor core.
//!
//! Responsibilities:
//! - Parse config/layout/profile and assemble a `Sensor` over real or
//!   simulated hardware
//! - Initialize tracing and manage log sinks
//! - Offer `--json` mode emitting a stable JSON object per error
//! - Map domain errors to stable exit codes

mod cli;
mod error_fmt;
mod tracing_setup;

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use serde_json::json;
use skin_core::{Layout, Profile, SensorBuilder};
use skin_traits::DeviceOpener;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use tracing_setup::init_tracing;

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nreceived shutdown signal, stopping gracefully...");
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("warning: failed to set signal handler: {e}");
    }

    if let Err(e) = real_main(shutdown) {
        let json = *JSON_MODE.get().unwrap_or(&false);
        let code = exit_code_for_error(&e);
        if json {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
    Ok(())
}

/// Opens the real character device unless `--simulate` was passed or the
/// binary was built without the `hardware` feature, in which case a
/// looping simulated device replays one synthetic record per declared cell.
fn build_opener(
    cfg: &skin_config::SkinConfig,
    layout: &Layout,
    simulate: bool,
) -> Arc<dyn DeviceOpener> {
    #[cfg(feature = "hardware")]
    {
        if !simulate {
            return Arc::new(skin_hardware::CharDeviceOpener::new(cfg.device.path.clone()));
        }
    }
    #[cfg(not(feature = "hardware"))]
    let _ = simulate;

    tracing::warn!("using simulated device (no hardware feature or --simulate passed)");
    let records: Vec<(u8, u8, i32)> = layout
        .patches()
        .iter()
        .flat_map(|&patch| layout.cells(patch).into_iter().map(move |cell| (patch as u8, cell as u8, 0)))
        .collect();
    let script =
        skin_hardware::SimulatedDevice::encode_records(&records, cfg.wire.record_len, &cfg.wire.sentinel);
    Arc::new(skin_hardware::SimulatedDeviceOpener::looping(script, cfg.wire.record_len))
}

fn real_main(shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.output.json);

    let cfg_text = fs::read_to_string(&cli.config)
        .wrap_err_with(|| format!("read config {:?}", cli.config))?;
    let cfg: skin_config::SkinConfig = skin_config::load_toml(&cfg_text)
        .wrap_err_with(|| format!("parse config {:?}", cli.config))?;
    cfg.validate().wrap_err("invalid configuration")?;

    init_tracing(cli.output.json, &cli.output.log_level, cfg.logging.debug_log.as_deref());

    let layout_text = fs::read_to_string(&cli.layout)
        .wrap_err_with(|| format!("read layout {:?}", cli.layout))?;
    let layout_rows = skin_config::load_layout(std::io::Cursor::new(layout_text))
        .map_err(|errs| eyre::eyre!("layout {:?} has {} malformed line(s)", cli.layout, errs.len()))?;
    let layout = Layout::load(&layout_rows).wrap_err("building layout")?;

    let profile = if let Some(path) = &cli.profile {
        let file = fs::File::open(path).wrap_err_with(|| format!("open profile {path:?}"))?;
        let rows = skin_config::load_profile_csv(file).wrap_err("parse profile csv")?;
        Some(Profile::load(&rows, &layout)?)
    } else {
        None
    };

    let wire = skin_core::WireParams {
        record_len: cfg.wire.record_len,
        sentinel: cfg.wire.sentinel.clone(),
        start_token: cfg.wire.start_token,
        stop_token: cfg.wire.stop_token,
    };

    let opener = build_opener(&cfg, &layout, cli.simulate);
    let mut builder = SensorBuilder::new()
        .with_alpha(cfg.sensing.alpha)
        .with_pressure_alpha(cfg.sensing.pressure_alpha)
        .with_target_pressure(cfg.sensing.target_pressure)
        .with_history_len(cfg.sensing.history_len)
        .with_wire_params(wire)
        .with_layout(layout.clone())
        .with_device_opener(SharedOpener(opener));
    if let Some(profile) = profile {
        builder = builder.with_profile(profile);
    }
    let mut sensor = builder.try_build().wrap_err("building sensor")?;

    match cli.cmd {
        Commands::SelfCheck => {
            tracing::info!("self-check starting");
            sensor.start().wrap_err("opening device")?;
            std::thread::sleep(Duration::from_millis(100));
            sensor.stop().wrap_err("stopping device")?;
            println!("self-check: OK ({} patch(es))", layout.patches().len());
            Ok(())
        }
        Commands::Snapshot { settle_ms } => {
            sensor.start().wrap_err("starting ingest")?;
            std::thread::sleep(Duration::from_millis(settle_ms));
            print_snapshot(&sensor, &layout, cli.output.json)?;
            sensor.stop().wrap_err("stopping ingest")?;
            Ok(())
        }
        Commands::Run { interval_ms, log } => {
            if let Some(path) = &log {
                sensor.log(path)?;
            }
            sensor.start().wrap_err("starting ingest")?;
            while !shutdown.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(interval_ms));
                if let Some(err) = sensor.last_error() {
                    sensor.stop().ok();
                    return Err(eyre::eyre!("reader thread stopped: {err}"));
                }
                print_snapshot(&sensor, &layout, cli.output.json)?;
            }
            sensor.stop().wrap_err("stopping ingest")?;
            Ok(())
        }
        Commands::Calibrate { duration_ms, save } => {
            sensor.start().wrap_err("starting ingest")?;
            sensor.calibrate_start();
            tracing::info!(duration_ms, "calibration window open");
            std::thread::sleep(Duration::from_millis(duration_ms));
            sensor.calibrate_stop().wrap_err("committing calibration")?;
            sensor.stop().wrap_err("stopping ingest")?;
            if let Some(path) = &save {
                sensor.save_profile(path).wrap_err("saving profile")?;
            }
            println!("calibration committed");
            Ok(())
        }
    }
}

fn print_snapshot(sensor: &skin_core::Sensor, layout: &Layout, json: bool) -> eyre::Result<()> {
    for &patch in &layout.patches() {
        let mean = sensor.get_patch_mean(patch)?;
        let (mag, cx, cy) = sensor.get_patch_pressure(patch)?;
        if json {
            let obj = json!({
                "patch": patch,
                "mean": mean,
                "pressure_magnitude": mag,
                "centroid_x": cx,
                "centroid_y": cy,
            });
            println!("{obj}");
        } else {
            println!("patch {patch}: mean={mean:.3} pressure={mag:.3} centroid=({cx:.3}, {cy:.3})");
        }
    }
    Ok(())
}

/// Wraps an already-built `Arc<dyn DeviceOpener>` so it can be handed to
/// `SensorBuilder::with_device_opener`, which takes the opener by value.
struct SharedOpener(Arc<dyn DeviceOpener>);

impl DeviceOpener for SharedOpener {
    fn open(&self) -> Result<Box<dyn skin_traits::SerialDevice + Send>, Box<dyn std::error::Error + Send + Sync>> {
        self.0.open()
    }
}
