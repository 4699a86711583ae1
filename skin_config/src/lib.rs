#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and on-disk parsing for the e-skin sensor core.
//!
//! - `SkinConfig` is deserialized from TOML and validated.
//! - `load_layout` parses the textual layout grammar (`patch cell x y`).
//! - `load_profile_csv` / `save_profile_csv` round-trip the calibration
//!   profile CSV (`patch,cell,baseline,c0,c1,c2`).
//!
//! This crate only parses and validates; the live, mutable `Layout` and
//! `Profile` types consumed by the reader/pipeline live in `skin_core`.
use serde::Deserialize;
use std::io::{BufRead, Write};

/// One row of the layout grammar: `<patch> <cell> <x> <y>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutRow {
    pub patch: u32,
    pub cell: u32,
    pub x: f64,
    pub y: f64,
}

/// A malformed line in a layout file, with its 1-based line number.
#[derive(Debug, Clone, thiserror::Error)]
#[error("layout parse error at line {line}: {reason}")]
pub struct LayoutParseError {
    pub line: usize,
    pub reason: String,
}

/// Parses the layout grammar from `source`: lines of `patch cell x y`,
/// blank lines and `#`-prefixed comments ignored, whitespace-separated
/// tokens. Collects every malformed line before returning, rather than
/// aborting on the first.
pub fn load_layout<R: BufRead>(source: R) -> Result<Vec<LayoutRow>, Vec<LayoutParseError>> {
    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                errors.push(LayoutParseError {
                    line: line_no,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_layout_line(trimmed) {
            Ok(row) => rows.push(row),
            Err(reason) => errors.push(LayoutParseError {
                line: line_no,
                reason,
            }),
        }
    }

    if errors.is_empty() {
        Ok(rows)
    } else {
        Err(errors)
    }
}

fn parse_layout_line(line: &str) -> Result<LayoutRow, String> {
    let mut tokens = line.split_whitespace();
    let patch = tokens
        .next()
        .ok_or("missing patch id")?
        .parse::<u32>()
        .map_err(|e| format!("invalid patch id: {e}"))?;
    let cell = tokens
        .next()
        .ok_or("missing cell id")?
        .parse::<u32>()
        .map_err(|e| format!("invalid cell id: {e}"))?;
    let x = tokens
        .next()
        .ok_or("missing x")?
        .parse::<f64>()
        .map_err(|e| format!("invalid x: {e}"))?;
    let y = tokens
        .next()
        .ok_or("missing y")?
        .parse::<f64>()
        .map_err(|e| format!("invalid y: {e}"))?;
    if tokens.next().is_some() {
        return Err("trailing tokens after y".to_string());
    }
    Ok(LayoutRow { patch, cell, x, y })
}

/// One row of the profile CSV: `patch,cell,baseline,c0,c1,c2`.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub patch: u32,
    pub cell: u32,
    pub baseline: i64,
    pub c0: f64,
    pub c1: f64,
    #[serde(default)]
    pub c2: f64,
}

/// Loads a profile CSV, requiring the exact header
/// `patch,cell,baseline,c0,c1,c2` (c2 may be omitted from the header and
/// defaults to 0.0). Duplicate `(patch, cell)` rows are an error.
pub fn load_profile_csv<R: std::io::Read>(reader: R) -> eyre::Result<Vec<ProfileRow>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    {
        let headers = rdr.headers()?;
        let got: Vec<&str> = headers.iter().collect();
        let expected_full = ["patch", "cell", "baseline", "c0", "c1", "c2"];
        let expected_no_c2 = ["patch", "cell", "baseline", "c0", "c1"];
        if got != expected_full && got != expected_no_c2 {
            eyre::bail!(
                "profile csv must have headers 'patch,cell,baseline,c0,c1,c2', got {:?}",
                got
            );
        }
    }

    let mut rows = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for result in rdr.deserialize() {
        let row: ProfileRow = result?;
        if !seen.insert((row.patch, row.cell)) {
            eyre::bail!(
                "profile csv contains duplicate row for patch {} cell {}",
                row.patch,
                row.cell
            );
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Serializes rows back to the canonical profile CSV format.
pub fn save_profile_csv<W: Write>(writer: W, rows: &[ProfileRow]) -> eyre::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["patch", "cell", "baseline", "c0", "c1", "c2"])?;
    for row in rows {
        wtr.write_record([
            row.patch.to_string(),
            row.cell.to_string(),
            row.baseline.to_string(),
            row.c0.to_string(),
            row.c1.to_string(),
            row.c2.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Top-level settings for a sensor instance, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct SkinConfig {
    pub device: DeviceCfg,
    #[serde(default)]
    pub sensing: SensingCfg,
    #[serde(default)]
    pub logging: LoggingCfg,
    #[serde(default)]
    pub wire: WireCfg,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeviceCfg {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensingCfg {
    pub alpha: f64,
    pub pressure_alpha: f64,
    /// Display-oriented constant used by UI clients to pick a pressure
    /// color scale; the core does not derive it from the profile.
    pub target_pressure: f64,
    /// Capacity of the optional per-cell raw-value history ring.
    /// Zero disables history tracking.
    pub history_len: usize,
}

impl Default for SensingCfg {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            pressure_alpha: 1.0,
            target_pressure: 1.0,
            history_len: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingCfg {
    pub sample_log: Option<String>,
    pub debug_log: Option<String>,
}

/// Firmware-specific overrides for the wire framing. Defaults match the
/// reference firmware: 8-byte records, a 2-byte sentinel, one-byte
/// start/stop handshake tokens.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct WireCfg {
    pub record_len: usize,
    pub sentinel: Vec<u8>,
    pub start_token: u8,
    pub stop_token: u8,
}

impl Default for WireCfg {
    fn default() -> Self {
        Self {
            record_len: 8,
            sentinel: vec![0xAA, 0x55],
            start_token: b'1',
            stop_token: b'0',
        }
    }
}

/// Parses `SkinConfig` from a TOML source string.
pub fn load_toml(source: &str) -> eyre::Result<SkinConfig> {
    let cfg: SkinConfig = toml::from_str(source)?;
    Ok(cfg)
}

impl SkinConfig {
    /// Validates cross-field constraints TOML's type system cannot express.
    pub fn validate(&self) -> eyre::Result<()> {
        if self.device.path.trim().is_empty() {
            eyre::bail!("device.path must not be empty");
        }
        if !(0.0..=1.0).contains(&self.sensing.alpha) || self.sensing.alpha <= 0.0 {
            eyre::bail!("sensing.alpha must be in (0.0, 1.0]");
        }
        if !(0.0..=1.0).contains(&self.sensing.pressure_alpha) || self.sensing.pressure_alpha <= 0.0
        {
            eyre::bail!("sensing.pressure_alpha must be in (0.0, 1.0]");
        }
        if self.wire.record_len == 0 {
            eyre::bail!("wire.record_len must be > 0");
        }
        let min_len = 1 + 1 + 4 + self.wire.sentinel.len();
        if self.wire.record_len < min_len {
            eyre::bail!(
                "wire.record_len ({}) too small for patch+cell+raw+sentinel ({min_len})",
                self.wire.record_len
            );
        }
        if self.wire.sentinel.is_empty() {
            eyre::bail!("wire.sentinel must not be empty");
        }
        Ok(())
    }
}
