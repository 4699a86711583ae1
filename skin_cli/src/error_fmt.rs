//! Human-readable error descriptions and structured JSON error formatting.

use skin_core::SensorError;
use skin_hardware::error::HwError;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::DeviceNotFound(path) => format!(
                "What happened: The sensor device could not be opened ({path}).\nLikely causes: Wrong device.path in the config, or the firmware is not attached.\nHow to fix: Check device.path, or rerun with --simulate to verify the rest of the pipeline."
            ),
            SensorError::DeviceIoError(msg) => format!(
                "What happened: A device I/O error occurred ({msg}).\nLikely causes: The serial line dropped, or a file could not be read/written.\nHow to fix: Check cabling/permissions and retry."
            ),
            SensorError::ParseError { file, line } => format!(
                "What happened: Failed to parse {file} at line {line}.\nLikely causes: Malformed layout or profile row.\nHow to fix: Fix the offending line and retry."
            ),
            SensorError::DuplicateCell { patch, cell } => format!(
                "What happened: Patch {patch} cell {cell} appears more than once in the layout.\nLikely causes: A copy-paste error in the layout file.\nHow to fix: Remove the duplicate `{patch} {cell} x y` line."
            ),
            SensorError::UnknownCell { patch, cell } => format!(
                "What happened: Patch {patch} cell {cell} is not declared in the layout.\nLikely causes: A stale profile/override referencing a cell that was removed.\nHow to fix: Add the cell to the layout, or remove the reference."
            ),
            SensorError::InvalidArgument(msg) => format!(
                "What happened: Invalid argument ({msg}).\nHow to fix: Adjust the offending flag or config value and retry."
            ),
            SensorError::NotRunning => "What happened: Requested an operation that requires the sensor to be running, but it is stopped.\nHow to fix: Call `run` (or `start`) first.".to_string(),
            SensorError::AlreadyRunning => "What happened: The sensor is already running.\nHow to fix: Stop it before reconfiguring, or ignore if this is expected.".to_string(),
            SensorError::CalibrationEmpty => "What happened: Calibration window ended with no captured samples for at least one cell.\nLikely causes: Too short a duration, or the device produced no records.\nHow to fix: Increase --duration-ms or verify the device is streaming.".to_string(),
        };
    }

    if let Some(he) = err.downcast_ref::<HwError>() {
        return match he {
            HwError::DeviceNotFound(path) => format!(
                "What happened: No device file at {path}.\nHow to fix: Verify the path, permissions, or pass --simulate."
            ),
            HwError::Timeout => "What happened: The device timed out.\nHow to fix: Check the firmware is streaming and the baud/framing match.".to_string(),
            HwError::Io(e) => format!(
                "What happened: I/O error talking to the device ({e}).\nHow to fix: Check cabling and permissions."
            ),
        };
    }

    let msg = err.to_string();
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Maps known error variants to stable exit codes; anything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(se) = err.downcast_ref::<SensorError>() {
        return match se {
            SensorError::DeviceNotFound(_) => 2,
            SensorError::DeviceIoError(_) => 3,
            SensorError::ParseError { .. } => 4,
            SensorError::DuplicateCell { .. } | SensorError::UnknownCell { .. } => 5,
            SensorError::InvalidArgument(_) => 6,
            SensorError::NotRunning | SensorError::AlreadyRunning => 7,
            SensorError::CalibrationEmpty => 8,
        };
    }
    if err.downcast_ref::<HwError>().is_some() {
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    let reason = if let Some(se) = err.downcast_ref::<SensorError>() {
        format!("{se:?}")
    } else if let Some(he) = err.downcast_ref::<HwError>() {
        format!("{he:?}")
    } else {
        "Error".to_string()
    };
    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
