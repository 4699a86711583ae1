//! Domain errors for the sensor core: configuration and lifecycle errors
//! propagate to the caller as stable, enumerable kinds; runtime wire
//! corruption is tallied, not raised as an error (see `counters::Counters`).
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("device io error: {0}")]
    DeviceIoError(String),
    #[error("parse error in {file} at line {line}")]
    ParseError { file: String, line: usize },
    #[error("duplicate cell: patch {patch} cell {cell}")]
    DuplicateCell { patch: u32, cell: u32 },
    #[error("unknown cell: patch {patch} cell {cell}")]
    UnknownCell { patch: u32, cell: u32 },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("sensor is not running")]
    NotRunning,
    #[error("sensor is already running")]
    AlreadyRunning,
    #[error("calibration window captured zero samples")]
    CalibrationEmpty,
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_is_stable() {
        assert_eq!(
            SensorError::DuplicateCell { patch: 1, cell: 2 }.to_string(),
            "duplicate cell: patch 1 cell 2"
        );
        assert_eq!(
            SensorError::UnknownCell { patch: 3, cell: 4 }.to_string(),
            "unknown cell: patch 3 cell 4"
        );
        assert_eq!(
            SensorError::CalibrationEmpty.to_string(),
            "calibration window captured zero samples"
        );
    }
}
