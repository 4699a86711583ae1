#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Sensor core for a serial-attached, multi-patch electronic skin.
//!
//! This crate owns the hard engineering: a frame-synchronized serial
//! reader, a per-cell signal pipeline (baseline calibration, exponential
//! smoothing, polynomial calibration), and derived per-patch aggregates
//! (mean, pressure magnitude, pressure centroid). A dedicated ingest
//! thread consumes bytes from a [`skin_traits::SerialDevice`] at whatever
//! rate the device offers them; a consumer thread samples the resulting
//! state through [`Sensor`]'s query accessors at a lower, independent
//! rate.
//!
//! ## Architecture
//!
//! - [`layout`]: the physical arrangement of patches and cells.
//! - [`profile`]: per-cell baseline + polynomial calibration.
//! - [`cell`]: per-cell/per-patch mutable state, one lock per patch.
//! - [`frame_reader`]: byte-stream -> record-stream state machine.
//! - [`pipeline`]: applies one record to its owning patch's state.
//! - [`aggregator`]: per-patch mean / pressure magnitude / centroid.
//! - [`calibration_controller`]: windowed baseline-capture interval.
//! - [`counters`]: sensor-wide atomic counters and record tallies.
//! - [`sensor`]: the facade that composes all of the above behind one
//!   handle owning the ingest thread.
//!
//! ## Fixed framing
//!
//! The wire format is a fixed-size record (default 8 bytes: 1-byte patch
//! id, 1-byte cell id, a little-endian `i32` raw sample, a 2-byte
//! sentinel) chosen so the reader can resynchronize from arbitrary
//! byte-level corruption without unbounded memory growth or
//! mis-attributing a record to the wrong cell; see [`frame_reader`] for
//! the state machine.

pub mod aggregator;
pub mod calibration_controller;
pub mod cell;
pub mod counters;
pub mod error;
pub mod frame_reader;
pub mod layout;
pub mod pipeline;
pub mod profile;
pub mod sensor;

pub use calibration_controller::CalibrationState;
pub use counters::RecordTally;
pub use error::SensorError;
pub use frame_reader::WireParams;
pub use layout::Layout;
pub use profile::{CellCal, Profile};
pub use sensor::{Sensor, SensorBuilder};
