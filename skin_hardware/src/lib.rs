#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions)]
//! Concrete [`skin_traits::SerialDevice`] implementations: a real
//! character-device wrapper behind the `hardware` feature, and a
//! deterministic simulated device always available for tests and demos.
pub mod error;

#[cfg(feature = "hardware")]
pub mod char_device;
pub mod simulated;

#[cfg(feature = "hardware")]
pub use char_device::{CharDevice, CharDeviceOpener};
pub use simulated::{SimulatedDevice, SimulatedDeviceOpener};
