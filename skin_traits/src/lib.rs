#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Traits that define the device and time abstractions used by the system.
//!
//! - `SerialDevice` is a blocking, raw byte-stream read/write abstraction.
//!   The host is responsible for any serial-line configuration before the
//!   device reaches this trait; the trait itself never touches termios.
//! - `clock` offers a `MonotonicClock` for deterministic timing and testability.
//!
//! Other crates depend only on these traits, enabling a simulated device and
//! a real character-device backend while keeping `skin_core` hardware-agnostic.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// A raw, already-opened byte-oriented device. No framing, no line
/// discipline: the Frame Reader owns interpreting the bytes it returns.
pub trait SerialDevice {
    /// Blocking read into `buf`. Returns the number of bytes read; `Ok(0)`
    /// means EOF (device closed on the far end).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>>;

    /// Best-effort write, used only for the optional single-byte
    /// start/stop handshake tokens.
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

// Allow boxed trait objects (Box<dyn SerialDevice>) to be used where a
// generic D: SerialDevice is expected.
impl<T: ?Sized + SerialDevice> SerialDevice for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_all(buf)
    }
}

/// Opens a fresh `SerialDevice` handle. Held by the sensor facade rather
/// than a single already-opened handle so that a failed ingest thread can
/// be restarted by a later `start()`, which re-opens the device.
pub trait DeviceOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn SerialDevice + Send>, Box<dyn std::error::Error + Send + Sync>>;
}
