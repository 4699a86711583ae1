//! Real character-device backend: opens a path like `/dev/ttyUSB0` for
//! read/write without touching termios settings. The host is responsible
//! for prior serial-line configuration (baud, raw mode, no echo); this
//! wrapper only reads and writes raw bytes.
use crate::error::HwError;
use skin_traits::{DeviceOpener, SerialDevice};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::PathBuf;

pub struct CharDevice {
    file: File,
}

impl CharDevice {
    pub fn open(path: &str) -> Result<Self, HwError> {
        let file = OpenOptions::new().read(true).write(true).open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HwError::DeviceNotFound(path.to_string())
            } else {
                HwError::Io(e)
            }
        })?;
        Ok(Self { file })
    }
}

impl SerialDevice for CharDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Read::read(&mut self.file, buf)?)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(Write::write_all(&mut self.file, buf)?)
    }
}

/// Opens a fresh [`CharDevice`] handle at `path` on every call, so a
/// failed ingest thread can be restarted by a later `start()`.
pub struct CharDeviceOpener {
    path: PathBuf,
}

impl CharDeviceOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DeviceOpener for CharDeviceOpener {
    fn open(&self) -> Result<Box<dyn SerialDevice + Send>, Box<dyn std::error::Error + Send + Sync>> {
        let path = self.path.to_string_lossy();
        let device = CharDevice::open(&path)?;
        tracing::info!(path = %path, "opened character device");
        Ok(Box::new(device))
    }
}
