//! Example: a from-scratch `SerialDevice` implementation
//!
//! `skin_hardware::SimulatedDevice` already covers most testing needs;
//! this shows the trait surface a real transport (a USB CDC driver, a
//! Bluetooth serial profile, ...) would implement instead.

use skin_traits::SerialDevice;
use std::collections::VecDeque;

pub struct ConstantReadingDevice {
    queue: VecDeque<u8>,
}

impl ConstantReadingDevice {
    pub fn new(patch: u8, cell: u8, raw: i32) -> Self {
        let mut bytes = vec![patch, cell];
        bytes.extend_from_slice(&raw.to_le_bytes());
        bytes.extend_from_slice(&[0xAA, 0x55]);
        Self { queue: bytes.into() }
    }
}

impl SerialDevice for ConstantReadingDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        if self.queue.is_empty() {
            self.queue = ConstantReadingDevice::new(1, 0, 0).queue;
        }
        let n = buf.len().min(self.queue.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.queue.pop_front().expect("checked len above");
        }
        Ok(n)
    }

    fn write_all(&mut self, _buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
