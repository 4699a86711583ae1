//! A deterministic, in-memory [`skin_traits::SerialDevice`] used by tests,
//! benches, and the `skin_cli` demos. Feeds back a fixed byte script in
//! caller-chosen chunk sizes and records every byte written to it (so
//! tests can assert on the start/stop handshake tokens).
use skin_traits::{DeviceOpener, SerialDevice};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExhaustionBehavior {
    /// Returns `Ok(0)` (EOF) once the script is consumed.
    Eof,
    /// Re-plays the script from the beginning indefinitely.
    Loop,
}

pub struct SimulatedDevice {
    remaining: VecDeque<u8>,
    script: Vec<u8>,
    behavior: ExhaustionBehavior,
    chunk: usize,
    pub writes: Arc<Mutex<Vec<u8>>>,
}

impl SimulatedDevice {
    /// Plays `script` once, then signals EOF.
    pub fn once(script: Vec<u8>, chunk: usize) -> Self {
        Self {
            remaining: script.iter().copied().collect(),
            script,
            behavior: ExhaustionBehavior::Eof,
            chunk: chunk.max(1),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Replays `script` indefinitely, for long-running demos.
    pub fn looping(script: Vec<u8>, chunk: usize) -> Self {
        Self {
            remaining: script.iter().copied().collect(),
            script,
            behavior: ExhaustionBehavior::Loop,
            chunk: chunk.max(1),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builds a script from `(patch, cell, raw)` tuples encoded per the
    /// given wire parameters: useful for driving the sensor core from a
    /// known sequence of records in tests and demos.
    pub fn encode_records(records: &[(u8, u8, i32)], record_len: usize, sentinel: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(records.len() * record_len);
        for &(patch, cell, raw) in records {
            bytes.push(patch);
            bytes.push(cell);
            bytes.extend_from_slice(&raw.to_le_bytes());
            bytes.extend_from_slice(sentinel);
        }
        bytes
    }
}

impl SerialDevice for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        if self.remaining.is_empty() {
            match self.behavior {
                ExhaustionBehavior::Eof => return Ok(0),
                ExhaustionBehavior::Loop => self.remaining = self.script.iter().copied().collect(),
            }
        }
        let n = buf.len().min(self.chunk).min(self.remaining.len());
        for slot in buf.iter_mut().take(n) {
            *slot = self.remaining.pop_front().unwrap();
        }
        Ok(n)
    }

    fn write_all(&mut self, buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.writes.lock().unwrap().extend_from_slice(buf);
        Ok(())
    }
}

/// Builds a fresh [`SimulatedDevice`] replaying the same script on every
/// `open()`, matching the real opener's "a next `start()` re-opens"
/// contract.
#[derive(Clone)]
pub struct SimulatedDeviceOpener {
    script: Vec<u8>,
    chunk: usize,
    looping: bool,
}

impl SimulatedDeviceOpener {
    pub fn once(script: Vec<u8>, chunk: usize) -> Self {
        Self { script, chunk, looping: false }
    }

    pub fn looping(script: Vec<u8>, chunk: usize) -> Self {
        Self { script, chunk, looping: true }
    }
}

impl DeviceOpener for SimulatedDeviceOpener {
    fn open(&self) -> Result<Box<dyn SerialDevice + Send>, Box<dyn std::error::Error + Send + Sync>> {
        let device = if self.looping {
            SimulatedDevice::looping(self.script.clone(), self.chunk)
        } else {
            SimulatedDevice::once(self.script.clone(), self.chunk)
        };
        Ok(Box::new(device))
    }
}
