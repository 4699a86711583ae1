//! Byte-stream -> record-stream state machine. This is the one
//! place in the system that consumes untrusted, unstructured input: it
//! must recover from arbitrary corruption without unbounded memory growth
//! or mis-attributed records.
use crate::counters::Counters;
use crate::error::SensorError;
use crate::layout::Layout;
use skin_traits::SerialDevice;
use std::collections::VecDeque;

/// One decoded, range-validated sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub patch: u32,
    pub cell: u32,
    pub raw: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    Seek,
    Locked,
}

/// Firmware-specific wire parameters: total record length, the trailing
/// sentinel byte sequence, and the single-byte start/stop handshake
/// tokens written on `start()`/`stop()`.
#[derive(Debug, Clone)]
pub struct WireParams {
    pub record_len: usize,
    pub sentinel: Vec<u8>,
    pub start_token: u8,
    pub stop_token: u8,
}

impl Default for WireParams {
    /// Matches the reference firmware: patch(1) + cell(1) + raw i32 LE(4)
    /// + a 2-byte sentinel = 8 bytes per record.
    fn default() -> Self {
        Self {
            record_len: 8,
            sentinel: vec![0xAA, 0x55],
            start_token: b'1',
            stop_token: b'0',
        }
    }
}

pub struct FrameReader {
    record_len: usize,
    sentinel: Vec<u8>,
    state: SyncState,
    window: VecDeque<u8>,
}

impl FrameReader {
    pub fn new(params: &WireParams) -> Self {
        Self {
            record_len: params.record_len,
            sentinel: params.sentinel.clone(),
            state: SyncState::Seek,
            window: VecDeque::with_capacity(params.record_len),
        }
    }

    fn try_decode(&self, bytes: &[u8]) -> Option<(u32, u32, i32)> {
        let body_len = self.record_len - self.sentinel.len();
        if bytes[body_len..] != self.sentinel[..] {
            return None;
        }
        let patch = u32::from(bytes[0]);
        let cell = u32::from(bytes[1]);
        let raw = i32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        Some((patch, cell, raw))
    }

    fn classify_and_tally(&self, patch: u32, cell: u32, layout: &Layout, counters: &Counters) {
        if layout.has_patch(patch) {
            counters.record_cell_outofrange();
        } else {
            counters.record_patch_outofrange();
        }
        tracing::debug!(patch, cell, "dropped out-of-range record");
    }

    /// Reads and decodes the next valid record, blocking on `device` as
    /// needed. Returns `Ok(None)` on EOF (device closed). Invalid windows
    /// are tallied and skipped internally; this only returns once a valid
    /// record is emitted, the device is exhausted, or a fatal I/O error
    /// occurs.
    pub fn next_record(
        &mut self,
        device: &mut dyn SerialDevice,
        layout: &Layout,
        counters: &Counters,
    ) -> Result<Option<Record>, SensorError> {
        loop {
            match self.state {
                SyncState::Seek => {
                    if !self.fill_window_one_byte(device, counters)? {
                        return Ok(None);
                    }
                    if self.window.len() < self.record_len {
                        continue;
                    }
                    let bytes: Vec<u8> = self.window.iter().copied().collect();
                    match self.try_decode(&bytes) {
                        Some((patch, cell, raw)) if layout.has(patch, cell) => {
                            self.state = SyncState::Locked;
                            self.window.clear();
                            counters.record_ok();
                            return Ok(Some(Record { patch, cell, raw }));
                        }
                        Some((patch, cell, _)) => {
                            self.classify_and_tally(patch, cell, layout, counters);
                            counters.record_misalignment();
                            self.window.pop_front();
                        }
                        None => {
                            counters.record_misalignment();
                            self.window.pop_front();
                        }
                    }
                }
                SyncState::Locked => {
                    self.window.clear();
                    if !self.fill_window_exact(device, counters)? {
                        return Ok(None);
                    }
                    let bytes: Vec<u8> = self.window.iter().copied().collect();
                    match self.try_decode(&bytes) {
                        Some((patch, cell, raw)) if layout.has(patch, cell) => {
                            counters.record_ok();
                            self.window.clear();
                            return Ok(Some(Record { patch, cell, raw }));
                        }
                        Some((patch, cell, _)) => {
                            self.classify_and_tally(patch, cell, layout, counters);
                            tracing::warn!("frame reader lost lock, returning to seek");
                            self.state = SyncState::Seek;
                        }
                        None => {
                            tracing::warn!("frame reader lost lock, returning to seek");
                            self.state = SyncState::Seek;
                        }
                    }
                }
            }
        }
    }

    /// Reads exactly one byte and appends it, trimming the window to
    /// `record_len`. Returns `Ok(false)` on EOF.
    fn fill_window_one_byte(
        &mut self,
        device: &mut dyn SerialDevice,
        counters: &Counters,
    ) -> Result<bool, SensorError> {
        let mut byte = [0u8; 1];
        let n = device
            .read(&mut byte)
            .map_err(|e| SensorError::DeviceIoError(e.to_string()))?;
        if n == 0 {
            return Ok(false);
        }
        counters.add_bytes(n as u64);
        self.window.push_back(byte[0]);
        while self.window.len() > self.record_len {
            self.window.pop_front();
        }
        Ok(true)
    }

    /// Reads until exactly `record_len` bytes are buffered. A short read
    /// is not fatal; it loops. Returns `Ok(false)` on EOF.
    fn fill_window_exact(
        &mut self,
        device: &mut dyn SerialDevice,
        counters: &Counters,
    ) -> Result<bool, SensorError> {
        while self.window.len() < self.record_len {
            let mut buf = vec![0u8; self.record_len - self.window.len()];
            let n = device
                .read(&mut buf)
                .map_err(|e| SensorError::DeviceIoError(e.to_string()))?;
            if n == 0 {
                return Ok(false);
            }
            counters.add_bytes(n as u64);
            self.window.extend(buf[..n].iter().copied());
        }
        Ok(true)
    }
}
