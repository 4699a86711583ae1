//! Sensor-wide atomic counters. Counters are fields on the sensor handle
//! (never process-wide globals), read independently of the patch locks.
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Counters {
    pub total_bytes: AtomicU64,
    pub total_records: AtomicU64,
    pub misalignments: AtomicU64,
    tally_ok: AtomicU64,
    tally_patch_outofrange: AtomicU64,
    tally_cell_outofrange: AtomicU64,
    tally_checksum_fail: AtomicU64,
}

/// A point-in-time snapshot of the per-tag record counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordTally {
    pub ok: u64,
    pub patch_outofrange: u64,
    pub cell_outofrange: u64,
    pub checksum_fail: u64,
}

impl Counters {
    pub fn add_bytes(&self, n: u64) {
        self.total_bytes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn record_misalignment(&self) {
        self.misalignments.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ok(&self) {
        self.total_records.fetch_add(1, Ordering::Relaxed);
        self.tally_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_patch_outofrange(&self) {
        self.total_records.fetch_add(1, Ordering::Relaxed);
        self.tally_patch_outofrange.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cell_outofrange(&self) {
        self.total_records.fetch_add(1, Ordering::Relaxed);
        self.tally_cell_outofrange.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RecordTally {
        RecordTally {
            ok: self.tally_ok.load(Ordering::Relaxed),
            patch_outofrange: self.tally_patch_outofrange.load(Ordering::Relaxed),
            cell_outofrange: self.tally_cell_outofrange.load(Ordering::Relaxed),
            checksum_fail: self.tally_checksum_fail.load(Ordering::Relaxed),
        }
    }

    pub fn total_records(&self) -> u64 {
        self.total_records.load(Ordering::Relaxed)
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes.load(Ordering::Relaxed)
    }

    pub fn misalignments(&self) -> u64 {
        self.misalignments.load(Ordering::Relaxed)
    }
}
