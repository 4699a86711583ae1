//! End-to-end scenarios from the sensor core's testable-properties table:
//! happy path, smoothing, calibration, misalignment recovery, out-of-range
//! drop, and zero pressure.
use skin_core::frame_reader::{Record, WireParams};
use skin_core::pipeline::apply_record;
use skin_core::{CellCal, Layout, Profile};
use skin_config::LayoutRow;

fn layout_one_patch_two_cells() -> Layout {
    Layout::load(&[
        LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 },
        LayoutRow { patch: 1, cell: 1, x: 1.0, y: 0.0 },
    ])
    .unwrap()
}

fn encode(patch: u8, cell: u8, raw: i32, sentinel: &[u8]) -> Vec<u8> {
    let mut v = vec![patch, cell];
    v.extend_from_slice(&raw.to_le_bytes());
    v.extend_from_slice(sentinel);
    v
}

mod byte_queue {
    use skin_traits::SerialDevice;
    use std::collections::VecDeque;

    pub struct ByteQueueDevice {
        data: VecDeque<u8>,
        chunk: usize,
    }

    impl ByteQueueDevice {
        pub fn new(data: &[u8], chunk: usize) -> Self {
            Self { data: data.iter().copied().collect(), chunk }
        }
    }

    impl SerialDevice for ByteQueueDevice {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
            let n = buf.len().min(self.chunk).min(self.data.len());
            for slot in buf.iter_mut().take(n) {
                *slot = self.data.pop_front().unwrap();
            }
            Ok(n)
        }

        fn write_all(&mut self, _buf: &[u8]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            Ok(())
        }
    }
}

use byte_queue::ByteQueueDevice;
use skin_core::frame_reader::FrameReader;
use skin_core::counters::Counters;

#[test]
fn scenario_happy_path() {
    let layout = layout_one_patch_two_cells();
    let profile = Profile::identity_for(&layout);
    let mut patch = skin_core::cell::PatchState::new(1, 2, 0);

    apply_record(
        Record { patch: 1, cell: 0, raw: 100 },
        0,
        &mut patch,
        profile.get(1, 0),
        1.0,
        false,
        0,
    );
    apply_record(
        Record { patch: 1, cell: 1, raw: 50 },
        1,
        &mut patch,
        profile.get(1, 1),
        1.0,
        false,
        0,
    );

    assert_eq!(skin_core::aggregator::patch_state(&layout, &patch), vec![100.0, 50.0]);
    assert_eq!(skin_core::aggregator::patch_mean(&layout, &profile, &patch), 75.0);
    let (m, x, y) = skin_core::aggregator::patch_pressure(&layout, &profile, &mut patch, 1.0);
    assert_eq!(m, 150.0);
    assert!((x - 50.0 / 150.0).abs() < 1e-9);
    assert_eq!(y, 0.0);
}

#[test]
fn scenario_smoothing_alpha_half() {
    let layout = Layout::load(&[LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 }]).unwrap();
    let profile = Profile::identity_for(&layout);
    let mut patch = skin_core::cell::PatchState::new(1, 1, 0);

    apply_record(
        Record { patch: 1, cell: 0, raw: 10 },
        0,
        &mut patch,
        profile.get(1, 0),
        0.5,
        false,
        0,
    );
    assert_eq!(patch.cells[0].avg, 10.0);

    apply_record(
        Record { patch: 1, cell: 0, raw: 20 },
        0,
        &mut patch,
        profile.get(1, 0),
        0.5,
        false,
        0,
    );
    assert_eq!(patch.cells[0].avg, 15.0);

    apply_record(
        Record { patch: 1, cell: 0, raw: 20 },
        0,
        &mut patch,
        profile.get(1, 0),
        0.5,
        false,
        0,
    );
    assert_eq!(patch.cells[0].avg, 17.5);
}

#[test]
fn scenario_calibration_commits_rounded_mean() {
    let layout = Layout::load(&[LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 }]).unwrap();
    let mut patch = skin_core::cell::PatchState::new(1, 1, 0);
    let cal = CellCal::default();

    for raw in [100, 102, 98, 100] {
        apply_record(
            Record { patch: 1, cell: 0, raw },
            0,
            &mut patch,
            cal,
            1.0,
            true,
            0,
        );
    }
    assert_eq!(patch.cells[0].baseline_accum, 400);
    assert_eq!(patch.cells[0].baseline_count, 4);
    let committed = (patch.cells[0].baseline_accum as f64 / f64::from(patch.cells[0].baseline_count)).round() as i64;
    assert_eq!(committed, 100);

    let mut profile = Profile::identity_for(&layout);
    profile.set_baseline(1, 0, committed).unwrap();
    assert_eq!(profile.get(1, 0).apply(100), 0.0);
}

#[test]
fn scenario_misalignment_recovery_preserves_final_average() {
    let params = WireParams::default();
    let layout = Layout::load(&[LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 }]).unwrap();
    let profile = Profile::identity_for(&layout);

    let mut clean_bytes = Vec::new();
    for i in 0..1000 {
        clean_bytes.extend(encode(1, 0, 100 + (i % 3), &params.sentinel));
    }
    let mut corrupted_bytes = vec![0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77];
    corrupted_bytes.extend(clean_bytes.clone());

    let drive = |bytes: Vec<u8>| -> (f64, u64, u64) {
        let mut device = ByteQueueDevice::new(&bytes, 16);
        let mut reader = FrameReader::new(&params);
        let counters = Counters::default();
        let mut patch = skin_core::cell::PatchState::new(1, 1, 0);
        let mut count = 0u64;
        while let Some(record) = reader.next_record(&mut device, &layout, &counters).unwrap() {
            apply_record(record, 0, &mut patch, profile.get(1, 0), 1.0, false, 0);
            count += 1;
        }
        (patch.cells[0].avg, count, counters.misalignments())
    };

    let (clean_avg, clean_count, _) = drive(clean_bytes);
    let (corrupt_avg, corrupt_count, misalignments) = drive(corrupted_bytes);

    assert_eq!(clean_count, 1000);
    assert_eq!(corrupt_count, 1000);
    assert!(misalignments >= 1);
    assert_eq!(clean_avg, corrupt_avg);
}

#[test]
fn scenario_out_of_range_patch_is_dropped_without_state_mutation() {
    let params = WireParams::default();
    let layout = Layout::load(&[
        LayoutRow { patch: 1, cell: 0, x: 0.0, y: 0.0 },
        LayoutRow { patch: 2, cell: 0, x: 0.0, y: 1.0 },
    ])
    .unwrap();
    let mut bytes = encode(99, 0, 7, &params.sentinel);
    bytes.extend(encode(1, 0, 100, &params.sentinel));
    let mut device = ByteQueueDevice::new(&bytes, 8);
    let mut reader = FrameReader::new(&params);
    let counters = Counters::default();

    let record = reader.next_record(&mut device, &layout, &counters).unwrap().unwrap();
    assert_eq!(record, Record { patch: 1, cell: 0, raw: 100 });
    assert_eq!(counters.snapshot().patch_outofrange, 1);
}

#[test]
fn scenario_zero_pressure_when_all_cells_at_baseline() {
    let layout = layout_one_patch_two_cells();
    let mut profile = Profile::identity_for(&layout);
    profile.set_baseline(1, 0, 50).unwrap();
    profile.set_baseline(1, 1, 50).unwrap();
    let mut patch = skin_core::cell::PatchState::new(1, 2, 0);

    apply_record(Record { patch: 1, cell: 0, raw: 50 }, 0, &mut patch, profile.get(1, 0), 1.0, false, 0);
    apply_record(Record { patch: 1, cell: 1, raw: 30 }, 1, &mut patch, profile.get(1, 1), 1.0, false, 0);

    assert_eq!(
        skin_core::aggregator::patch_pressure(&layout, &profile, &mut patch, 1.0),
        (0.0, 0.0, 0.0)
    );
}
