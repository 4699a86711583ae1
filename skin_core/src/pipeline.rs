//! Applies one emitted `(patch, cell, raw)` record to the owning patch's
//! state: baseline accumulation (if a calibration window is open),
//! calibration mapping, and exponential smoothing.
use crate::cell::PatchState;
use crate::frame_reader::Record;
use crate::profile::CellCal;

/// Applies `record` to `patch`, which must be the patch the record
/// belongs to. `cell_slot` is `record.cell`'s index within `patch.cells`
/// (from `Layout::cell_slot`). Returns whether the record was folded into
/// an active calibration window, for diagnostics.
pub fn apply_record(
    record: Record,
    cell_slot: usize,
    patch: &mut PatchState,
    cal: CellCal,
    alpha: f64,
    calibrating: bool,
    history_cap: usize,
) -> bool {
    let cell = &mut patch.cells[cell_slot];

    if calibrating {
        cell.baseline_accum += i64::from(record.raw);
        cell.baseline_count += 1;
    }

    let v = cal.apply(record.raw);

    if cell.baseline_count == 0 && !cell.avg_initialized() {
        cell.avg = v;
    } else {
        cell.avg = alpha.mul_add(v, (1.0 - alpha) * cell.avg);
    }
    cell.set_avg_initialized(true);

    cell.raw_latest = record.raw;
    cell.push_history(record.raw, history_cap);
    patch.bump_generation();

    calibrating
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_patch() -> PatchState {
        PatchState::new(1, 1, 0)
    }

    #[test]
    fn first_record_seeds_average_directly() {
        let mut patch = make_patch();
        let cal = CellCal {
            baseline: 0,
            c0: 0.0,
            c1: 1.0,
            c2: 0.0,
        };
        apply_record(
            Record {
                patch: 1,
                cell: 0,
                raw: 100,
            },
            0,
            &mut patch,
            cal,
            1.0,
            false,
            0,
        );
        assert_eq!(patch.cells[0].avg, 100.0);
    }

    #[test]
    fn alpha_half_converges_to_steady_state() {
        let mut patch = make_patch();
        let cal = CellCal {
            baseline: 0,
            c0: 0.0,
            c1: 1.0,
            c2: 0.0,
        };
        let rec = Record {
            patch: 1,
            cell: 0,
            raw: 10,
        };
        apply_record(rec, 0, &mut patch, cal, 0.5, false, 0);
        assert_eq!(patch.cells[0].avg, 10.0);
        apply_record(rec, 0, &mut patch, cal, 0.5, false, 0);
        assert_eq!(patch.cells[0].avg, 10.0);
    }

    #[test]
    fn calibration_accumulates_raw_sum_and_count() {
        let mut patch = make_patch();
        let cal = CellCal::default();
        for raw in [100, 102, 98, 100] {
            apply_record(
                Record {
                    patch: 1,
                    cell: 0,
                    raw,
                },
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
    }

    #[test]
    fn generation_bumps_every_record() {
        let mut patch = make_patch();
        let cal = CellCal::default();
        assert!(!patch.pressure_stale());
        apply_record(
            Record {
                patch: 1,
                cell: 0,
                raw: 1,
            },
            0,
            &mut patch,
            cal,
            1.0,
            false,
            0,
        );
        assert!(patch.pressure_stale());
    }
}
