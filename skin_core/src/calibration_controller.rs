//! Orchestrates a windowed baseline-capture interval:
//! `IDLE -> CAPTURING -> IDLE`.
//!
//! Lock poisoning means a prior holder panicked; there is no recovery
//! path, so this module unwraps lock results directly.
#![allow(clippy::unwrap_used, clippy::expect_used)]
use crate::cell::PatchState;
use crate::error::SensorError;
use crate::layout::Layout;
use crate::profile::Profile;
use skin_traits::Clock;
use std::sync::{Arc, Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationState {
    Idle,
    Capturing,
}

struct Inner {
    state: CalibrationState,
    started_at: Option<std::time::Instant>,
}

pub struct CalibrationController {
    inner: Mutex<Inner>,
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationController {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: CalibrationState::Idle,
                started_at: None,
            }),
        }
    }

    pub fn state(&self) -> CalibrationState {
        self.inner.lock().unwrap().state
    }

    /// Resets every cell's baseline accumulator to zero (one patch lock at
    /// a time — never more than one held simultaneously) and transitions
    /// to `CAPTURING`. Re-entry while already capturing restarts the window.
    pub fn start(&self, patches: &[Arc<Mutex<PatchState>>], clock: &dyn Clock) {
        for p in patches {
            let mut guard = p.lock().unwrap();
            for cell in &mut guard.cells {
                cell.baseline_accum = 0;
                cell.baseline_count = 0;
            }
        }
        let mut inner = self.inner.lock().unwrap();
        inner.state = CalibrationState::Capturing;
        inner.started_at = Some(clock.now());
    }

    /// For every cell with at least one sample, commits
    /// `round(baseline_accum / baseline_count)` as its new baseline.
    /// Patch locks are released before the profile writer lock is taken,
    /// so no patch lock is ever held while acquiring it. Returns
    /// `CalibrationEmpty` if no cell received a sample; other baselines
    /// are left untouched either way.
    pub fn stop(
        &self,
        patches: &[Arc<Mutex<PatchState>>],
        layout: &Layout,
        profile: &RwLock<Profile>,
    ) -> Result<(), SensorError> {
        let mut updates: Vec<(u32, u32, i64)> = Vec::new();
        for p in patches {
            let guard = p.lock().unwrap();
            let cell_ids = layout.cells(guard.patch);
            for (slot, cell) in guard.cells.iter().enumerate() {
                if cell.baseline_count > 0 {
                    let mean = (cell.baseline_accum as f64) / f64::from(cell.baseline_count);
                    updates.push((guard.patch, cell_ids[slot], mean.round() as i64));
                }
            }
        }

        let any_committed = !updates.is_empty();
        if any_committed {
            let mut prof = profile.write().unwrap();
            for (patch, cell, baseline) in &updates {
                prof.set_baseline(*patch, *cell, *baseline)
                    .expect("calibration only commits cells known to the layout");
            }
            tracing::info!(count = updates.len(), "calibration commit");
        }

        {
            let mut inner = self.inner.lock().unwrap();
            inner.state = CalibrationState::Idle;
            inner.started_at = None;
        }

        if any_committed {
            Ok(())
        } else {
            Err(SensorError::CalibrationEmpty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skin_config::LayoutRow;
    use skin_traits::MonotonicClock;

    fn one_cell_layout() -> Layout {
        Layout::load(&[LayoutRow {
            patch: 1,
            cell: 0,
            x: 0.0,
            y: 0.0,
        }])
        .unwrap()
    }

    #[test]
    fn commits_rounded_mean_for_sampled_cells() {
        let layout = one_cell_layout();
        let profile = RwLock::new(Profile::identity_for(&layout));
        let patch = Arc::new(Mutex::new(PatchState::new(1, 1, 0)));
        let controller = CalibrationController::new();
        let clock = MonotonicClock::new();

        controller.start(&[patch.clone()], &clock);
        {
            let mut guard = patch.lock().unwrap();
            for raw in [100, 102, 98, 100] {
                guard.cells[0].baseline_accum += raw;
                guard.cells[0].baseline_count += 1;
            }
        }
        controller.stop(&[patch], &layout, &profile).unwrap();
        assert_eq!(profile.read().unwrap().get(1, 0).baseline, 100);
        assert_eq!(controller.state(), CalibrationState::Idle);
    }

    #[test]
    fn stop_with_no_samples_is_calibration_empty() {
        let layout = one_cell_layout();
        let profile = RwLock::new(Profile::identity_for(&layout));
        let patch = Arc::new(Mutex::new(PatchState::new(1, 1, 0)));
        let controller = CalibrationController::new();
        let clock = MonotonicClock::new();

        controller.start(&[patch.clone()], &clock);
        let err = controller.stop(&[patch], &layout, &profile).unwrap_err();
        assert_eq!(err, SensorError::CalibrationEmpty);
        assert_eq!(controller.state(), CalibrationState::Idle);
    }

    #[test]
    fn restart_while_capturing_resets_accumulators() {
        let layout = one_cell_layout();
        let patch = Arc::new(Mutex::new(PatchState::new(1, 1, 0)));
        let controller = CalibrationController::new();
        let clock = MonotonicClock::new();

        controller.start(&[patch.clone()], &clock);
        {
            let mut guard = patch.lock().unwrap();
            guard.cells[0].baseline_accum = 500;
            guard.cells[0].baseline_count = 5;
        }
        controller.start(&[patch.clone()], &clock);
        let guard = patch.lock().unwrap();
        assert_eq!(guard.cells[0].baseline_accum, 0);
        assert_eq!(guard.cells[0].baseline_count, 0);
    }
}
